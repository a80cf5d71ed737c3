//! Configuration loading and parsing

use anyhow::{Context, Result};
use ptrac_decoder::DecoderConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from a TOML file)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub decoder: DecoderConfig,
    #[serde(default)]
    pub cuts: CutsConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Event cuts applied after decoding. Empty lists mean "keep all".
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CutsConfig {
    /// Kind names or PTRAC labels ("collision", "COL", ...)
    #[serde(default)]
    pub kinds: Vec<String>,
    #[serde(default)]
    pub cells: Vec<i64>,
    #[serde(default)]
    pub materials: Vec<i64>,
    pub min_history: Option<i64>,
    pub max_history: Option<i64>,
    /// Minimum energy after the event (MeV)
    pub min_energy: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    pub path: Option<PathBuf>,
    pub max_events: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per kept event
    Jsonl,
    /// One JSON report for the whole run
    #[default]
    Summary,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    if let (Some(min), Some(max)) = (config.cuts.min_history, config.cuts.max_history) {
        anyhow::ensure!(
            min <= max,
            "Invalid history range in {:?}: {} > {}",
            path,
            min,
            max
        );
    }

    Ok(config)
}
