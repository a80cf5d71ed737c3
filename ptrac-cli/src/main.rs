//! PTRAC Reader CLI Application
//!
//! Command-line front-end for the ptrac-decoder library. It adds:
//! - TOML configuration for the decoder and event cuts
//! - Parallel decoding of several trace files
//! - JSON-lines event output or a JSON run summary

use anyhow::{Context, Result};
use clap::Parser;
use ptrac_decoder::{Decoder, EventKind, EventSink, TokenMode};
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

mod config;
mod filter;
mod report;
mod sink;

use config::{AppConfig, OutputConfig, OutputFormat};
use filter::EventFilter;
use report::{FileReport, RunSummary};
use sink::CutSink;

/// PTRAC Reader - Decode MCNP particle-track files
#[derive(Parser, Debug)]
#[command(name = "ptrac-cli")]
#[command(about = "Decode MCNP PTRAC ASCII files into event records", long_about = None)]
#[command(version)]
struct Args {
    /// PTRAC files to decode
    #[arg(required = true, value_name = "FILES")]
    files: Vec<PathBuf>,

    /// Path to configuration file (decoder settings and cuts)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of title lines before the filter block
    #[arg(long, value_name = "N")]
    prelude_lines: Option<usize>,

    /// Fail records with unreadable numbers instead of reading them as zero
    #[arg(long)]
    strict: bool,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Keep only these event kinds (can be repeated)
    #[arg(long = "kind", value_name = "KIND")]
    kinds: Vec<EventKind>,

    /// Stop each file after this many kept events
    #[arg(long, value_name = "COUNT")]
    max_events: Option<u64>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("PTRAC Reader CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", ptrac_decoder::VERSION);

    let config = resolve_config(&args)?;
    let filter = EventFilter::from_cuts(&config.cuts)?.with_kinds(&args.kinds);
    if !filter.is_pass_through() {
        log::debug!("Event cuts: {:?}", filter);
    }

    let decoder = Decoder::new(config.decoder.clone());
    let reports = match &config.output.path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {:?}", path))?;
            run_files(&mut BufWriter::new(file), &args.files, &decoder, &filter, &config.output)?
        }
        None => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            run_files(&mut out, &args.files, &decoder, &filter, &config.output)?
        }
    };

    let failed = reports.iter().filter(|r| r.failed()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} files could not be fully decoded", failed, reports.len());
    }
    Ok(())
}

/// Merge the optional config file with command-line overrides
fn resolve_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    if let Some(lines) = args.prelude_lines {
        config.decoder.prelude_line_count = lines;
    }
    if args.strict {
        config.decoder.token_mode = TokenMode::Strict;
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(path) = &args.output {
        config.output.path = Some(path.clone());
    }
    if args.max_events.is_some() {
        config.output.max_events = args.max_events;
    }

    log::debug!("Configuration: {:?}", config);
    Ok(config)
}

/// Decode every file and write the output in command-line order.
///
/// JSON lines are streamed straight into `out`, one file after the other, so
/// memory stays flat however large the traces are. The summary only needs
/// per-file tallies, so those files are decoded in parallel.
fn run_files<W: Write>(
    out: &mut W,
    files: &[PathBuf],
    decoder: &Decoder,
    filter: &EventFilter,
    output: &OutputConfig,
) -> Result<Vec<FileReport>> {
    let reports = match output.format {
        OutputFormat::Jsonl => {
            let mut reports = Vec::with_capacity(files.len());
            for path in files {
                let report = decode_one(path, decoder, filter, output.max_events, Some(&mut *out));
                reports.push(report);
            }
            reports
        }
        OutputFormat::Summary => {
            let reports: Vec<FileReport> = files
                .par_iter()
                .map(|path| decode_one(path, decoder, filter, output.max_events, None::<io::Sink>))
                .collect();
            let summary = RunSummary::new(reports.clone());
            serde_json::to_writer_pretty(&mut *out, &summary)
                .context("Failed to write summary")?;
            writeln!(out)?;
            reports
        }
    };
    out.flush().context("Failed to write output")?;

    Ok(reports)
}

/// Decode one file, writing kept records to `lines` when given
fn decode_one<W: Write>(
    path: &Path,
    decoder: &Decoder,
    filter: &EventFilter,
    max_events: Option<u64>,
    lines: Option<W>,
) -> FileReport {
    let mut report = FileReport::new(path);
    let mut sink = CutSink::new(filter, lines);

    let mut events = match decoder.decode_file(path) {
        Ok(events) => events,
        Err(e) => {
            log::error!("{}", e);
            report.error = Some(e.to_string());
            return report;
        }
    };

    for item in events.by_ref() {
        match item {
            Ok(record) => {
                if let Err(e) = sink.accept(record) {
                    log::error!("{:?}: {}", path, e);
                    report.error = Some(e.to_string());
                    break;
                }
                if max_events.is_some_and(|max| sink.kept.events >= max) {
                    log::info!("{:?}: stopping after {} events", path, sink.kept.events);
                    report.limited = true;
                    break;
                }
            }
            // Already logged by the scanner
            Err(e) if e.is_recoverable() => continue,
            Err(e) => {
                log::error!("{:?}: {}", path, e);
                report.error = Some(e.to_string());
                break;
            }
        }
    }

    report.stats = events.stats();
    if let Err(e) = sink.finish(&report.stats) {
        log::error!("{:?}: {}", path, e);
        report.error.get_or_insert_with(|| e.to_string());
    }
    if report.stats.ended_while_resyncing {
        log::warn!("{:?}: trace ended while recovering from a bad record", path);
    }

    report.title = events.preamble().title.clone();
    report.kept_events = sink.kept.events;
    report.kept_completed_histories = sink.kept.completed_histories;
    report.rejected_events = sink.rejected;
    report.by_kind = report::kind_counts(|kind| sink.kept.count(kind));

    log::info!(
        "{:?}: {} events, {} histories, {} kept",
        path,
        report.stats.total_events,
        report.stats.total_completed_histories,
        report.kept_events
    );

    report
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
