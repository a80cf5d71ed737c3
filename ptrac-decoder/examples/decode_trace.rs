//! Standalone PTRAC trace dump tool
//!
//! Decodes a PTRAC ASCII file and prints each event with the catalog
//! descriptions of its codes, followed by a summary.
//!
//! Usage:
//!   decode_trace <file.ptrac> [--prelude <lines>] [--limit <count>] [--photon] [--verbose]
//!
//! `--photon` reads collision and termination codes as photon codes.
//!
//! Example:
//!   decode_trace run.ptrac --limit 100

use ptrac_decoder::catalog::{self, ParticleFamily};
use ptrac_decoder::{Decoder, DecoderConfig, EventKind, EventRecord, KindFields};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

struct TraceStats {
    events: usize,
    errors: usize,
    by_kind: BTreeMap<EventKind, usize>,
    reactions: BTreeMap<i64, usize>,
}

impl TraceStats {
    fn new() -> Self {
        Self {
            events: 0,
            errors: 0,
            by_kind: BTreeMap::new(),
            reactions: BTreeMap::new(),
        }
    }

    fn print_summary(&self) {
        println!("\n=== DECODING SUMMARY ===");
        println!("Events decoded: {}", self.events);
        println!("Record errors: {}", self.errors);
        for (kind, count) in &self.by_kind {
            println!("  {} ({}): {}", kind, kind.label(), count);
        }

        if !self.reactions.is_empty() {
            println!("\nTop 10 Collision Reactions:");
            let mut sorted: Vec<_> = self.reactions.iter().collect();
            sorted.sort_by(|a, b| b.1.cmp(a.1));
            for (mt, count) in sorted.iter().take(10) {
                let name = catalog::reaction_name(**mt).unwrap_or("unknown".into());
                println!("  MT {} {}: {} times", mt, name, count);
            }
        }
    }
}

fn describe(record: &EventRecord, family: ParticleFamily) -> String {
    match record.fields {
        KindFields::Source { source_type, cell, .. } => {
            format!("source type {} in cell {}", source_type, cell)
        }
        KindFields::Bank { zzaaa, .. } => {
            let reason = record
                .bank_reason()
                .map(|r| r.description())
                .unwrap_or("unlisted bank code");
            format!("{} (target {})", reason, zzaaa)
        }
        KindFields::Surface { surface, angle_code, .. } => {
            format!("crossed surface {} (angle {})", surface, angle_code)
        }
        KindFields::Collision { zzaaa, reaction_type, .. } => {
            let name: Cow<'static, str> = match family {
                ParticleFamily::Photon => catalog::photon_reaction_description(reaction_type)
                    .map(Into::into)
                    .unwrap_or("?".into()),
                _ => catalog::reaction_name(reaction_type).unwrap_or("?".into()),
            };
            format!("{} on {}", name, zzaaa)
        }
        KindFields::Termination { termination_type, .. } => {
            catalog::termination_description(termination_type, family)
                .unwrap_or("unlisted termination")
                .to_string()
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!(
            "Usage: {} <file.ptrac> [--prelude <lines>] [--limit <count>] [--photon] [--verbose]",
            args[0]
        );
        std::process::exit(1);
    }

    let trace_file = PathBuf::from(&args[1]);
    let mut config = DecoderConfig::new();
    let mut limit: Option<usize> = None;
    let mut verbose = false;
    let mut family = ParticleFamily::Neutron;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--prelude" => {
                i += 1;
                if i < args.len() {
                    config = config.with_prelude_lines(args[i].parse()?);
                }
            }
            "--limit" => {
                i += 1;
                if i < args.len() {
                    limit = Some(args[i].parse()?);
                }
            }
            "--photon" => {
                family = ParticleFamily::Photon;
            }
            "--verbose" | "-v" => {
                verbose = true;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
            }
        }
        i += 1;
    }

    println!("=== PTRAC Decoder ===");
    println!("Trace file: {:?}", trace_file);

    let decoder = Decoder::new(config);
    let mut events = decoder.decode_file(&trace_file)?;
    let mut stats = TraceStats::new();

    for item in events.by_ref() {
        let record = match item {
            Ok(record) => record,
            Err(e) => {
                eprintln!("Error: {}", e);
                stats.errors += 1;
                continue;
            }
        };

        stats.events += 1;
        *stats.by_kind.entry(record.kind).or_insert(0) += 1;
        if let KindFields::Collision { reaction_type, .. } = record.fields {
            *stats.reactions.entry(reaction_type).or_insert(0) += 1;
        }

        if verbose || record.kind != EventKind::Bank {
            println!(
                "[{:>8}] {} E={:.4} MeV W={:.3} ({:.3}, {:.3}, {:.3}) {}",
                record.history_id,
                record.kind.label(),
                record.energy,
                record.weight,
                record.position[0],
                record.position[1],
                record.position[2],
                describe(&record, family)
            );
        }

        if limit.is_some_and(|n| stats.events >= n) {
            println!("\nLimit reached");
            break;
        }
    }

    let preamble = events.preamble();
    if verbose && !preamble.variable_ids.is_empty() {
        println!("\n=== DECLARED VARIABLES ===");
        for id in &preamble.variable_ids {
            println!(
                "  {:>2} {}",
                id,
                catalog::variable_description(*id).unwrap_or("unknown")
            );
        }
    }

    stats.print_summary();
    Ok(())
}
