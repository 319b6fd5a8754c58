// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `rupture-merge`: grafts target ruptures onto nucleation ruptures.
//!
//! Reads a rupture set (section catalog, pair distances, nucleation and
//! target section lists), runs every nucleation against every target
//! through the compatibility filter chain and writes the merged ruptures as
//! JSON.
//!
//! # Usage
//! ```text
//! rupture-merge --input set.json [--config merge.json] [--max-dist 5]
//!               [--workers N] [--max-splays N] [--allow-overlap] [--output out.json]
//! ```
//!
//! Logs go to stderr (`RUST_LOG` overrides the default `info` level). The
//! process exits non-zero when any nucleation fails to merge.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use rupture_core::{
    MergerConfig, RuptureJumpDistFilter, RuptureMerger, SectionOverlapFilter, SplayCountFilter,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod input;
mod report;

use input::{load_config, RuptureSet};
use report::RuptureRecord;

#[derive(Parser, Debug)]
#[command(author, version, about = "Merge single-fault ruptures into multi-fault ruptures")]
struct Args {
    /// Rupture set JSON (sections, distances, nucleations, targets)
    #[arg(long)]
    input: PathBuf,
    /// Merger config JSON; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,
    /// Maximum jump distance between ruptures (km)
    #[arg(long, default_value_t = 5.0, value_parser = parse_max_dist)]
    max_dist: f64,
    /// Worker threads (0 = available parallelism)
    #[arg(long)]
    workers: Option<usize>,
    /// Reject nucleations already carrying this many splays
    #[arg(long)]
    max_splays: Option<usize>,
    /// Merge ruptures that share sections
    #[arg(long)]
    allow_overlap: bool,
    /// Log every candidate pair
    #[arg(long)]
    verbose: bool,
    /// Output file; stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Args {
    fn merger_config(&self) -> Result<MergerConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => MergerConfig::default(),
        };
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        config.verbose |= self.verbose;
        Ok(config)
    }
}

/// Parses `--max-dist`: a finite, non-negative distance in km.
fn parse_max_dist(raw: &str) -> std::result::Result<f64, String> {
    let value: f64 = raw.parse().map_err(|e| format!("not a number: {e}"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("expected a finite distance >= 0, got {raw}"));
    }
    Ok(value)
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    run(&args)
}

fn run(args: &Args) -> Result<()> {
    let config = args.merger_config()?;
    let prepared = RuptureSet::load(&args.input)?.prepare()?;
    info!(
        nucleations = prepared.nucleations.len(),
        targets = prepared.targets.len(),
        distances = prepared.distances.len(),
        "rupture set loaded"
    );

    let mut merger = RuptureMerger::new(config);
    if let Some(max) = args.max_splays {
        merger.add_filter(SplayCountFilter::new(max));
    }
    if !args.allow_overlap {
        merger.add_filter(SectionOverlapFilter);
    }
    merger.add_filter(RuptureJumpDistFilter::new(args.max_dist, prepared.distances));

    let merged = merger
        .merge_many(&prepared.nucleations, &prepared.targets)
        .into_result()
        .context("merge ruptures")?;
    let records: Vec<RuptureRecord> = merged.iter().map(|r| RuptureRecord::from(&**r)).collect();
    write_records(args.output.as_deref(), &records)?;
    info!(merged = records.len(), "done");
    Ok(())
}

fn write_records(path: Option<&Path>, records: &[RuptureRecord]) -> Result<()> {
    match path {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("create {}", path.display()))?;
            let mut out = std::io::BufWriter::new(file);
            serde_json::to_writer_pretty(&mut out, records)?;
            out.flush()?;
        }
        None => {
            let mut out = std::io::stdout().lock();
            serde_json::to_writer_pretty(&mut out, records)?;
            writeln!(out)?;
        }
    }
    Ok(())
}
