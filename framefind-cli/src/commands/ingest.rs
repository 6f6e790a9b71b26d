//! Ingest command implementation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use colored::Colorize;
use framefind_core::{CheckpointLedger, FingerprintStore, HashFamily, IngestConfig};
use tracing::info;

use crate::ffmpeg::FfmpegSource;

pub async fn execute(
    corpus: PathBuf,
    data: PathBuf,
    checkpoints: PathBuf,
    workers: usize,
    family: String,
    extensions: String,
) -> Result<()> {
    let family: HashFamily = family.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let mut store = FingerprintStore::open(&data, family)
        .with_context(|| format!("Failed to open fingerprint store in {}", data.display()))?;
    let ledger = CheckpointLedger::open(&checkpoints)
        .with_context(|| format!("Failed to open checkpoint ledger in {}", checkpoints.display()))?;

    let mut config = IngestConfig::new(&corpus);
    config.workers = workers;
    config.extensions = extensions
        .split(',')
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    info!(
        corpus = %corpus.display(),
        data = %data.display(),
        workers,
        family = %family,
        "Starting ingestion"
    );

    let started = Instant::now();
    let report = framefind_core::ingest::run(&config, &mut store, &ledger, Arc::new(FfmpegSource))
        .await
        .context("Ingestion run failed")?;
    let elapsed = started.elapsed();

    println!();
    println!("{}", "Ingestion complete".green().bold());
    println!("   {} {}", "Discovered:".dimmed(), report.discovered);
    println!("   {} {}", "Already done:".dimmed(), report.skipped_done);
    println!("   {} {}", "Processed:".dimmed(), report.processed);
    if report.failed > 0 {
        println!("   {} {}", "Failed (will retry):".dimmed(), report.failed.to_string().yellow());
    }
    println!("   {} {}", "Fingerprints added:".dimmed(), report.frames);
    println!("   {} {}", "Store size:".dimmed(), store.len());
    println!("   {} {:.1}s", "Elapsed:".dimmed(), elapsed.as_secs_f64());
    Ok(())
}
