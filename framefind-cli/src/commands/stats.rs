//! Stats command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use framefind_core::{CheckpointLedger, FingerprintStore, HashFamily};

pub fn execute(data: PathBuf, checkpoints: PathBuf, family: String) -> Result<()> {
    let family: HashFamily = family.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let store = FingerprintStore::open(&data, family)
        .with_context(|| format!("Failed to open fingerprint store in {}", data.display()))?;
    let ledger = CheckpointLedger::open(&checkpoints)
        .with_context(|| format!("Failed to open checkpoint ledger in {}", checkpoints.display()))?;

    let shows: std::collections::BTreeSet<&str> = store
        .records()
        .iter()
        .map(|r| r.meta.show.as_str())
        .collect();

    println!("{}", "FrameFind store".bold());
    println!("   {} {}", "Data dir:".dimmed(), data.display());
    println!("   {} {}", "Hash family:".dimmed(), family);
    println!("   {} {}", "Fingerprints:".dimmed(), store.len());
    println!("   {} {}", "Shows:".dimmed(), shows.len());
    println!("   {} {}", "Units checkpointed:".dimmed(), ledger.done_count()?);
    Ok(())
}
