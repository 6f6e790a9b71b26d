//! Search command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use framefind_core::{HashFamily, QueryEngine, SnapshotHandle};
use tracing::debug;

pub fn execute(
    image: PathBuf,
    data: PathBuf,
    family: String,
    top: usize,
    min_similarity: f64,
    json: bool,
) -> Result<()> {
    let family: HashFamily = family.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let image_bytes = std::fs::read(&image)
        .with_context(|| format!("Failed to read image: {}", image.display()))?;

    let handle = Arc::new(SnapshotHandle::empty());
    let snapshot = handle
        .reload(&data, family)
        .with_context(|| format!("Failed to load fingerprint store from {}", data.display()))?;
    debug!(index_size = snapshot.index.len(), "Snapshot loaded");

    let engine = QueryEngine::new(handle);
    let outcome = engine
        .search(&image_bytes, top, min_similarity)
        .context("Search failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    if outcome.hits.is_empty() {
        println!(
            "{}",
            format!("No match at or above {:.0}% similarity", min_similarity).yellow()
        );
        return Ok(());
    }

    println!();
    println!("{}", format!("Results for {}", image.display()).bold());
    for (rank, hit) in outcome.hits.iter().enumerate() {
        let line = format!(
            "#{}: {} S{:02}E{:02} @ {} ({}, {:.2}% similar, distance {})",
            rank + 1,
            hit.show,
            hit.season,
            hit.episode,
            hit.timecode,
            hit.position,
            hit.similarity,
            hit.distance
        );
        if hit.top_result {
            println!("{}", line.green().bold());
        } else {
            println!("{}", line);
        }
    }
    println!(
        "{}",
        format!(
            "encode {:.1}ms | search {:.1}ms | join {:.1}ms",
            outcome.timings.encode_seconds * 1000.0,
            outcome.timings.search_seconds * 1000.0,
            outcome.timings.join_seconds * 1000.0
        )
        .dimmed()
    );
    Ok(())
}
