//! Corpus-scale ingestion pipeline.
//!
//! Discovers media units under a corpus root, fingerprints them on a
//! bounded worker pool, and merges completed units into the fingerprint
//! store and checkpoint ledger. Workers own their decoder and codec
//! state and never touch the store; a single orchestrator consumes
//! completed batches one at a time, which preserves monotonic id
//! assignment, flush-before-mark ordering, and all-or-nothing commits
//! per unit without any extra locking.
//!
//! Interrupted runs resume safely: units already marked done are
//! filtered out up front, and a unit is only marked after its batch is
//! durably flushed.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, Semaphore};

use crate::checkpoint::CheckpointLedger;
use crate::decode::FrameSource;
use crate::error::{FramefindError, Result};
use crate::fingerprint::{Fingerprint, FingerprintCodec};
use crate::provenance::parse_unit_path;
use crate::store::{FingerprintStore, FrameMeta, FramePosition};

/// Extensions recognized as media units when none are configured.
pub const DEFAULT_EXTENSIONS: [&str; 3] = ["mkv", "mp4", "avi"];

const DEFAULT_WORKERS: usize = 4;

/// Ingestion settings.
pub struct IngestConfig {
    /// Root directory scanned recursively for media units.
    pub corpus_root: PathBuf,
    /// Lowercase file extensions treated as media units.
    pub extensions: Vec<String>,
    /// Sampled positions per one-second bucket.
    pub positions: Vec<FramePosition>,
    /// Bounded worker-pool size.
    pub workers: usize,
}

impl IngestConfig {
    pub fn new(corpus_root: impl Into<PathBuf>) -> Self {
        Self {
            corpus_root: corpus_root.into(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            positions: FramePosition::ALL.to_vec(),
            workers: DEFAULT_WORKERS,
        }
    }
}

/// One discovered source video, the atomic unit of ingestion.
#[derive(Debug, Clone)]
pub struct MediaUnit {
    /// Absolute (or as-discovered) path of the video file.
    pub path: PathBuf,
    /// Stable key: path relative to the corpus root, `/`-separated.
    pub key: String,
}

/// Outcome counters for one ingestion run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub discovered: usize,
    pub skipped_done: usize,
    pub processed: usize,
    pub failed: usize,
    pub frames: usize,
}

/// Recursively enumerate media units by extension, sorted by key for a
/// stable processing order.
pub fn discover_units(root: &Path, extensions: &[String]) -> Result<Vec<MediaUnit>> {
    let mut units = Vec::new();
    for entry in walkdir::WalkDir::new(root) {
        let entry = entry.map_err(|e| {
            FramefindError::Io(e.into_io_error().unwrap_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::Other, "walkdir loop")
            }))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.iter().any(|want| want.eq_ignore_ascii_case(e)))
            .unwrap_or(false);
        if !matches {
            continue;
        }
        let key = path
            .strip_prefix(root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        units.push(MediaUnit {
            path: path.to_path_buf(),
            key,
        });
    }
    units.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(units)
}

/// Run the pipeline: fingerprint every unit not yet checkpointed and
/// merge results into the store and ledger.
pub async fn run(
    config: &IngestConfig,
    store: &mut FingerprintStore,
    ledger: &CheckpointLedger,
    source: Arc<dyn FrameSource>,
) -> Result<IngestReport> {
    let run_id = uuid::Uuid::new_v4();
    let mut report = IngestReport::default();

    let units = discover_units(&config.corpus_root, &config.extensions)?;
    report.discovered = units.len();

    let pending: Vec<MediaUnit> = units
        .into_iter()
        .filter(|unit| {
            if ledger.is_done(&unit.key) {
                tracing::debug!(unit = %unit.key, "Skipping unit, already checkpointed");
                false
            } else {
                true
            }
        })
        .collect();
    report.skipped_done = report.discovered - pending.len();

    tracing::info!(
        %run_id,
        discovered = report.discovered,
        pending = pending.len(),
        workers = config.workers,
        "Starting ingestion run"
    );

    if pending.is_empty() {
        return Ok(report);
    }

    let total_pending = pending.len();
    let family = store.family();
    let positions = Arc::new(config.positions.clone());
    let semaphore = Arc::new(Semaphore::new(config.workers.max(1)));
    let (tx, mut rx) = mpsc::channel::<(MediaUnit, Result<Vec<(Fingerprint, FrameMeta)>>)>(
        config.workers.max(1),
    );

    for unit in pending {
        let tx = tx.clone();
        let semaphore = Arc::clone(&semaphore);
        let source = Arc::clone(&source);
        let positions = Arc::clone(&positions);
        tokio::spawn(async move {
            // Closed semaphore is impossible here; holders drop on scope exit.
            let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
            let worker_unit = unit.clone();
            let result = tokio::task::spawn_blocking(move || {
                process_unit(&worker_unit, source.as_ref(), family, &positions)
            })
            .await
            .unwrap_or_else(|join_err| {
                Err(FramefindError::IngestUnit {
                    unit: unit.key.clone(),
                    reason: format!("worker panicked: {}", join_err),
                })
            });
            let _ = tx.send((unit, result)).await;
        });
    }
    drop(tx);

    // Sole synchronization point: completed units are merged one at a
    // time, so ids stay monotonic and no partial unit is ever committed.
    let run_started = Instant::now();
    let mut completed = 0usize;
    while let Some((unit, result)) = rx.recv().await {
        completed += 1;
        match result {
            Ok(batch) => {
                let frames = batch.len();
                for (fingerprint, meta) in batch {
                    store.append(fingerprint, meta);
                }
                store.flush()?;
                ledger.mark_done(&unit.key)?;
                report.processed += 1;
                report.frames += frames;

                // Running average wall-clock per unit, extrapolated over
                // what is left.
                let avg = run_started.elapsed() / completed as u32;
                let eta = avg * (total_pending - completed) as u32;
                tracing::info!(
                    unit = %unit.key,
                    frames,
                    progress = format!("{}/{}", completed, total_pending),
                    eta_secs = eta.as_secs(),
                    "Unit committed"
                );
            }
            Err(err) => {
                // Left unmarked so the next run retries it.
                report.failed += 1;
                tracing::warn!(unit = %unit.key, error = %err, "Unit skipped");
            }
        }
    }

    tracing::info!(
        %run_id,
        processed = report.processed,
        failed = report.failed,
        frames = report.frames,
        store_size = store.len(),
        "Ingestion run finished"
    );
    Ok(report)
}

/// Fingerprint one unit end to end. Runs on a worker with no shared
/// mutable state; returns the complete batch or a unit-level error.
fn process_unit(
    unit: &MediaUnit,
    source: &dyn FrameSource,
    family: crate::fingerprint::HashFamily,
    positions: &[FramePosition],
) -> Result<Vec<(Fingerprint, FrameMeta)>> {
    let provenance = parse_unit_path(&unit.path)?;

    let mut stream = source.open(&unit.path).map_err(|e| FramefindError::IngestUnit {
        unit: unit.key.clone(),
        reason: e.to_string(),
    })?;

    let duration = stream.duration_seconds();
    if !duration.is_finite() || duration < 1.0 {
        return Err(FramefindError::IngestUnit {
            unit: unit.key.clone(),
            reason: format!("invalid duration {:.2}s", duration),
        });
    }
    let whole_seconds = duration.floor() as u64;

    tracing::debug!(
        unit = %unit.key,
        show = %provenance.show,
        season = provenance.season,
        episode = provenance.episode,
        duration_secs = whole_seconds,
        "Processing unit"
    );

    let codec = FingerprintCodec::new(family);
    let source_path = unit.path.display().to_string();
    let mut batch = Vec::with_capacity(whole_seconds as usize * positions.len());

    for second in 0..whole_seconds {
        for &position in positions {
            let offset = second as f64 + position.offset_fraction();
            let frame = match stream.frame_at(offset) {
                Ok(frame) => frame,
                Err(err) => {
                    // Frame-level failures are skipped, not fatal to the unit.
                    tracing::debug!(
                        unit = %unit.key,
                        offset,
                        error = %err,
                        "Skipping unreadable frame"
                    );
                    continue;
                }
            };
            let fingerprint = codec.encode(&frame);
            batch.push((
                fingerprint,
                FrameMeta {
                    show: provenance.show.clone(),
                    season: provenance.season,
                    episode: provenance.episode,
                    offset_seconds: second as f64,
                    position,
                    source_unit_key: unit.key.clone(),
                    source_path: source_path.clone(),
                },
            ));
        }
    }

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_filters_by_extension_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("ShowB/Season01")).unwrap();
        std::fs::create_dir_all(root.join("ShowA")).unwrap();
        std::fs::write(root.join("ShowB/Season01/b_S01E01.mkv"), b"").unwrap();
        std::fs::write(root.join("ShowA/a_S01E01.MP4"), b"").unwrap();
        std::fs::write(root.join("ShowA/notes.txt"), b"").unwrap();

        let extensions: Vec<String> = DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect();
        let units = discover_units(root, &extensions).unwrap();
        let keys: Vec<&str> = units.iter().map(|u| u.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["ShowA/a_S01E01.MP4", "ShowB/Season01/b_S01E01.mkv"]
        );
    }

    #[test]
    fn test_unit_keys_are_relative_to_corpus_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("X/Season01")).unwrap();
        std::fs::write(root.join("X/Season01/x_S01E01.mkv"), b"").unwrap();

        let extensions = vec!["mkv".to_string()];
        let units = discover_units(root, &extensions).unwrap();
        assert_eq!(units[0].key, "X/Season01/x_S01E01.mkv");
        assert!(units[0].path.starts_with(root));
    }
}
