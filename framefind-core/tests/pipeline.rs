//! End-to-end pipeline tests: ingestion over a synthetic corpus, crash
//! resume, idempotent re-runs, and the full query path.
//!
//! The synthetic frame source renders each sampled frame as an 8x8 grid
//! of uniform black/white cells driven by a per-frame bit pattern, so
//! frames are visually distinct, deterministic, and reproducible at
//! query time.

use std::collections::HashSet;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use framefind_core::{
    CheckpointLedger, FingerprintStore, FrameSource, FramefindError, FramePosition, HashFamily,
    IngestConfig, QueryEngine, SnapshotHandle, VideoStream,
};

const POSITIONS_PER_SECOND: usize = 3;

/// Render a 64-bit pattern as an 8x8 grid of 8px uniform cells.
fn block_image(pattern: u64) -> DynamicImage {
    let img = RgbImage::from_fn(64, 64, |x, y| {
        let bit = (y / 8) * 8 + (x / 8);
        if pattern >> bit & 1 == 1 {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    });
    DynamicImage::ImageRgb8(img)
}

fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// Injective per-frame pattern for a given unit salt.
fn pattern_word(salt: u64, frame_index: u64) -> u64 {
    (salt ^ (frame_index + 1)).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

fn unit_salt(path: &Path) -> u64 {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .bytes()
        .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64))
}

/// The frame a synthetic unit shows at a given sampled offset.
fn synthetic_frame(salt: u64, second: u64, position: FramePosition) -> DynamicImage {
    let position_index = FramePosition::ALL
        .iter()
        .position(|p| *p == position)
        .unwrap() as u64;
    block_image(pattern_word(
        salt,
        second * POSITIONS_PER_SECOND as u64 + position_index,
    ))
}

struct SyntheticSource {
    duration_seconds: f64,
    /// Unit keys (filename substrings) that fail to open, simulating an
    /// interrupted or unreadable unit.
    failing: HashSet<String>,
}

impl SyntheticSource {
    fn new(duration_seconds: f64) -> Self {
        Self {
            duration_seconds,
            failing: HashSet::new(),
        }
    }

    fn failing_on(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }
}

impl FrameSource for SyntheticSource {
    fn open(&self, path: &Path) -> framefind_core::Result<Box<dyn VideoStream>> {
        let name = path.to_string_lossy().to_string();
        if self.failing.iter().any(|f| name.contains(f.as_str())) {
            return Err(FramefindError::IngestUnit {
                unit: name,
                reason: "simulated open failure".into(),
            });
        }
        Ok(Box::new(SyntheticStream {
            salt: unit_salt(path),
            duration_seconds: self.duration_seconds,
        }))
    }
}

struct SyntheticStream {
    salt: u64,
    duration_seconds: f64,
}

impl VideoStream for SyntheticStream {
    fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    fn frame_at(&mut self, offset_seconds: f64) -> framefind_core::Result<DynamicImage> {
        let second = offset_seconds.floor() as u64;
        let fraction = offset_seconds - second as f64;
        let position = if fraction < 0.3 {
            FramePosition::Start
        } else if fraction < 0.7 {
            FramePosition::Middle
        } else {
            FramePosition::End
        };
        Ok(synthetic_frame(self.salt, second, position))
    }
}

struct Fixture {
    _tmp: tempfile::TempDir,
    corpus: PathBuf,
    data: PathBuf,
    checkpoints: PathBuf,
}

impl Fixture {
    fn new(unit_names: &[&str]) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let corpus = tmp.path().join("corpus");
        for name in unit_names {
            let path = corpus.join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, b"synthetic").unwrap();
        }
        Fixture {
            corpus,
            data: tmp.path().join("data"),
            checkpoints: tmp.path().join("checkpoints"),
            _tmp: tmp,
        }
    }

    fn config(&self) -> IngestConfig {
        let mut config = IngestConfig::new(&self.corpus);
        // Single worker keeps completion order deterministic for
        // byte-level store comparisons.
        config.workers = 1;
        config
    }

    async fn ingest(&self, source: SyntheticSource) -> framefind_core::IngestReport {
        let mut store = FingerprintStore::open(&self.data, HashFamily::Mean).unwrap();
        let ledger = CheckpointLedger::open(&self.checkpoints).unwrap();
        framefind_core::ingest::run(&self.config(), &mut store, &ledger, Arc::new(source))
            .await
            .unwrap()
    }

    fn store_bytes(&self) -> (Vec<u8>, Vec<u8>) {
        (
            std::fs::read(self.data.join("fingerprints.bin")).unwrap(),
            std::fs::read(self.data.join("metadata.json")).unwrap(),
        )
    }
}

#[tokio::test]
async fn test_ten_second_unit_yields_thirty_tagged_records() {
    let fixture = Fixture::new(&["TestShow/Season01/TestShow_S01E01.mkv"]);
    let report = fixture.ingest(SyntheticSource::new(10.0)).await;

    assert_eq!(report.discovered, 1);
    assert_eq!(report.processed, 1);
    assert_eq!(report.frames, 30);

    let store = FingerprintStore::open(&fixture.data, HashFamily::Mean).unwrap();
    assert_eq!(store.len(), 30);

    for (i, record) in store.records().iter().enumerate() {
        assert_eq!(record.id, i as u64);
        assert_eq!(record.meta.offset_seconds, (i / 3) as f64);
        assert_eq!(record.meta.position, FramePosition::ALL[i % 3]);
        assert_eq!(record.meta.show, "TestShow");
        assert_eq!(record.meta.season, 1);
        assert_eq!(record.meta.episode, 1);
        assert_eq!(record.meta.source_unit_key, "TestShow/Season01/TestShow_S01E01.mkv");
    }
    // Seconds span 0..=9 inclusive.
    assert_eq!(store.records().first().unwrap().meta.offset_seconds, 0.0);
    assert_eq!(store.records().last().unwrap().meta.offset_seconds, 9.0);
}

#[tokio::test]
async fn test_identical_frame_query_returns_exact_match() {
    let fixture = Fixture::new(&["TestShow/Season01/TestShow_S01E01.mkv"]);
    fixture.ingest(SyntheticSource::new(10.0)).await;

    let handle = Arc::new(SnapshotHandle::empty());
    handle.reload(&fixture.data, HashFamily::Mean).unwrap();
    let engine = QueryEngine::new(handle);

    // The frame behind record id=17: second 5, position End (17 = 5*3 + 2).
    let salt = unit_salt(Path::new("TestShow_S01E01.mkv"));
    let query = png_bytes(&synthetic_frame(salt, 5, FramePosition::End));

    let outcome = engine.search(&query, 5, 0.0).unwrap();
    let top = &outcome.hits[0];
    assert_eq!(top.id, 17);
    assert_eq!(top.distance, 0);
    assert_eq!(top.similarity, 100.0);
    assert!(top.top_result);
    assert_eq!(top.offset_seconds, 5.0);
    assert_eq!(top.position, FramePosition::End);
    assert_eq!(top.timecode, "00:00:05");
    assert!(!outcome.hits[1].top_result);
    for pair in outcome.hits.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
}

#[tokio::test]
async fn test_min_similarity_filters_weak_best_match() {
    let fixture = Fixture::new(&["TestShow/Season01/TestShow_S01E01.mkv"]);
    fixture.ingest(SyntheticSource::new(10.0)).await;

    let handle = Arc::new(SnapshotHandle::empty());
    handle.reload(&fixture.data, HashFamily::Mean).unwrap();
    let engine = QueryEngine::new(handle);

    // Corrupt the frame behind id=17 by flipping 13 of its 64 cells:
    // the best possible match sits near 80% similarity.
    let salt = unit_salt(Path::new("TestShow_S01E01.mkv"));
    let pattern = pattern_word(salt, 17) ^ 0x1FFF;
    let query = png_bytes(&block_image(pattern));

    let strict = engine.search(&query, 5, 90.0).unwrap();
    assert!(strict.hits.is_empty());

    let lenient = engine.search(&query, 5, 0.0).unwrap();
    assert_eq!(lenient.hits[0].id, 17);
    assert!(lenient.hits[0].similarity < 90.0);
    assert!(lenient.hits[0].distance > 0);
}

#[tokio::test]
async fn test_interrupted_run_resumes_without_duplicates_or_gaps() {
    let units = [
        "ShowA/Season01/ShowA_S01E01.mkv",
        "ShowA/Season01/ShowA_S01E02.mkv",
    ];

    // Reference: one uninterrupted run over both units.
    let reference = Fixture::new(&units);
    let report = reference.ingest(SyntheticSource::new(5.0)).await;
    assert_eq!(report.processed, 2);
    let (ref_fp, ref_meta) = reference.store_bytes();

    // Interrupted: episode 2 fails on the first run, then a restart
    // picks it up.
    let resumed = Fixture::new(&units);
    let first = resumed
        .ingest(SyntheticSource::new(5.0).failing_on("S01E02"))
        .await;
    assert_eq!(first.processed, 1);
    assert_eq!(first.failed, 1);

    let second = resumed.ingest(SyntheticSource::new(5.0)).await;
    assert_eq!(second.skipped_done, 1);
    assert_eq!(second.processed, 1);
    assert_eq!(second.failed, 0);

    let (res_fp, res_meta) = resumed.store_bytes();
    assert_eq!(ref_fp, res_fp);
    // Metadata differs only in the temp-dir prefix of source paths.
    let normalize = |bytes: &[u8], fixture: &Fixture| {
        String::from_utf8(bytes.to_vec())
            .unwrap()
            .replace(&fixture.corpus.display().to_string(), "<corpus>")
    };
    assert_eq!(
        normalize(&ref_meta, &reference),
        normalize(&res_meta, &resumed)
    );
}

#[tokio::test]
async fn test_rerun_over_complete_corpus_is_idempotent() {
    let fixture = Fixture::new(&[
        "ShowA/Season01/ShowA_S01E01.mkv",
        "ShowA/Season01/ShowA_S01E02.mkv",
    ]);
    let first = fixture.ingest(SyntheticSource::new(5.0)).await;
    assert_eq!(first.processed, 2);
    let before = fixture.store_bytes();

    let second = fixture.ingest(SyntheticSource::new(5.0)).await;
    assert_eq!(second.processed, 0);
    assert_eq!(second.failed, 0);
    assert_eq!(second.skipped_done, 2);
    assert_eq!(fixture.store_bytes(), before);
}

#[tokio::test]
async fn test_unparseable_unit_is_skipped_and_retried_later() {
    let fixture = Fixture::new(&["loose_video.mkv", "ShowA/Season01/ShowA_S01E01.mkv"]);
    let report = fixture.ingest(SyntheticSource::new(5.0)).await;

    assert_eq!(report.discovered, 2);
    assert_eq!(report.processed, 1);
    assert_eq!(report.failed, 1);

    // The failed unit stays unmarked, so a later run tries it again.
    let ledger = CheckpointLedger::open(&fixture.checkpoints).unwrap();
    assert!(!ledger.is_done("loose_video.mkv"));
    assert!(ledger.is_done("ShowA/Season01/ShowA_S01E01.mkv"));
}

#[tokio::test]
async fn test_zero_duration_unit_is_skipped() {
    let fixture = Fixture::new(&["ShowA/Season01/ShowA_S01E01.mkv"]);
    let report = fixture.ingest(SyntheticSource::new(0.0)).await;

    assert_eq!(report.processed, 0);
    assert_eq!(report.failed, 1);

    let store = FingerprintStore::open(&fixture.data, HashFamily::Mean).unwrap();
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_parallel_ingestion_commits_whole_units() {
    let units = [
        "ShowA/Season01/ShowA_S01E01.mkv",
        "ShowA/Season01/ShowA_S01E02.mkv",
        "ShowA/Season01/ShowA_S01E03.mkv",
        "ShowA/Season02/ShowA_S02E01.mkv",
    ];
    let fixture = Fixture::new(&units);
    let mut config = fixture.config();
    config.workers = 4;

    let mut store = FingerprintStore::open(&fixture.data, HashFamily::Mean).unwrap();
    let ledger = CheckpointLedger::open(&fixture.checkpoints).unwrap();
    let report = framefind_core::ingest::run(
        &config,
        &mut store,
        &ledger,
        Arc::new(SyntheticSource::new(3.0)),
    )
    .await
    .unwrap();

    assert_eq!(report.processed, 4);
    assert_eq!(store.len(), 4 * 3 * 3);

    // Whatever the completion order, each unit's records are contiguous
    // and ids are dense.
    let records = store.records();
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.id, i as u64);
    }
    for chunk in records.chunks(9) {
        let keys: HashSet<&str> = chunk.iter().map(|r| r.meta.source_unit_key.as_str()).collect();
        assert_eq!(keys.len(), 1);
    }
}
