//! End-to-end query path: image bytes in, ranked episode matches out.
//!
//! Queries run against an immutable [`SearchSnapshot`] (index + metadata
//! + generation counter) held behind a [`SnapshotHandle`]. Reloads build
//! the new snapshot off to the side and swap the handle atomically, so
//! arbitrarily many in-flight queries keep reading the old generation
//! and never observe a half-rebuilt structure.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use serde::Serialize;

use crate::error::{FramefindError, Result};
use crate::fingerprint::{similarity, FingerprintCodec, HashFamily};
use crate::index::NearestNeighborIndex;
use crate::store::{FingerprintStore, FrameRecord};

/// Immutable search state derived from one load of the store.
#[derive(Debug)]
pub struct SearchSnapshot {
    pub index: NearestNeighborIndex,
    pub records: Vec<FrameRecord>,
    pub family: HashFamily,
    /// Monotone reload counter; lets callers tell snapshots apart.
    pub generation: u64,
}

impl SearchSnapshot {
    fn load(dir: &Path, family: HashFamily, generation: u64) -> Result<Self> {
        let store = FingerprintStore::open(dir, family)?;
        let (fingerprints, records) = store.into_parts();
        let index = NearestNeighborIndex::build(&fingerprints);
        Ok(Self {
            index,
            records,
            family,
            generation,
        })
    }
}

/// Thread-safe, versioned handle to the current snapshot.
pub struct SnapshotHandle {
    current: RwLock<Option<Arc<SearchSnapshot>>>,
    generation: AtomicU64,
}

impl SnapshotHandle {
    /// A handle with nothing loaded; queries fail `IndexNotReady` until
    /// the first successful [`reload`](Self::reload).
    pub fn empty() -> Self {
        Self {
            current: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Rebuild the snapshot from the store directory and swap it in.
    /// On failure the previous snapshot stays active.
    pub fn reload(&self, dir: &Path, family: HashFamily) -> Result<Arc<SearchSnapshot>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Arc::new(SearchSnapshot::load(dir, family, generation)?);
        let mut guard = self.current.write().expect("snapshot lock poisoned");
        *guard = Some(Arc::clone(&snapshot));
        tracing::info!(
            generation,
            index_size = snapshot.index.len(),
            family = %family,
            "Search snapshot swapped in"
        );
        Ok(snapshot)
    }

    pub fn current(&self) -> Result<Arc<SearchSnapshot>> {
        self.current
            .read()
            .expect("snapshot lock poisoned")
            .as_ref()
            .map(Arc::clone)
            .ok_or(FramefindError::IndexNotReady)
    }

    pub fn is_loaded(&self) -> bool {
        self.current
            .read()
            .expect("snapshot lock poisoned")
            .is_some()
    }
}

/// One ranked match, joined with its provenance.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: u64,
    /// Hamming distance in bits (0..=64).
    pub distance: u32,
    /// 100 means identical, 0 means every bit differs.
    pub similarity: f64,
    /// Set on the first (best) hit only.
    pub top_result: bool,
    pub show: String,
    pub season: u32,
    pub episode: u32,
    pub offset_seconds: f64,
    pub position: crate::store::FramePosition,
    pub timecode: String,
    pub source_unit_key: String,
    /// Externally resolvable preview clip URL; issuance policy lives
    /// outside the core.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

/// Per-phase elapsed times, observability only.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SearchTimings {
    pub encode_seconds: f64,
    pub search_seconds: f64,
    pub join_seconds: f64,
    pub total_seconds: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub hits: Vec<SearchHit>,
    pub timings: SearchTimings,
    pub generation: u64,
}

/// Orchestrates a single search: decode, encode, index scan, metadata
/// join, similarity threshold.
pub struct QueryEngine {
    handle: Arc<SnapshotHandle>,
    /// Base URL previews are served under, e.g. an object-store bucket.
    preview_base_url: Option<String>,
}

impl QueryEngine {
    pub fn new(handle: Arc<SnapshotHandle>) -> Self {
        Self {
            handle,
            preview_base_url: None,
        }
    }

    pub fn with_preview_base_url(mut self, base_url: Option<String>) -> Self {
        self.preview_base_url = base_url.map(|u| u.trim_end_matches('/').to_string());
        self
    }

    /// Search the current snapshot with an encoded image.
    ///
    /// Fails with `Decode` on unreadable input and `IndexNotReady`
    /// before the first snapshot load. Returns an empty hit list when
    /// the best candidate falls below `min_similarity` (a percentage);
    /// otherwise at most `k` hits ascending by distance, the first
    /// flagged as the top result.
    pub fn search(
        &self,
        image_bytes: &[u8],
        k: usize,
        min_similarity: f64,
    ) -> Result<SearchOutcome> {
        let snapshot = self.handle.current()?;
        let total_started = Instant::now();

        let encode_started = Instant::now();
        let codec = FingerprintCodec::new(snapshot.family);
        let query = codec.encode_bytes(image_bytes)?;
        let encode_seconds = encode_started.elapsed().as_secs_f64();

        let search_started = Instant::now();
        let neighbors = snapshot.index.search(&query, k);
        let search_seconds = search_started.elapsed().as_secs_f64();

        let join_started = Instant::now();
        let mut hits = Vec::with_capacity(neighbors.len());
        for (rank, neighbor) in neighbors.iter().enumerate() {
            let Some(record) = snapshot.records.get(neighbor.id as usize) else {
                // Ids come from the same snapshot the records do; a miss
                // here means the store violated its own invariants.
                return Err(FramefindError::StoreCorrupt(format!(
                    "index returned id {} with no metadata record",
                    neighbor.id
                )));
            };
            hits.push(self.join_hit(record, neighbor.distance, rank == 0));
        }
        let join_seconds = join_started.elapsed().as_secs_f64();

        // Threshold applies to the best candidate: a sub-threshold top
        // hit means the corpus has no credible match at all.
        if hits.first().map(|h| h.similarity < min_similarity).unwrap_or(false) {
            tracing::debug!(
                best_similarity = hits[0].similarity,
                min_similarity,
                "Best candidate below threshold, returning empty result set"
            );
            hits.clear();
        }

        Ok(SearchOutcome {
            hits,
            timings: SearchTimings {
                encode_seconds,
                search_seconds,
                join_seconds,
                total_seconds: total_started.elapsed().as_secs_f64(),
            },
            generation: snapshot.generation,
        })
    }

    fn join_hit(&self, record: &FrameRecord, distance: u32, top_result: bool) -> SearchHit {
        SearchHit {
            id: record.id,
            distance,
            similarity: similarity(distance),
            top_result,
            show: record.meta.show.clone(),
            season: record.meta.season,
            episode: record.meta.episode,
            offset_seconds: record.meta.offset_seconds,
            position: record.meta.position,
            timecode: record.timecode(),
            source_unit_key: record.meta.source_unit_key.clone(),
            preview_url: self.preview_url_for(record),
        }
    }

    /// `<base>/<show with spaces collapsed>/<unit stem>_<second>.mp4`,
    /// mirroring how the external preview service lays out clips.
    fn preview_url_for(&self, record: &FrameRecord) -> Option<String> {
        let base = self.preview_base_url.as_ref()?;
        let stem = Path::new(&record.meta.source_unit_key)
            .file_stem()?
            .to_str()?
            .replace([' ', '-'], "_");
        let show = record.meta.show.replace([' ', '-'], "_");
        Some(format!(
            "{}/{}/{}_{}.mp4",
            base,
            show,
            stem,
            record.meta.offset_seconds.round() as u64
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FrameMeta, FramePosition};

    fn seed_store(dir: &Path, words: &[u64]) {
        let mut store = FingerprintStore::open(dir, HashFamily::Dct).unwrap();
        for (i, word) in words.iter().enumerate() {
            store.append(
                crate::fingerprint::Fingerprint::from_u64(*word),
                FrameMeta {
                    show: "Test Show".into(),
                    season: 1,
                    episode: 1,
                    offset_seconds: i as f64,
                    position: FramePosition::Start,
                    source_unit_key: "Test_Show_S01E01.mkv".into(),
                    source_path: "/corpus/Test_Show_S01E01.mkv".into(),
                },
            );
        }
        store.flush().unwrap();
    }

    #[test]
    fn test_empty_handle_is_not_ready() {
        let handle = SnapshotHandle::empty();
        assert!(!handle.is_loaded());
        assert!(matches!(
            handle.current().unwrap_err(),
            FramefindError::IndexNotReady
        ));
    }

    #[test]
    fn test_reload_bumps_generation_and_swaps() {
        let dir = tempfile::tempdir().unwrap();
        seed_store(dir.path(), &[1, 2, 3]);

        let handle = SnapshotHandle::empty();
        let first = handle.reload(dir.path(), HashFamily::Dct).unwrap();
        assert_eq!(first.generation, 1);
        assert_eq!(first.index.len(), 3);

        // A query holding the old snapshot is unaffected by a reload.
        let held = handle.current().unwrap();
        let second = handle.reload(dir.path(), HashFamily::Dct).unwrap();
        assert_eq!(second.generation, 2);
        assert_eq!(held.generation, 1);
        assert_eq!(handle.current().unwrap().generation, 2);
    }

    #[test]
    fn test_failed_reload_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        seed_store(dir.path(), &[1, 2]);

        let handle = SnapshotHandle::empty();
        handle.reload(dir.path(), HashFamily::Dct).unwrap();

        // Opening with the wrong family is a corrupt-store load failure.
        assert!(handle.reload(dir.path(), HashFamily::Mean).is_err());
        assert_eq!(handle.current().unwrap().generation, 1);
    }

    #[test]
    fn test_search_requires_loaded_snapshot() {
        let engine = QueryEngine::new(Arc::new(SnapshotHandle::empty()));
        let err = engine.search(&[0u8; 16], 5, 0.0).unwrap_err();
        assert!(matches!(err, FramefindError::IndexNotReady));
    }

    #[test]
    fn test_search_rejects_undecodable_image() {
        let dir = tempfile::tempdir().unwrap();
        seed_store(dir.path(), &[1]);
        let handle = Arc::new(SnapshotHandle::empty());
        handle.reload(dir.path(), HashFamily::Dct).unwrap();

        let engine = QueryEngine::new(handle);
        let err = engine.search(b"not an image", 5, 0.0).unwrap_err();
        assert!(matches!(err, FramefindError::Decode(_)));
    }

    #[test]
    fn test_preview_url_shape() {
        let engine = QueryEngine::new(Arc::new(SnapshotHandle::empty()))
            .with_preview_base_url(Some("http://localhost:9000/previews/".into()));
        let record = FrameRecord {
            id: 9,
            meta: FrameMeta {
                show: "One Piece".into(),
                season: 1,
                episode: 3,
                offset_seconds: 42.0,
                position: FramePosition::Middle,
                source_unit_key: "OnePiece/Season01/OnePiece_S01E03.mkv".into(),
                source_path: "/corpus/OnePiece/Season01/OnePiece_S01E03.mkv".into(),
            },
        };
        let hit = engine.join_hit(&record, 0, true);
        assert_eq!(
            hit.preview_url.as_deref(),
            Some("http://localhost:9000/previews/One_Piece/OnePiece_S01E03_42.mp4")
        );
        assert_eq!(hit.timecode, "00:00:42");
        assert_eq!(hit.similarity, 100.0);
        assert!(hit.top_result);
    }
}
