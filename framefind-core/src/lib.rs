//! FrameFind Core - fingerprint indexing and search engine.
//!
//! Identifies which show, episode, and timestamp a still image came from
//! by matching it against a precomputed library of perceptual-hash
//! fingerprints extracted from video frames.
//!
//! # Architecture
//!
//! - [`fingerprint`]: deterministic 64-bit perceptual hash families
//! - [`store`]: append-only fingerprint repository with provenance
//! - [`checkpoint`]: durable per-unit completion marks for safe resume
//! - [`ingest`]: parallel corpus ingestion pipeline
//! - [`index`]: exact Hamming-distance nearest-neighbor search
//! - [`query`]: decode, encode, search, and metadata join in one call
//!
//! The store and checkpoint ledger together are the source of truth;
//! the index is derived and fully rebuildable from the store.
//!
//! # Example
//!
//! ```no_run
//! use framefind_core::{HashFamily, QueryEngine, SnapshotHandle};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # fn example() -> framefind_core::Result<()> {
//! let handle = Arc::new(SnapshotHandle::empty());
//! handle.reload(Path::new("data"), HashFamily::Dct)?;
//!
//! let engine = QueryEngine::new(handle);
//! let image = std::fs::read("frame.png")?;
//! let outcome = engine.search(&image, 5, 80.0)?;
//! for hit in &outcome.hits {
//!     println!("{} S{:02}E{:02} @ {}", hit.show, hit.season, hit.episode, hit.timecode);
//! }
//! # Ok(())
//! # }
//! ```

pub mod checkpoint;
pub mod decode;
pub mod error;
pub mod fingerprint;
pub mod index;
pub mod ingest;
pub mod provenance;
pub mod query;
pub mod store;

pub use checkpoint::CheckpointLedger;
pub use decode::{FrameSource, VideoStream};
pub use error::{FramefindError, Result};
pub use fingerprint::{
    similarity, Fingerprint, FingerprintCodec, HashFamily, FINGERPRINT_BITS, FINGERPRINT_BYTES,
};
pub use index::{Neighbor, NearestNeighborIndex};
pub use ingest::{discover_units, IngestConfig, IngestReport, MediaUnit, DEFAULT_EXTENSIONS};
pub use provenance::{parse_unit_path, Provenance};
pub use query::{QueryEngine, SearchHit, SearchOutcome, SearchSnapshot, SearchTimings, SnapshotHandle};
pub use store::{FingerprintStore, FrameMeta, FramePosition, FrameRecord};
