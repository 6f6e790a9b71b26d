//! Append-only fingerprint repository with provenance metadata.
//!
//! The store owns two correlated files inside its directory: a flat
//! fingerprint array in id order (`fingerprints.bin`, 8 bytes per record)
//! and an id-ordered metadata manifest (`metadata.json`). Records are
//! never mutated or deleted; ids are dense, monotonically assigned, and
//! never reused. `flush` replaces both files atomically
//! (write-temp-then-rename) so no reader observes a half-written file,
//! and must complete before the corresponding checkpoint mark is written.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FramefindError, Result};
use crate::fingerprint::{Fingerprint, HashFamily, FINGERPRINT_BYTES};

/// Flat fingerprint array, id order.
pub const FINGERPRINTS_FILE: &str = "fingerprints.bin";

/// Id-ordered metadata manifest.
pub const METADATA_FILE: &str = "metadata.json";

/// Where inside its one-second bucket a sampled frame sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FramePosition {
    Start,
    Middle,
    End,
}

impl FramePosition {
    /// All positions, in sampling order.
    pub const ALL: [FramePosition; 3] =
        [FramePosition::Start, FramePosition::Middle, FramePosition::End];

    /// Fractional offset of this position within its one-second bucket.
    pub fn offset_fraction(&self) -> f64 {
        match self {
            FramePosition::Start => 0.1,
            FramePosition::Middle => 0.5,
            FramePosition::End => 0.9,
        }
    }
}

impl fmt::Display for FramePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FramePosition::Start => "start",
            FramePosition::Middle => "middle",
            FramePosition::End => "end",
        };
        f.write_str(s)
    }
}

/// Provenance of one fingerprinted frame, minus its store id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameMeta {
    /// Show title, normalized (underscores replaced by spaces).
    pub show: String,
    pub season: u32,
    pub episode: u32,
    /// Whole-second bucket the frame was sampled from.
    pub offset_seconds: f64,
    pub position: FramePosition,
    /// Media unit key: source path relative to the corpus root.
    pub source_unit_key: String,
    /// Absolute path of the source video at ingestion time.
    pub source_path: String,
}

/// A stored frame: dense id plus provenance. The id is the only join key
/// between the nearest-neighbor index and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub id: u64,
    #[serde(flatten)]
    pub meta: FrameMeta,
}

impl FrameRecord {
    /// `HH:MM:SS` timecode of the frame within its episode.
    pub fn timecode(&self) -> String {
        let total = self.meta.offset_seconds.round() as u64;
        format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
    }
}

#[derive(Serialize, Deserialize)]
struct StoreManifest {
    family: HashFamily,
    records: Vec<FrameRecord>,
}

/// Durable, append-only repository addressable by dense integer id.
#[derive(Debug)]
pub struct FingerprintStore {
    dir: PathBuf,
    family: HashFamily,
    fingerprints: Vec<Fingerprint>,
    records: Vec<FrameRecord>,
}

impl FingerprintStore {
    /// Open (or create) a store in `dir` for the given hash family.
    ///
    /// Fails with `StoreCorrupt` when the persisted fingerprint count and
    /// metadata diverge, the byte width is wrong, ids are not dense, or
    /// the store was built with a different family.
    pub fn open(dir: impl AsRef<Path>, family: HashFamily) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;

        let fp_path = dir.join(FINGERPRINTS_FILE);
        let meta_path = dir.join(METADATA_FILE);

        match (fp_path.exists(), meta_path.exists()) {
            (false, false) => Ok(Self {
                dir,
                family,
                fingerprints: Vec::new(),
                records: Vec::new(),
            }),
            (true, true) => {
                let (fingerprints, records) = Self::load(&fp_path, &meta_path, family)?;
                tracing::info!(
                    dir = %dir.display(),
                    fingerprints = fingerprints.len(),
                    family = %family,
                    "Loaded fingerprint store"
                );
                Ok(Self {
                    dir,
                    family,
                    fingerprints,
                    records,
                })
            }
            (fp, _) => Err(FramefindError::StoreCorrupt(format!(
                "{} exists without its companion file in {}",
                if fp { FINGERPRINTS_FILE } else { METADATA_FILE },
                dir.display()
            ))),
        }
    }

    fn load(
        fp_path: &Path,
        meta_path: &Path,
        family: HashFamily,
    ) -> Result<(Vec<Fingerprint>, Vec<FrameRecord>)> {
        let raw = std::fs::read(fp_path)?;
        if raw.len() % FINGERPRINT_BYTES != 0 {
            return Err(FramefindError::StoreCorrupt(format!(
                "fingerprint file is {} bytes, not a multiple of the {}-byte family width",
                raw.len(),
                FINGERPRINT_BYTES
            )));
        }
        let fingerprints: Vec<Fingerprint> = raw
            .chunks_exact(FINGERPRINT_BYTES)
            .map(|chunk| {
                let mut bytes = [0u8; FINGERPRINT_BYTES];
                bytes.copy_from_slice(chunk);
                Fingerprint::from_bytes(bytes)
            })
            .collect();

        let manifest: StoreManifest = serde_json::from_slice(&std::fs::read(meta_path)?)?;
        if manifest.family != family {
            return Err(FramefindError::StoreCorrupt(format!(
                "store was built with family '{}', asked to open as '{}'",
                manifest.family, family
            )));
        }
        if manifest.records.len() != fingerprints.len() {
            return Err(FramefindError::StoreCorrupt(format!(
                "{} fingerprints but {} metadata records",
                fingerprints.len(),
                manifest.records.len()
            )));
        }
        for (expected, record) in manifest.records.iter().enumerate() {
            if record.id != expected as u64 {
                return Err(FramefindError::StoreCorrupt(format!(
                    "metadata id {} found where {} was expected",
                    record.id, expected
                )));
            }
        }
        Ok((fingerprints, manifest.records))
    }

    /// Append one fingerprint with its provenance, assigning the next
    /// unused id. Amortized O(1); durable only after `flush`.
    pub fn append(&mut self, fingerprint: Fingerprint, meta: FrameMeta) -> u64 {
        let id = self.fingerprints.len() as u64;
        self.fingerprints.push(fingerprint);
        self.records.push(FrameRecord { id, meta });
        id
    }

    /// Durably persist the store via atomic replace of both files.
    pub fn flush(&self) -> Result<()> {
        let mut raw = Vec::with_capacity(self.fingerprints.len() * FINGERPRINT_BYTES);
        for fp in &self.fingerprints {
            raw.extend_from_slice(fp.as_bytes());
        }
        write_atomic(&self.dir.join(FINGERPRINTS_FILE), &raw)?;

        let manifest = StoreManifest {
            family: self.family,
            records: self.records.clone(),
        };
        write_atomic(&self.dir.join(METADATA_FILE), &serde_json::to_vec(&manifest)?)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }

    pub fn family(&self) -> HashFamily {
        self.family
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn fingerprints(&self) -> &[Fingerprint] {
        &self.fingerprints
    }

    pub fn records(&self) -> &[FrameRecord] {
        &self.records
    }

    pub fn record(&self, id: u64) -> Option<&FrameRecord> {
        self.records.get(id as usize)
    }

    /// Consume the store, yielding fingerprints and records for index
    /// construction without copying.
    pub fn into_parts(self) -> (Vec<Fingerprint>, Vec<FrameRecord>) {
        (self.fingerprints, self.records)
    }
}

/// Write-temp-then-rename so no reader ever observes a partial file.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| FramefindError::Io(e.error))?;
    Ok(())
}
