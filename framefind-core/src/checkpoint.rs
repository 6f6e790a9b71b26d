//! Durable per-unit completion marks for resumable ingestion.
//!
//! One marker file per media unit, named by the SHA3-256 digest of the
//! unit key (the path relative to the corpus root). Digesting keeps
//! marker names filesystem-safe for keys containing separators and
//! collision-resistant across shows with identically named files. The
//! marker body holds the original key so operators can map markers back
//! to units when remediating by hand.
//!
//! A unit is marked done only after its fingerprints have been durably
//! flushed to the store; removing a marker causes the unit to be
//! reprocessed on the next run.

use std::io::Write;
use std::path::{Path, PathBuf};

use sha3::{Digest, Sha3_256};

use crate::error::Result;

const MARKER_EXT: &str = "done";

pub struct CheckpointLedger {
    dir: PathBuf,
}

impl CheckpointLedger {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn marker_path(&self, unit_key: &str) -> PathBuf {
        let digest = Sha3_256::digest(unit_key.as_bytes());
        self.dir.join(format!("{}.{}", hex::encode(digest), MARKER_EXT))
    }

    pub fn is_done(&self, unit_key: &str) -> bool {
        self.marker_path(unit_key).exists()
    }

    /// Record that every record of the unit is present in the persisted
    /// store. Callable only after the unit's batch has been flushed.
    pub fn mark_done(&self, unit_key: &str) -> Result<()> {
        let path = self.marker_path(unit_key);
        let mut file = std::fs::File::create(&path)?;
        file.write_all(unit_key.as_bytes())?;
        file.sync_all()?;
        Ok(())
    }

    /// Number of units marked done.
    pub fn done_count(&self) -> Result<usize> {
        let mut count = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.path().extension().and_then(|e| e.to_str()) == Some(MARKER_EXT) {
                count += 1;
            }
        }
        Ok(count)
    }
}
