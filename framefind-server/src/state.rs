//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::path::PathBuf;
use std::sync::Arc;

use framefind_core::{HashFamily, QueryEngine, SnapshotHandle};

use crate::config::Config;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Versioned handle to the current search snapshot
    pub handle: Arc<SnapshotHandle>,
    /// Query engine bound to the handle
    pub engine: Arc<QueryEngine>,
    /// Directory the snapshot is (re)loaded from
    pub data_dir: PathBuf,
    /// Hash family the store was built with
    pub family: HashFamily,
    /// Maximum accepted query image size in bytes
    pub max_file_size: usize,
    /// Result count when the client does not send max_results
    pub default_max_results: usize,
    /// Similarity floor applied when the client does not send one
    pub default_min_similarity: f64,
}

impl AppState {
    /// Build state from configuration; nothing is loaded until the first
    /// reload succeeds.
    pub fn from_config(config: &Config) -> Self {
        let handle = Arc::new(SnapshotHandle::empty());
        let engine = Arc::new(
            QueryEngine::new(Arc::clone(&handle))
                .with_preview_base_url(config.preview_base_url.clone()),
        );
        Self {
            handle,
            engine,
            data_dir: config.data_dir.clone(),
            family: config.hash_family,
            max_file_size: config.max_file_size_mb * 1024 * 1024,
            default_max_results: config.default_max_results,
            default_min_similarity: config.default_min_similarity,
        }
    }
}
