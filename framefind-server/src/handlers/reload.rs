//! Snapshot reload handler

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;

/// POST /reload response
#[derive(Serialize)]
pub struct ReloadResponse {
    /// Generation of the snapshot that is now live
    pub generation: u64,
    /// Number of fingerprints it holds
    pub index_size: usize,
}

/// POST /reload - Rebuild the search snapshot from the store directory
///
/// In-flight queries keep their snapshot; new queries see the reloaded
/// one. On failure the previous snapshot stays active and the error is
/// returned.
pub async fn reload_handler(
    State(state): State<AppState>,
) -> Result<Json<ReloadResponse>, ApiError> {
    let handle = Arc::clone(&state.handle);
    let data_dir = state.data_dir.clone();
    let family = state.family;

    // Loading reads the whole store from disk and rebuilds the index.
    let snapshot = tokio::task::spawn_blocking(move || handle.reload(&data_dir, family))
        .await
        .map_err(|e| ApiError::internal(format!("Reload task panicked: {}", e)))??;

    Ok(Json(ReloadResponse {
        generation: snapshot.generation,
        index_size: snapshot.index.len(),
    }))
}
