//! Store status handler

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// GET /status response
#[derive(Serialize)]
pub struct StatusResponse {
    /// Whether a search snapshot has been loaded
    pub data_loaded: bool,
    /// Number of fingerprints in the loaded index
    pub index_size: usize,
    /// Number of metadata records in the loaded snapshot
    pub metadata_count: usize,
    /// Snapshot generation, 0 before the first load
    pub generation: u64,
    /// Hash family the server expects the store to carry
    pub family: String,
}

/// GET /status - Report what the server currently has loaded
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    match state.handle.current() {
        Ok(snapshot) => Json(StatusResponse {
            data_loaded: true,
            index_size: snapshot.index.len(),
            metadata_count: snapshot.records.len(),
            generation: snapshot.generation,
            family: snapshot.family.to_string(),
        }),
        Err(_) => Json(StatusResponse {
            data_loaded: false,
            index_size: 0,
            metadata_count: 0,
            generation: 0,
            family: state.family.to_string(),
        }),
    }
}
