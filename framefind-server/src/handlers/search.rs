//! Search handler
//!
//! POST /search accepts a query image as multipart/form-data and returns
//! the closest corpus frames with their provenance.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use framefind_core::{SearchHit, SearchTimings};

use crate::error::ApiError;
use crate::multipart::MultipartFields;
use crate::state::AppState;

/// Hard ceiling on max_results regardless of what the client asks for.
const MAX_RESULTS_CAP: usize = 100;

/// POST /search response
#[derive(Serialize)]
pub struct SearchResponse {
    /// Correlates this response with server logs
    pub query_id: String,
    /// Ranked matches, best first; empty when nothing clears the
    /// similarity floor
    pub results: Vec<SearchHit>,
    /// Per-phase elapsed times
    pub timings: SearchTimings,
    /// Snapshot generation the query ran against
    pub generation: u64,
}

/// POST /search - Find the frames closest to an uploaded image
///
/// Accepts multipart/form-data with:
/// - file: The query image (JPEG, PNG, GIF, WebP)
/// - max_results (optional): result count, capped at 100
/// - min_similarity (optional): similarity floor in percent for the best hit
pub async fn search_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SearchResponse>, ApiError> {
    let fields = MultipartFields::parse(&mut multipart, state.max_file_size).await?;
    let (file, text_fields) = fields.require_file()?;

    let max_results = match text_fields.get("max_results") {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| {
                ApiError::bad_request(format!("max_results must be a positive integer, got '{}'", raw))
            })?
            .clamp(1, MAX_RESULTS_CAP),
        None => state.default_max_results,
    };

    let min_similarity = match text_fields.get("min_similarity") {
        Some(raw) => raw.parse::<f64>().map_err(|_| {
            ApiError::bad_request(format!("min_similarity must be a number, got '{}'", raw))
        })?,
        None => state.default_min_similarity,
    };

    let query_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(
        query_id = %query_id,
        file_name = file.file_name.as_deref().unwrap_or("<unnamed>"),
        bytes = file.data.len(),
        max_results,
        min_similarity,
        "Search request"
    );

    // Decoding and the linear index scan are CPU-bound; keep them off
    // the async runtime threads.
    let engine = Arc::clone(&state.engine);
    let outcome = tokio::task::spawn_blocking(move || {
        engine.search(&file.data, max_results, min_similarity)
    })
    .await
    .map_err(|e| ApiError::internal(format!("Search task panicked: {}", e)))??;

    tracing::info!(
        query_id = %query_id,
        hits = outcome.hits.len(),
        total_seconds = outcome.timings.total_seconds,
        "Search complete"
    );

    Ok(Json(SearchResponse {
        query_id,
        results: outcome.hits,
        timings: outcome.timings,
        generation: outcome.generation,
    }))
}
