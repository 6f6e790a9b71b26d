//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod health;
pub mod reload;
pub mod search;
pub mod status;

pub use crate::state::AppState;
pub use health::{health, ready, HealthResponse, ReadyResponse};
pub use reload::{reload_handler, ReloadResponse};
pub use search::{search_handler, SearchResponse};
pub use status::{status_handler, StatusResponse};
