use thiserror::Error;

#[derive(Error, Debug)]
pub enum FramefindError {
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("no naming pattern matches media unit: {path}")]
    Parse { path: String },

    #[error("fingerprint store corrupt: {0}")]
    StoreCorrupt(String),

    #[error("cannot ingest unit {unit}: {reason}")]
    IngestUnit { unit: String, reason: String },

    #[error("search index not loaded")]
    IndexNotReady,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FramefindError>;
