//! Unified error types for the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Failures reading or writing the persisted knowledge base.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error on the knowledge file.
    #[error("knowledge store io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The knowledge file is not a JSON object of strings, or could not be encoded.
    #[error("knowledge store json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A writer panicked while holding the in-memory store.
    #[error("knowledge store lock poisoned")]
    Poisoned,
}

/// Invalid engine configuration, reported at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A number failed to parse.
    #[error("invalid number in {var}: {reason}")]
    InvalidNumber {
        var: &'static str,
        reason: &'static str,
    },

    /// A number parsed but lies outside the accepted range.
    #[error("{var} is out of range: {detail}")]
    OutOfRange {
        var: &'static str,
        detail: &'static str,
    },

    /// A boolean flag was neither `true` nor `false`.
    #[error("invalid flag in {var}: expected true or false")]
    InvalidFlag { var: &'static str },
}

/// Top-level error for one engine step.
///
/// None of these are surfaced to the user verbatim; the engine turns them
/// into a generic `error` reply at the request boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The embedding backend failed or returned an unusable vector.
    #[error("embedding error: {0}")]
    Embedding(String),
}

impl From<embedding_service::EmbeddingError> for EngineError {
    fn from(err: embedding_service::EmbeddingError) -> Self {
        EngineError::Embedding(err.to_string())
    }
}
