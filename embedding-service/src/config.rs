//! Embedding client config loaded strictly from environment variables.
//!
//! # Environment variables
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (mandatory)
//! - `EMBEDDING_MODEL`             = embedding model (mandatory)
//! - `EMBEDDING_DIM`               = expected vector size (optional)
//! - `EMBEDDING_TIMEOUT_SECS`      = HTTP timeout, default 30

use crate::error_handler::{
    ConfigError, EmbeddingError, must_var, opt_number, validate_http_endpoint,
};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for an Ollama embedding model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingConfig {
    /// Base URL, e.g. `http://localhost:11434`.
    pub endpoint: String,
    pub model: String,
    /// When set, vectors of any other size are rejected.
    pub dim: Option<usize>,
    pub timeout_secs: u64,
}

impl EmbeddingConfig {
    /// Loads the config from process environment.
    ///
    /// # Errors
    /// - [`ConfigError::MissingVar`] if endpoint or model is missing
    /// - [`ConfigError::InvalidNumber`] for a malformed port, dim or timeout
    /// - [`ConfigError::InvalidFormat`] if `OLLAMA_URL` has no http(s) scheme
    pub fn from_env() -> Result<Self, EmbeddingError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as [`EmbeddingConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EmbeddingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = resolve_endpoint(lookup("OLLAMA_URL"), lookup("OLLAMA_PORT"))?;
        let model = must_var(&lookup, "EMBEDDING_MODEL")?;
        let dim = opt_number::<_, usize>(&lookup, "EMBEDDING_DIM", "expected positive integer")?;
        if dim == Some(0) {
            return Err(ConfigError::InvalidNumber {
                var: "EMBEDDING_DIM",
                reason: "must be > 0",
            }
            .into());
        }
        let timeout_secs = opt_number::<_, u64>(&lookup, "EMBEDDING_TIMEOUT_SECS", "expected u64")?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            endpoint,
            model,
            dim,
            timeout_secs,
        })
    }
}

/// Resolves the Ollama endpoint.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
pub fn resolve_endpoint(
    url: Option<String>,
    port: Option<String>,
) -> Result<String, EmbeddingError> {
    if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
        let url = url.trim().trim_end_matches('/').to_string();
        validate_http_endpoint("OLLAMA_URL", &url)?;
        return Ok(url);
    }
    if let Some(port) = port.filter(|p| !p.trim().is_empty()) {
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok(format!("http://localhost:{port}"));
    }
    Err(ConfigError::MissingVar("OLLAMA_URL or OLLAMA_PORT").into())
}
