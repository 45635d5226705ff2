//! Thin client for the Ollama embeddings API.
//!
//! - `POST {endpoint}/api/embeddings` with `{ model, prompt }`
//! - response `{ embedding: number[] }`
//!
//! # Examples
//!
//! ```no_run
//! use embedding_service::{EmbeddingConfig, OllamaEmbeddings};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let svc = OllamaEmbeddings::new(EmbeddingConfig::from_env()?)?;
//! let vec = svc.embed("what is your name").await?;
//! println!("dimension = {}", vec.len());
//! # Ok(()) }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::{
    config::EmbeddingConfig,
    error_handler::{EmbeddingError, Result, make_snippet, validate_http_endpoint},
};

/// Embedding client bound to one model. Reuses a single HTTP client.
pub struct OllamaEmbeddings {
    pub(crate) client: reqwest::Client,
    pub(crate) cfg: EmbeddingConfig,
    url_embeddings: String,
}

impl OllamaEmbeddings {
    /// Creates a new client from the given config.
    ///
    /// # Errors
    /// - [`crate::ConfigError::InvalidFormat`] if `cfg.endpoint` is invalid
    /// - [`EmbeddingError::Transport`] if the HTTP client cannot be built
    pub fn new(cfg: EmbeddingConfig) -> Result<Self> {
        validate_http_endpoint("OLLAMA_URL", cfg.endpoint.trim())?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()?;

        let base = cfg.endpoint.trim().trim_end_matches('/');
        let url_embeddings = format!("{base}/api/embeddings");

        Ok(Self {
            client,
            cfg,
            url_embeddings,
        })
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.cfg
    }

    /// Retrieves the embedding vector for `text`.
    ///
    /// # Errors
    /// - [`EmbeddingError::HttpStatus`] for non-2xx responses
    /// - [`EmbeddingError::Transport`] for client errors
    /// - [`EmbeddingError::Decode`] if the response cannot be parsed or is empty
    /// - [`EmbeddingError::DimensionMismatch`] if `cfg.dim` is set and differs
    #[instrument(skip_all, fields(model = %self.cfg.model, chars = text.len()))]
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            prompt: text,
        };

        debug!("POST {}", self.url_embeddings);
        let resp = self
            .client
            .post(&self.url_embeddings)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_embeddings.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);
            error!(%url, %status, %snippet, "embedding request failed");
            return Err(EmbeddingError::HttpStatus {
                status,
                url,
                snippet,
            });
        }

        let out: EmbeddingsResponse = resp.json().await.map_err(|e| {
            EmbeddingError::Decode(format!(
                "serde error: {e}; expected `{{ embedding: number[] }}`"
            ))
        })?;

        check_vector(out.embedding, self.cfg.dim)
    }
}

/// Rejects empty vectors and, when `want` is set, vectors of another size.
fn check_vector(v: Vec<f32>, want: Option<usize>) -> Result<Vec<f32>> {
    if v.is_empty() {
        return Err(EmbeddingError::Decode("empty embedding".into()));
    }
    match want {
        Some(want) if v.len() != want => Err(EmbeddingError::DimensionMismatch {
            got: v.len(),
            want,
        }),
        _ => Ok(v),
    }
}

/* ==========================
HTTP payloads
========================== */

/// Request body for `/api/embeddings`.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response body for `/api/embeddings`.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(endpoint: &str) -> EmbeddingConfig {
        EmbeddingConfig {
            endpoint: endpoint.into(),
            model: "nomic-embed-text".into(),
            dim: None,
            timeout_secs: 5,
        }
    }

    #[test]
    fn builds_url_without_double_slash() {
        let svc = OllamaEmbeddings::new(cfg("http://localhost:11434/")).unwrap();
        assert_eq!(svc.url_embeddings, "http://localhost:11434/api/embeddings");
    }

    #[test]
    fn rejects_endpoint_without_scheme() {
        assert!(OllamaEmbeddings::new(cfg("localhost:11434")).is_err());
    }

    #[test]
    fn request_uses_prompt_field() {
        let body = EmbeddingsRequest {
            model: "m",
            prompt: "hi",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "model": "m", "prompt": "hi" })
        );
    }

    #[test]
    fn vector_checks() {
        assert_eq!(check_vector(vec![0.1, 0.2], Some(2)).unwrap(), vec![0.1, 0.2]);
        assert_eq!(check_vector(vec![0.1], None).unwrap(), vec![0.1]);
        assert!(matches!(
            check_vector(vec![0.1, 0.2, 0.3], Some(2)),
            Err(EmbeddingError::DimensionMismatch { got: 3, want: 2 })
        ));
        assert!(matches!(check_vector(vec![], None), Err(EmbeddingError::Decode(_))));
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        // Port 9 (discard) is not expected to run an HTTP server.
        let svc = OllamaEmbeddings::new(cfg("http://127.0.0.1:9")).unwrap();
        assert!(matches!(
            svc.embed("hello").await,
            Err(EmbeddingError::Transport(_))
        ));
    }
}
