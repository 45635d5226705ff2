//! Health probe for the embedding backend.
//!
//! `GET {endpoint}/api/tags` and a best-effort check that the configured
//! model is listed. [`OllamaEmbeddings::health`] never fails: any error is
//! mapped to `ok = false`, which suits a `/health` endpoint.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    error_handler::{EmbeddingError, Result, make_snippet},
    ollama::OllamaEmbeddings,
};

/// A serializable health snapshot of the embedding backend.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EmbeddingHealth {
    pub endpoint: String,
    pub model: String,
    /// Server reachable and model listed.
    pub ok: bool,
    /// Measured HTTP latency in milliseconds.
    pub latency_ms: u128,
    pub message: String,
}

#[derive(Deserialize)]
struct Tag {
    name: String,
}

#[derive(Deserialize)]
struct Tags {
    models: Option<Vec<Tag>>,
}

impl OllamaEmbeddings {
    /// Probes the backend. Resilient: returns `ok = false` instead of an error.
    pub async fn health(&self) -> EmbeddingHealth {
        let start = Instant::now();
        let result = self.try_probe().await;
        let latency_ms = start.elapsed().as_millis();

        let (ok, message) = match result {
            Ok((ok, message)) => (ok, message),
            Err(err) => (false, err.to_string()),
        };

        let status = EmbeddingHealth {
            endpoint: self.cfg.endpoint.clone(),
            model: self.cfg.model.clone(),
            ok,
            latency_ms,
            message,
        };
        if status.ok {
            info!(endpoint = %status.endpoint, model = %status.model, latency_ms, "health probe completed");
        } else {
            warn!(endpoint = %status.endpoint, model = %status.model, latency_ms, message = %status.message, "health probe failed");
        }
        status
    }

    async fn try_probe(&self) -> Result<(bool, String)> {
        let url = format!("{}/api/tags", self.cfg.endpoint.trim_end_matches('/'));
        let resp = self.client.get(&url).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(EmbeddingError::HttpStatus {
                status,
                url,
                snippet: make_snippet(&text),
            });
        }

        match resp.json::<Tags>().await {
            Ok(Tags {
                models: Some(models),
            }) => {
                let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
                if model_listed(&names, &self.cfg.model) {
                    Ok((true, "Ollama is healthy; model is available".into()))
                } else {
                    Ok((false, "Ollama is up, but model not found in /api/tags".into()))
                }
            }
            Ok(Tags { models: None }) => Ok((
                true,
                "Ollama is healthy; tags response without `models` field".into(),
            )),
            Err(e) => Ok((
                true,
                format!("Ollama is reachable; failed to decode /api/tags: {e}"),
            )),
        }
    }
}

/// `nomic-embed-text` matches `nomic-embed-text:latest`.
fn model_listed(names: &[&str], model: &str) -> bool {
    names.iter().any(|n| {
        *n == model
            || n.strip_prefix(model)
                .is_some_and(|rest| rest.starts_with(':'))
    })
}
