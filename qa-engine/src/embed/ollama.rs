//! [`Embedder`] backed by the shared Ollama embedding client.

use std::{future::Future, pin::Pin, sync::Arc};

use embedding_service::OllamaEmbeddings;

use crate::{embed::Embedder, errors::EngineError};

#[derive(Clone)]
pub struct OllamaEmbedder {
    svc: Arc<OllamaEmbeddings>,
}

impl OllamaEmbedder {
    pub fn new(svc: Arc<OllamaEmbeddings>) -> Self {
        Self { svc }
    }
}

impl Embedder for OllamaEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, EngineError>> + Send + 'a>> {
        Box::pin(async move { Ok(self.svc.embed(text).await?) })
    }
}
