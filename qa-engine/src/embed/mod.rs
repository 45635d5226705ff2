//! Embedding abstraction used by the semantic half of the matcher.

use std::{future::Future, pin::Pin};

use crate::errors::EngineError;

/// Asynchronous embedding provider.
///
/// Implement this trait to plug in any backend producing `embed(text) -> vector`.
/// Async is required because real providers perform HTTP requests.
pub trait Embedder: Send + Sync {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, EngineError>> + Send + 'a>>;
}

pub mod ollama;
