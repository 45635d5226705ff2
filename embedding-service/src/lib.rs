//! Embedding backend for semantic question matching.
//!
//! - [`EmbeddingConfig`]: endpoint/model/dimension loaded from environment
//! - [`OllamaEmbeddings`]: `embed(text) -> Vec<f32>` over `POST /api/embeddings`
//! - [`EmbeddingHealth`]: JSON-serializable probe result for `/health`
//!
//! Construct the client once, wrap in `Arc`, and share it.

pub mod config;
pub mod error_handler;
pub mod health;
pub mod ollama;

pub use config::EmbeddingConfig;
pub use error_handler::{ConfigError, EmbeddingError};
pub use health::EmbeddingHealth;
pub use ollama::OllamaEmbeddings;
