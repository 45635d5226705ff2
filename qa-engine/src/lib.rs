//! Matching and dialogue engine for a teachable question-answering bot.
//!
//! The crate decides, for every incoming utterance, whether it is a fresh
//! question, the continuation of a pending teach/correct/clarify exchange, and
//! which knowledge-base entry (if any) answers it. It provides:
//! - [`normalize`]: canonical knowledge-base keys
//! - [`Matcher`]: lexical + semantic ranking of known questions
//! - [`dialogue`]: the per-session state machine
//! - [`KnowledgeStore`]: load/save of the question → answer mapping
//! - [`QaEngine`]: the facade wiring all of the above per session
//!
//! The layout is flat; every module owns one concern.

mod config;
pub mod dialogue;
pub mod embed;
mod engine;
mod errors;
pub mod knowledge;
mod lexical;
mod matcher;
mod normalize;
mod policy;
mod reply;
mod session;

pub use config::EngineConfig;
pub use dialogue::{DialogueContext, DialogueMode, DialogueState, Exchange, Transition};
pub use embed::Embedder;
pub use engine::QaEngine;
pub use errors::{ConfigError, EngineError, StoreError};
pub use knowledge::{JsonFileStore, KnowledgeBase, KnowledgeStore, MemoryStore};
pub use lexical::{IndelRatio, LexicalScorer};
pub use matcher::{MatchCandidate, Matcher, Ranking, cosine_similarity};
pub use normalize::normalize;
pub use policy::{Decision, Thresholds, decide};
pub use reply::{BotReply, ReplyKind};
pub use session::{DEFAULT_SESSION, SessionRegistry};
