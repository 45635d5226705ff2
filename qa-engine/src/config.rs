//! Runtime configuration loaded from environment variables.

use std::{path::PathBuf, time::Duration};

use crate::{errors::ConfigError, policy::Thresholds};

/// Config bag for the engine. All fields have defaults via [`EngineConfig::from_env`].
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Path of the JSON knowledge file.
    pub knowledge_file: PathBuf,
    pub thresholds: Thresholds,
    /// When `false`, no embedder is built and semantic scores stay at 0.
    pub semantic_matching: bool,
    /// Parallel embedding requests per query.
    pub embedding_concurrency: usize,
    /// Sessions untouched this long are evicted by the server's sweeper.
    pub session_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            knowledge_file: PathBuf::from("knowledge_base.json"),
            thresholds: Thresholds::default(),
            semantic_matching: true,
            embedding_concurrency: 4,
            session_ttl: Duration::from_secs(1800),
        }
    }
}

impl EngineConfig {
    /// Reads `KNOWLEDGE_FILE`, `FUZZY_THRESHOLD`, `SEMANTIC_THRESHOLD`,
    /// `AMBIGUITY_GAP`, `SEMANTIC_MATCHING`, `EMBEDDING_CONCURRENCY` and
    /// `SESSION_TTL_SECS`.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when a variable is set but malformed or out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as [`EngineConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());
        let dflt = Self::default();

        let knowledge_file = get("KNOWLEDGE_FILE")
            .map(PathBuf::from)
            .unwrap_or(dflt.knowledge_file);

        let fuzzy = parse(&get, "FUZZY_THRESHOLD", "expected integer 0..=100")?
            .unwrap_or(dflt.thresholds.fuzzy);
        let semantic: f32 = parse(&get, "SEMANTIC_THRESHOLD", "expected number")?
            .unwrap_or(dflt.thresholds.semantic);
        let ambiguity_gap = parse(&get, "AMBIGUITY_GAP", "expected integer 0..=100")?
            .unwrap_or(dflt.thresholds.ambiguity_gap);

        if fuzzy > 100 {
            return Err(ConfigError::OutOfRange {
                var: "FUZZY_THRESHOLD",
                detail: "expected 0..=100",
            });
        }
        if ambiguity_gap > 100 {
            return Err(ConfigError::OutOfRange {
                var: "AMBIGUITY_GAP",
                detail: "expected 0..=100",
            });
        }
        if !(semantic.is_finite() && (0.0..=1.0).contains(&semantic)) {
            return Err(ConfigError::OutOfRange {
                var: "SEMANTIC_THRESHOLD",
                detail: "expected 0.0..=1.0",
            });
        }

        let semantic_matching = match get("SEMANTIC_MATCHING") {
            None => dflt.semantic_matching,
            Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidFlag {
                        var: "SEMANTIC_MATCHING",
                    });
                }
            },
        };

        let embedding_concurrency: usize =
            parse(&get, "EMBEDDING_CONCURRENCY", "expected positive integer")?
                .unwrap_or(dflt.embedding_concurrency);
        if embedding_concurrency == 0 {
            return Err(ConfigError::OutOfRange {
                var: "EMBEDDING_CONCURRENCY",
                detail: "must be > 0",
            });
        }

        let session_ttl_secs: u64 = parse(&get, "SESSION_TTL_SECS", "expected whole seconds")?
            .unwrap_or(dflt.session_ttl.as_secs());
        if session_ttl_secs == 0 {
            return Err(ConfigError::OutOfRange {
                var: "SESSION_TTL_SECS",
                detail: "must be > 0",
            });
        }

        Ok(Self {
            knowledge_file,
            thresholds: Thresholds {
                fuzzy,
                semantic,
                ambiguity_gap,
            },
            semantic_matching,
            embedding_concurrency,
            session_ttl: Duration::from_secs(session_ttl_secs),
        })
    }
}

fn parse<T, G>(get: &G, var: &'static str, reason: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    get(var)
        .map(|v| v.trim().parse::<T>())
        .transpose()
        .map_err(|_| ConfigError::InvalidNumber { var, reason })
}
