use serde::Deserialize;

/// Request payload for /teach_bot.
#[derive(Debug, Deserialize)]
pub struct TeachRequest {
    /// Question to store; normalized into the knowledge key.
    pub input: String,
    pub answer: String,
}
