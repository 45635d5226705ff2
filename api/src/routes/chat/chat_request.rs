use serde::Deserialize;

/// Request payload for /get_response.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// One user utterance.
    pub input: String,
    /// Conversation id; requests without one share the default session.
    #[serde(default)]
    pub session_id: Option<String>,
}
