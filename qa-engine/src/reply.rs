//! Tagged replies returned for every utterance, and their fixed messages.

use serde::{Deserialize, Serialize};

/// Tag of a bot reply, serialized as the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyKind {
    Answer,
    Learning,
    Clarification,
    Success,
    Error,
}

/// Tagged response returned for every utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotReply {
    #[serde(rename = "type")]
    pub kind: ReplyKind,
    pub response: String,
    /// Ordered options of a `clarification`; also spelled out in `response`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

pub(crate) const EMPTY_INPUT: &str = "Please enter a message.";
pub(crate) const UNKNOWN_QUESTION: &str = "I don't know the answer to that. Can you teach me?";
pub(crate) const LEARNED: &str = "Thank you! I've learned something new.";
pub(crate) const ASK_CORRECTION: &str = "Sorry about that! What should the answer be?";
pub(crate) const NO_OPTION_FITS: &str =
    "Sorry I couldn't find it. Can you teach me the answer to your question?";
pub(crate) const CORRECTED: &str = "Thanks for the correction! I've updated my answer.";
pub(crate) const NOTHING_TO_REJECT: &str = "I'm not sure what you're saying no to.";
pub(crate) const OPTION_GONE: &str = "That option is no longer available. Please ask again.";
pub(crate) const INTERNAL_ERROR: &str = "Something went wrong. Please try again.";

impl BotReply {
    fn new(kind: ReplyKind, response: impl Into<String>) -> Self {
        Self {
            kind,
            response: response.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn answer(response: impl Into<String>) -> Self {
        Self::new(ReplyKind::Answer, response)
    }

    pub fn learning(response: impl Into<String>) -> Self {
        Self::new(ReplyKind::Learning, response)
    }

    pub fn success(response: impl Into<String>) -> Self {
        Self::new(ReplyKind::Success, response)
    }

    pub fn error(response: impl Into<String>) -> Self {
        Self::new(ReplyKind::Error, response)
    }

    /// Clarification listing `first` and `second` as options 1 and 2.
    pub fn clarification(first: &str, second: &str) -> Self {
        Self {
            kind: ReplyKind::Clarification,
            response: format!(
                "I'm not sure which one you mean. Did you mean:\n1. {first}\n2. {second}\nReply with 1 or 2, or 'no' if neither."
            ),
            suggestions: vec![first.to_string(), second.to_string()],
        }
    }
}
