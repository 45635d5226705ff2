//! Decision policy applied to a [`Ranking`] for a fresh question.
//!
//! Order of precedence:
//! 1. no candidates → [`Decision::Unknown`]
//! 2. top lexical score ≥ `fuzzy` → answer with the top lexical key
//! 3. best semantic score ≥ `semantic` → answer with that key
//! 4. two lexical candidates closer than `ambiguity_gap` → clarification
//! 5. otherwise → [`Decision::Unknown`]
//!
//! When both signals are strong but disagree, the lexical key wins.

use serde::{Deserialize, Serialize};

use crate::matcher::{MatchCandidate, Ranking};

/// Published matching thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Lexical score at or above which a match is strong (`0..=100`).
    pub fuzzy: u8,
    /// Cosine similarity at or above which a match is strong (`0.0..=1.0`).
    pub semantic: f32,
    /// Top-2 lexical scores closer than this are ambiguous.
    pub ambiguity_gap: u8,
}

impl Thresholds {
    pub const FUZZY_THRESHOLD: u8 = 90;
    pub const SEMANTIC_THRESHOLD: f32 = 0.7;
    pub const AMBIGUITY_GAP: u8 = 10;
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            fuzzy: Self::FUZZY_THRESHOLD,
            semantic: Self::SEMANTIC_THRESHOLD,
            ambiguity_gap: Self::AMBIGUITY_GAP,
        }
    }
}

/// What the dialogue should do with a fresh question.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Answer with the stored answer of this candidate.
    Answer(MatchCandidate),
    /// Ask the user to pick between two candidates, best first.
    Clarify([MatchCandidate; 2]),
    /// Nothing qualifies; ask to be taught.
    Unknown,
}

pub fn decide(ranking: &Ranking, t: &Thresholds) -> Decision {
    let top = match ranking.candidates.first() {
        Some(top) => top,
        None => return Decision::Unknown,
    };

    if top.lexical_score >= t.fuzzy {
        return Decision::Answer(top.clone());
    }

    if let Some(best) = &ranking.semantic_best {
        if best.semantic_score >= t.semantic {
            return Decision::Answer(best.clone());
        }
    }

    if let [first, second] = ranking.candidates.as_slice() {
        if first.lexical_score.saturating_sub(second.lexical_score) < t.ambiguity_gap {
            return Decision::Clarify([first.clone(), second.clone()]);
        }
    }

    Decision::Unknown
}
