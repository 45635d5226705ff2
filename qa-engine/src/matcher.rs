//! Candidate ranking over the knowledge base.
//!
//! Every known question is scored twice:
//! - lexically, via a [`LexicalScorer`] (`0..=100`)
//! - semantically, via cosine similarity of embeddings (`0.0..=1.0`)
//!
//! The matcher only ranks. Deciding between answer, clarification and
//! "teach me" is the job of [`crate::policy::decide`].

use std::{collections::HashMap, sync::Arc};

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, trace};

use crate::{
    embed::Embedder,
    errors::EngineError,
    knowledge::KnowledgeBase,
    lexical::{IndelRatio, LexicalScorer},
};

/// One known question scored against the query. Produced fresh per query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCandidate {
    pub question: String,
    pub lexical_score: u8,
    pub semantic_score: f32,
}

/// Result of ranking a query against the knowledge base.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    /// Top two known questions by lexical score, best first.
    pub candidates: Vec<MatchCandidate>,
    /// Single best semantic match; `None` without an embedder or on an empty base.
    pub semantic_best: Option<MatchCandidate>,
}

/// Lexical + semantic ranker.
#[derive(Clone)]
pub struct Matcher {
    scorer: Arc<dyn LexicalScorer>,
    embedder: Option<Arc<dyn Embedder>>,
    concurrency: usize,
}

impl Matcher {
    /// Maximum number of lexical candidates returned.
    pub const TOP_K: usize = 2;

    pub fn new(
        scorer: Arc<dyn LexicalScorer>,
        embedder: Option<Arc<dyn Embedder>>,
        concurrency: usize,
    ) -> Self {
        Self {
            scorer,
            embedder,
            concurrency: concurrency.max(1),
        }
    }

    /// Lexical-only matcher using [`IndelRatio`]; semantic scores stay at 0.
    pub fn lexical_only() -> Self {
        Self::new(Arc::new(IndelRatio), None, 1)
    }

    pub fn has_embedder(&self) -> bool {
        self.embedder.is_some()
    }

    /// Ranks every key of `kb` against the normalized `query`.
    ///
    /// An empty knowledge base yields an empty [`Ranking`] without touching
    /// the embedder.
    ///
    /// # Errors
    /// Returns [`EngineError::Embedding`] if the embedder fails on the query
    /// or on any key.
    pub async fn rank(&self, kb: &KnowledgeBase, query: &str) -> Result<Ranking, EngineError> {
        if kb.is_empty() {
            trace!("Matcher::rank: empty knowledge base");
            return Ok(Ranking::default());
        }

        let semantic = match &self.embedder {
            Some(embedder) => Some(self.semantic_scores(embedder.as_ref(), kb, query).await?),
            None => None,
        };

        let mut scored: Vec<MatchCandidate> = kb
            .keys()
            .map(|key| MatchCandidate {
                question: key.clone(),
                lexical_score: self.scorer.score(query, key),
                semantic_score: semantic
                    .as_ref()
                    .and_then(|s| s.get(key.as_str()).copied())
                    .unwrap_or(0.0),
            })
            .collect();

        // First maximum in key order wins on equal similarity.
        let semantic_best = semantic.as_ref().and_then(|_| {
            scored.iter().fold(None::<&MatchCandidate>, |best, c| match best {
                Some(b) if b.semantic_score >= c.semantic_score => Some(b),
                _ => Some(c),
            })
        });
        let semantic_best = semantic_best.cloned();

        scored.sort_by(|a, b| {
            b.lexical_score
                .cmp(&a.lexical_score)
                .then_with(|| b.semantic_score.total_cmp(&a.semantic_score))
                .then_with(|| a.question.cmp(&b.question))
        });
        scored.truncate(Self::TOP_K);

        debug!(
            query = %query,
            top = ?scored.first().map(|c| (&c.question, c.lexical_score)),
            semantic_best = ?semantic_best.as_ref().map(|c| (&c.question, c.semantic_score)),
            "Matcher::rank: done"
        );

        Ok(Ranking {
            candidates: scored,
            semantic_best,
        })
    }

    /// Embeds the query and every key (bounded concurrency) and returns the
    /// cosine similarity per key.
    async fn semantic_scores<'k>(
        &self,
        embedder: &dyn Embedder,
        kb: &'k KnowledgeBase,
        query: &str,
    ) -> Result<HashMap<&'k str, f32>, EngineError> {
        let query_vec = embedder.embed(query).await?;
        let query_vec = query_vec.as_slice();

        let scores: std::pin::Pin<
            Box<dyn futures::Stream<Item = Result<(&'k str, f32), EngineError>> + Send + '_>,
        > = stream::iter(kb.keys())
            .map(move |key| async move {
                let v = embedder.embed(key).await?;
                Ok::<_, EngineError>((key.as_str(), cosine_similarity(query_vec, &v)))
            })
            .buffered(self.concurrency)
            .boxed();
        scores
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect()
    }
}

/// Cosine similarity clamped into `[0, 1]`.
///
/// Zero vectors and negative correlation both score `0.0`. Vectors of
/// different length are compared over their common prefix.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut na, mut nb) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    (dot / (na.sqrt() * nb.sqrt())).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use std::{future::Future, pin::Pin};

    use super::*;

    /// Embeds a text as letter-frequency over `a..=e`, enough to make
    /// semantic neighbours predictable.
    struct LetterEmbedder;

    impl Embedder for LetterEmbedder {
        fn embed<'a>(
            &'a self,
            text: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, EngineError>> + Send + 'a>> {
            Box::pin(async move {
                let mut v = vec![0.0f32; 5];
                for c in text.chars() {
                    if ('a'..='e').contains(&c) {
                        v[(c as u8 - b'a') as usize] += 1.0;
                    }
                }
                Ok(v)
            })
        }
    }

    struct FailingEmbedder;

    impl Embedder for FailingEmbedder {
        fn embed<'a>(
            &'a self,
            _text: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, EngineError>> + Send + 'a>> {
            Box::pin(async { Err(EngineError::Embedding("backend down".into())) })
        }
    }

    fn kb(pairs: &[(&str, &str)]) -> KnowledgeBase {
        pairs
            .iter()
            .map(|(q, a)| (q.to_string(), a.to_string()))
            .collect()
    }

    #[test]
    fn cosine_bounds() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]), 1.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn empty_knowledge_base_yields_no_candidates() {
        let matcher = Matcher::new(Arc::new(IndelRatio), Some(Arc::new(FailingEmbedder)), 2);
        let ranking = matcher.rank(&KnowledgeBase::new(), "anything").await.unwrap();
        assert_eq!(ranking, Ranking::default());
    }

    #[tokio::test]
    async fn returns_top_two_by_lexical_score() {
        let base = kb(&[
            ("what is your name", "Bot"),
            ("what is your age", "2"),
            ("where do you live", "Here"),
        ]);
        let ranking = Matcher::lexical_only()
            .rank(&base, "what is your name")
            .await
            .unwrap();

        assert_eq!(ranking.candidates.len(), 2);
        assert_eq!(ranking.candidates[0].question, "what is your name");
        assert_eq!(ranking.candidates[0].lexical_score, 100);
        assert_eq!(ranking.candidates[1].question, "what is your age");
        assert!(ranking.candidates[0].lexical_score >= ranking.candidates[1].lexical_score);
        assert!(ranking.semantic_best.is_none());
    }

    #[tokio::test]
    async fn single_entry_gives_single_candidate() {
        let base = kb(&[("hello", "hi")]);
        let ranking = Matcher::lexical_only().rank(&base, "hello").await.unwrap();
        assert_eq!(ranking.candidates.len(), 1);
    }

    #[tokio::test]
    async fn semantic_best_uses_embeddings() {
        let base = kb(&[("aaa", "x"), ("bbb", "y"), ("ccc", "z")]);
        let matcher = Matcher::new(Arc::new(IndelRatio), Some(Arc::new(LetterEmbedder)), 3);

        let ranking = matcher.rank(&base, "ab b").await.unwrap();
        let best = ranking.semantic_best.expect("semantic candidate");
        assert_eq!(best.question, "bbb");
        assert!(best.semantic_score > 0.8);

        // Candidates carry their semantic score as well.
        let ccc = ranking.candidates.iter().find(|c| c.question == "ccc");
        if let Some(c) = ccc {
            assert_eq!(c.semantic_score, 0.0);
        }
    }

    #[tokio::test]
    async fn embedding_failure_is_reported() {
        let base = kb(&[("hello", "hi")]);
        let matcher = Matcher::new(Arc::new(IndelRatio), Some(Arc::new(FailingEmbedder)), 1);
        let err = matcher.rank(&base, "hello").await.unwrap_err();
        assert!(matches!(err, EngineError::Embedding(_)));
    }
}
