//! Per-session dialogue state machine.
//!
//! | State               | Input            | Reply           | Next                  |
//! |---------------------|------------------|-----------------|-----------------------|
//! | Idle                | question         | answer          | Idle (exchange kept)  |
//! | Idle                | question         | clarification   | Clarifying            |
//! | Idle                | question         | learning        | AwaitingAnswer        |
//! | Idle (exchange)     | `no`             | learning        | AwaitingCorrection    |
//! | Idle (no exchange)  | `no`             | error           | Idle                  |
//! | AwaitingAnswer      | anything         | success         | Idle                  |
//! | AwaitingCorrection  | anything         | success         | Idle                  |
//! | Clarifying          | `1` / `2`        | answer          | Idle (exchange kept)  |
//! | Clarifying          | `no`             | learning        | AwaitingCorrection    |
//! | Clarifying          | anything else    | (fresh question)|                       |
//!
//! [`advance`] is pure with respect to storage: it returns the reply, the
//! next state and, when the step mutates knowledge, the base to persist.
//! The caller commits the next state only after that write succeeded.

use serde::Serialize;
use tracing::debug;

use crate::{
    errors::EngineError,
    knowledge::{self, KnowledgeBase},
    matcher::Matcher,
    normalize::normalize,
    policy::{Decision, Thresholds, decide},
    reply::{self, BotReply},
};

/// Flat view of the active state, for logs and inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueMode {
    Idle,
    AwaitingAnswer,
    AwaitingCorrection,
    Clarifying,
}

/// Question the user asked and the known question that answered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exchange {
    pub original: String,
    pub matched: String,
}

/// Dialogue state. Each variant carries exactly the transient fields it needs,
/// so at most one pending exchange exists at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DialogueState {
    /// No pending exchange. `last` is the most recent answered exchange, the
    /// target of a following "no".
    Idle { last: Option<Exchange> },
    /// Waiting for the answer to an unknown question.
    AwaitingAnswer { question: String },
    /// Waiting for the corrected answer to store under `target`.
    AwaitingCorrection { original: String, target: String },
    /// Waiting for the user to pick option 1 or 2.
    Clarifying {
        original: String,
        options: [String; 2],
    },
}

impl Default for DialogueState {
    fn default() -> Self {
        DialogueState::Idle { last: None }
    }
}

impl DialogueState {
    pub fn mode(&self) -> DialogueMode {
        match self {
            DialogueState::Idle { .. } => DialogueMode::Idle,
            DialogueState::AwaitingAnswer { .. } => DialogueMode::AwaitingAnswer,
            DialogueState::AwaitingCorrection { .. } => DialogueMode::AwaitingCorrection,
            DialogueState::Clarifying { .. } => DialogueMode::Clarifying,
        }
    }
}

/// Conversation context of one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DialogueContext {
    state: DialogueState,
}

impl DialogueContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DialogueState {
        &self.state
    }

    pub fn mode(&self) -> DialogueMode {
        self.state.mode()
    }

    /// The question that opened the current exchange.
    pub fn original_question(&self) -> Option<&str> {
        match &self.state {
            DialogueState::Idle { last } => last.as_ref().map(|e| e.original.as_str()),
            DialogueState::AwaitingAnswer { question } => Some(question),
            DialogueState::AwaitingCorrection { original, .. }
            | DialogueState::Clarifying { original, .. } => Some(original),
        }
    }

    /// The known question that last produced an answer, if it is still addressable.
    pub fn last_matched_question(&self) -> Option<&str> {
        match &self.state {
            DialogueState::Idle { last } => last.as_ref().map(|e| e.matched.as_str()),
            DialogueState::AwaitingCorrection { target, .. } => Some(target),
            _ => None,
        }
    }

    pub fn suggested_questions(&self) -> &[String] {
        match &self.state {
            DialogueState::Clarifying { options, .. } => options,
            _ => &[],
        }
    }

    pub(crate) fn commit(&mut self, next: DialogueState) {
        self.state = next;
    }

    /// `true` when the context carries nothing worth keeping.
    pub fn is_blank(&self) -> bool {
        self.state == DialogueState::default()
    }
}

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub reply: BotReply,
    pub next: DialogueState,
    /// Updated knowledge base to persist before committing `next`.
    pub write: Option<KnowledgeBase>,
}

impl Transition {
    fn reply(reply: BotReply, next: DialogueState) -> Self {
        Self {
            reply,
            next,
            write: None,
        }
    }

    fn write(reply: BotReply, next: DialogueState, kb: KnowledgeBase) -> Self {
        Self {
            reply,
            next,
            write: Some(kb),
        }
    }
}

const NO: &str = "no";

/// Maps `"1"`/`"2"` to an option index.
fn choice(normalized: &str) -> Option<usize> {
    match normalized {
        "1" => Some(0),
        "2" => Some(1),
        _ => None,
    }
}

/// Computes the reply and next state for one trimmed, non-empty `input`.
///
/// # Errors
/// Only matcher failures (embedding backend) are propagated.
pub async fn advance(
    ctx: &DialogueContext,
    input: &str,
    mut kb: KnowledgeBase,
    matcher: &Matcher,
    thresholds: &Thresholds,
) -> Result<Transition, EngineError> {
    let normalized = normalize(input);

    // Only pending teach/correct steps accept free text that normalizes to nothing.
    let takes_raw_answer = matches!(
        ctx.state(),
        DialogueState::AwaitingAnswer { .. } | DialogueState::AwaitingCorrection { .. }
    );
    if normalized.is_empty() && !takes_raw_answer {
        debug!(mode = ?ctx.mode(), "dialogue::advance: empty question");
        return Ok(Transition::reply(
            BotReply::error(reply::EMPTY_INPUT),
            ctx.state.clone(),
        ));
    }

    let transition = match ctx.state() {
        DialogueState::AwaitingAnswer { question } => {
            kb.insert(question.clone(), input.to_string());
            Transition::write(
                BotReply::success(reply::LEARNED),
                DialogueState::default(),
                kb,
            )
        }

        DialogueState::AwaitingCorrection { target, .. } => {
            kb.insert(target.clone(), input.to_string());
            Transition::write(
                BotReply::success(reply::CORRECTED),
                DialogueState::default(),
                kb,
            )
        }

        DialogueState::Clarifying { original, options } => match choice(&normalized) {
            Some(i) => resolve_choice(original, &options[i], kb),
            None if normalized == NO => Transition::reply(
                BotReply::learning(reply::NO_OPTION_FITS),
                DialogueState::AwaitingCorrection {
                    original: original.clone(),
                    target: original.clone(),
                },
            ),
            None => fresh_question(normalized, kb, matcher, thresholds).await?,
        },

        DialogueState::Idle { last } if normalized == NO => match last {
            Some(exchange) => Transition::reply(
                BotReply::learning(reply::ASK_CORRECTION),
                DialogueState::AwaitingCorrection {
                    original: exchange.original.clone(),
                    target: exchange.matched.clone(),
                },
            ),
            None => Transition::reply(BotReply::error(reply::NOTHING_TO_REJECT), ctx.state.clone()),
        },

        DialogueState::Idle { .. } => fresh_question(normalized, kb, matcher, thresholds).await?,
    };

    debug!(
        from = ?ctx.mode(),
        to = ?transition.next.mode(),
        reply = ?transition.reply.kind,
        writes = transition.write.is_some(),
        "dialogue::advance"
    );

    Ok(transition)
}

/// Resolves a clarification pick, aliasing the original question to the
/// chosen answer when they differ.
fn resolve_choice(original: &str, chosen: &str, mut kb: KnowledgeBase) -> Transition {
    let Some(answer) = kb.get(chosen).cloned() else {
        return Transition::reply(BotReply::error(reply::OPTION_GONE), DialogueState::default());
    };

    let next = DialogueState::Idle {
        last: Some(Exchange {
            original: original.to_string(),
            matched: chosen.to_string(),
        }),
    };

    if original == chosen {
        return Transition::reply(BotReply::answer(answer), next);
    }

    knowledge::alias(&mut kb, original, chosen);
    Transition::write(BotReply::answer(answer), next, kb)
}

async fn fresh_question(
    query: String,
    kb: KnowledgeBase,
    matcher: &Matcher,
    thresholds: &Thresholds,
) -> Result<Transition, EngineError> {
    let ranking = matcher.rank(&kb, &query).await?;

    let transition = match decide(&ranking, thresholds) {
        Decision::Answer(candidate) => match kb.get(&candidate.question) {
            Some(answer) => Transition::reply(
                BotReply::answer(answer.clone()),
                DialogueState::Idle {
                    last: Some(Exchange {
                        original: query,
                        matched: candidate.question,
                    }),
                },
            ),
            None => unknown(query),
        },
        Decision::Clarify([first, second]) => Transition::reply(
            BotReply::clarification(&first.question, &second.question),
            DialogueState::Clarifying {
                original: query,
                options: [first.question, second.question],
            },
        ),
        Decision::Unknown => unknown(query),
    };

    Ok(transition)
}

fn unknown(query: String) -> Transition {
    Transition::reply(
        BotReply::learning(reply::UNKNOWN_QUESTION),
        DialogueState::AwaitingAnswer { question: query },
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{lexical::LexicalScorer, reply::ReplyKind};

    /// Scores from a fixed table, 0 otherwise.
    struct Scripted(Vec<(&'static str, u8)>);

    impl LexicalScorer for Scripted {
        fn score(&self, _query: &str, key: &str) -> u8 {
            self.0
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, s)| *s)
                .unwrap_or(0)
        }
    }

    fn kb(pairs: &[(&str, &str)]) -> KnowledgeBase {
        pairs
            .iter()
            .map(|(q, a)| (q.to_string(), a.to_string()))
            .collect()
    }

    fn ctx(state: DialogueState) -> DialogueContext {
        DialogueContext { state }
    }

    async fn step(ctx: &DialogueContext, input: &str, base: KnowledgeBase) -> Transition {
        advance(ctx, input, base, &Matcher::lexical_only(), &Thresholds::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn empty_base_asks_to_be_taught() {
        let t = step(&DialogueContext::new(), "What is love?", KnowledgeBase::new()).await;
        assert_eq!(t.reply.kind, ReplyKind::Learning);
        assert_eq!(
            t.next,
            DialogueState::AwaitingAnswer {
                question: "what is love".into()
            }
        );
        assert!(t.write.is_none());
    }

    #[tokio::test]
    async fn strong_match_answers_and_remembers_exchange() {
        let base = kb(&[("what is your name", "Bot")]);
        let t = step(&DialogueContext::new(), "What is your name?", base).await;
        assert_eq!(t.reply, BotReply::answer("Bot"));
        assert_eq!(
            t.next,
            DialogueState::Idle {
                last: Some(Exchange {
                    original: "what is your name".into(),
                    matched: "what is your name".into(),
                })
            }
        );
    }

    #[tokio::test]
    async fn awaiting_answer_stores_raw_answer() {
        let c = ctx(DialogueState::AwaitingAnswer {
            question: "what is love".into(),
        });
        let t = step(&c, "Baby don't hurt me", KnowledgeBase::new()).await;
        assert_eq!(t.reply.kind, ReplyKind::Success);
        assert_eq!(t.next, DialogueState::default());
        assert_eq!(t.write.unwrap()["what is love"], "Baby don't hurt me");
    }

    #[tokio::test]
    async fn no_without_context_is_an_error_and_keeps_state() {
        let t = step(&DialogueContext::new(), "No!", KnowledgeBase::new()).await;
        assert_eq!(t.reply.kind, ReplyKind::Error);
        assert_eq!(t.next, DialogueState::default());
    }

    #[tokio::test]
    async fn no_after_answer_targets_matched_question() {
        let c = ctx(DialogueState::Idle {
            last: Some(Exchange {
                original: "whats your name".into(),
                matched: "what is your name".into(),
            }),
        });
        let t = step(&c, "no", kb(&[("what is your name", "Bot")])).await;
        assert_eq!(t.reply.kind, ReplyKind::Learning);
        assert_eq!(
            t.next,
            DialogueState::AwaitingCorrection {
                original: "whats your name".into(),
                target: "what is your name".into(),
            }
        );

        let t = step(&ctx(t.next), "Robo", kb(&[("what is your name", "Bot")])).await;
        assert_eq!(t.reply.kind, ReplyKind::Success);
        assert_eq!(t.write.unwrap()["what is your name"], "Robo");
        assert_eq!(t.next, DialogueState::default());
    }

    #[tokio::test]
    async fn ambiguous_match_then_pick_aliases_original() {
        let base = kb(&[("how old are you", "Two"), ("how are you", "Fine")]);
        let matcher = Matcher::new(
            Arc::new(Scripted(vec![("how old are you", 70), ("how are you", 65)])),
            None,
            1,
        );
        let t = advance(
            &DialogueContext::new(),
            "how you",
            base.clone(),
            &matcher,
            &Thresholds::default(),
        )
        .await
        .unwrap();
        assert_eq!(t.reply.kind, ReplyKind::Clarification);
        assert_eq!(t.reply.suggestions, vec!["how old are you", "how are you"]);

        let c = ctx(t.next);
        assert_eq!(c.mode(), DialogueMode::Clarifying);
        assert_eq!(c.suggested_questions(), ["how old are you", "how are you"]);

        let t = step(&c, "1", base).await;
        assert_eq!(t.reply, BotReply::answer("Two"));
        let written = t.write.unwrap();
        assert_eq!(written["how you"], "Two");
        assert_eq!(written.len(), 3);
        assert_eq!(ctx(t.next).last_matched_question(), Some("how old are you"));
    }

    #[tokio::test]
    async fn picking_the_original_itself_does_not_write() {
        let c = ctx(DialogueState::Clarifying {
            original: "a b".into(),
            options: ["x".into(), "a b".into()],
        });
        let t = step(&c, "2", kb(&[("x", "X"), ("a b", "AB")])).await;
        assert_eq!(t.reply, BotReply::answer("AB"));
        assert!(t.write.is_none());
    }

    #[tokio::test]
    async fn no_during_clarification_asks_for_correction_of_original() {
        let c = ctx(DialogueState::Clarifying {
            original: "how you".into(),
            options: ["how old are you".into(), "how are you".into()],
        });
        let t = step(&c, "no", KnowledgeBase::new()).await;
        assert_eq!(t.reply.kind, ReplyKind::Learning);
        assert_eq!(
            t.next,
            DialogueState::AwaitingCorrection {
                original: "how you".into(),
                target: "how you".into(),
            }
        );
    }

    #[tokio::test]
    async fn vanished_option_resets_with_error() {
        let c = ctx(DialogueState::Clarifying {
            original: "q".into(),
            options: ["gone".into(), "also gone".into()],
        });
        let t = step(&c, "1", KnowledgeBase::new()).await;
        assert_eq!(t.reply.kind, ReplyKind::Error);
        assert_eq!(t.next, DialogueState::default());
    }

    #[tokio::test]
    async fn other_input_during_clarification_is_a_fresh_question() {
        let c = ctx(DialogueState::Clarifying {
            original: "q".into(),
            options: ["a".into(), "b".into()],
        });
        let t = step(&c, "what is your name", kb(&[("what is your name", "Bot")])).await;
        assert_eq!(t.reply, BotReply::answer("Bot"));
        assert_eq!(ctx(t.next).mode(), DialogueMode::Idle);
    }

    #[tokio::test]
    async fn punctuation_only_question_keeps_last_exchange() {
        let idle = DialogueState::Idle {
            last: Some(Exchange {
                original: "what is your name".into(),
                matched: "what is your name".into(),
            }),
        };
        let t = step(&ctx(idle.clone()), "???", kb(&[("what is your name", "Bot")])).await;
        assert_eq!(t.reply, BotReply::error(reply::EMPTY_INPUT));
        assert_eq!(t.next, idle);
        assert!(t.write.is_none());

        // "no" still addresses the answered question afterwards.
        let t = step(&ctx(t.next), "no", kb(&[("what is your name", "Bot")])).await;
        assert_eq!(t.reply.kind, ReplyKind::Learning);
    }

    #[tokio::test]
    async fn punctuation_only_input_keeps_clarification_open() {
        let clarifying = DialogueState::Clarifying {
            original: "q".into(),
            options: ["a".into(), "b".into()],
        };
        let t = step(&ctx(clarifying.clone()), "?!", kb(&[("a", "A"), ("b", "B")])).await;
        assert_eq!(t.reply.kind, ReplyKind::Error);
        assert_eq!(t.next, clarifying);

        let t = step(&ctx(t.next), "2", kb(&[("a", "A"), ("b", "B")])).await;
        assert_eq!(t.reply, BotReply::answer("B"));
    }

    #[tokio::test]
    async fn punctuation_only_answer_is_still_stored() {
        let c = ctx(DialogueState::AwaitingAnswer {
            question: "favourite emoticon".into(),
        });
        let t = step(&c, ":-)", KnowledgeBase::new()).await;
        assert_eq!(t.reply.kind, ReplyKind::Success);
        assert_eq!(t.write.unwrap()["favourite emoticon"], ":-)");
    }

    #[test]
    fn accessors_follow_state() {
        let c = ctx(DialogueState::AwaitingCorrection {
            original: "o".into(),
            target: "t".into(),
        });
        assert_eq!(c.mode(), DialogueMode::AwaitingCorrection);
        assert_eq!(c.original_question(), Some("o"));
        assert_eq!(c.last_matched_question(), Some("t"));
        assert!(c.suggested_questions().is_empty());

        let mut c = ctx(DialogueState::AwaitingAnswer {
            question: "q".into(),
        });
        assert_eq!(c.original_question(), Some("q"));
        assert_eq!(c.last_matched_question(), None);
        assert!(!c.is_blank());
        c.commit(DialogueState::default());
        assert!(c.is_blank());
    }
}
