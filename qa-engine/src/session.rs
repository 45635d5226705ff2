//! Dialogue contexts keyed by session identifier.
//!
//! Utterances of one session are serialized through its own mutex; distinct
//! sessions proceed concurrently. Callers without a session id share
//! [`DEFAULT_SESSION`], which reproduces single-tenant behavior.
//!
//! Memory stays bounded: [`SessionRegistry::release`] drops a session whose
//! context went back to blank, and [`SessionRegistry::evict_idle`] drops
//! sessions untouched for longer than a TTL. A session in use is never dropped.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::dialogue::DialogueContext;

pub const DEFAULT_SESSION: &str = "default";

struct SessionSlot {
    ctx: Arc<Mutex<DialogueContext>>,
    last_seen: Instant,
}

impl SessionSlot {
    /// Only the registry holds the context and nobody has it locked.
    fn is_unused(&self) -> bool {
        Arc::strong_count(&self.ctx) == 1 && self.ctx.try_lock().is_ok()
    }
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionSlot>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the context of `id`, creating an idle one on first use.
    /// Marks the session as seen.
    pub async fn context(&self, id: &str) -> Arc<Mutex<DialogueContext>> {
        let mut w = self.sessions.write().await;
        let slot = w.entry(id.to_string()).or_insert_with(|| {
            debug!(session = %id, "session created");
            SessionSlot {
                ctx: Arc::new(Mutex::new(DialogueContext::new())),
                last_seen: Instant::now(),
            }
        });
        slot.last_seen = Instant::now();
        slot.ctx.clone()
    }

    /// Copy of the current context of `id`, if the session exists.
    pub async fn snapshot(&self, id: &str) -> Option<DialogueContext> {
        let ctx = self.sessions.read().await.get(id).map(|s| s.ctx.clone())?;
        let guard = ctx.lock().await;
        Some(guard.clone())
    }

    /// Drops `id` if its context is blank and no caller holds it.
    /// Returns whether the session was dropped.
    ///
    /// Handles are only cloned under the map lock, so an unused slot cannot
    /// be picked up concurrently while the write lock is held.
    pub async fn release(&self, id: &str) -> bool {
        let mut w = self.sessions.write().await;
        let blank = w.get(id).is_some_and(|slot| {
            slot.is_unused() && slot.ctx.try_lock().is_ok_and(|c| c.is_blank())
        });
        if blank {
            w.remove(id);
            debug!(session = %id, "session released");
        }
        blank
    }

    /// Drops every unused session not seen for at least `max_idle`.
    /// Returns how many were dropped.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut w = self.sessions.write().await;
        let before = w.len();
        w.retain(|_, slot| slot.last_seen.elapsed() < max_idle || !slot.is_unused());
        let evicted = before - w.len();
        if evicted > 0 {
            debug!(evicted, remaining = w.len(), "idle sessions evicted");
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
