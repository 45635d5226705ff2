//! Knowledge base storage: normalized question → answer.
//!
//! The engine never caches the base: it calls [`KnowledgeStore::load`] once
//! per utterance and [`KnowledgeStore::save`] once per mutating outcome
//! (teach, correct, alias). Saves rewrite the whole mapping.
//!
//! Concurrent writers from different processes are not coordinated; the last
//! save wins.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::Serialize;
use tracing::{debug, info};

use crate::{errors::StoreError, normalize::normalize};

/// Normalized question → answer. Ordered so saved files are stable and diffable.
pub type KnowledgeBase = BTreeMap<String, String>;

/// Persistence boundary for the knowledge base.
pub trait KnowledgeStore: Send + Sync {
    fn load(&self) -> Result<KnowledgeBase, StoreError>;
    fn save(&self, kb: &KnowledgeBase) -> Result<(), StoreError>;
}

/// Stores `question` (normalized here) with `answer`, replacing any previous
/// answer. Returns the key used.
pub fn teach(kb: &mut KnowledgeBase, question: &str, answer: &str) -> String {
    let key = normalize(question);
    kb.insert(key.clone(), answer.to_string());
    key
}

/// Associates `question` with the answer already stored under `existing`.
///
/// Returns `false` (and leaves `kb` untouched) when `existing` is unknown.
pub fn alias(kb: &mut KnowledgeBase, question: &str, existing: &str) -> bool {
    match kb.get(existing).cloned() {
        Some(answer) => {
            kb.insert(normalize(question), answer);
            true
        }
        None => false,
    }
}

/// Human-readable JSON object file, rewritten in full on every save.
///
/// A missing or blank file loads as an empty base.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl KnowledgeStore for JsonFileStore {
    fn load(&self) -> Result<KnowledgeBase, StoreError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "knowledge file missing; starting empty");
            return Ok(KnowledgeBase::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| self.io_err(e))?;
        if content.trim().is_empty() {
            return Ok(KnowledgeBase::new());
        }

        let kb: KnowledgeBase = serde_json::from_str(&content)?;
        debug!(path = %self.path.display(), entries = kb.len(), "knowledge loaded");
        Ok(kb)
    }

    fn save(&self, kb: &KnowledgeBase) -> Result<(), StoreError> {
        let mut buf = Vec::with_capacity(64 * (kb.len() + 1));
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        kb.serialize(&mut ser)?;
        buf.push(b'\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        fs::write(&self.path, buf).map_err(|e| self.io_err(e))?;

        info!(path = %self.path.display(), entries = kb.len(), "knowledge saved");
        Ok(())
    }
}

/// Process-local store, handy for tests and ephemeral deployments.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<KnowledgeBase>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, Q, A>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Q, A)>,
        Q: AsRef<str>,
        A: Into<String>,
    {
        let kb = entries
            .into_iter()
            .map(|(q, a)| (normalize(q.as_ref()), a.into()))
            .collect();
        Self {
            inner: Mutex::new(kb),
        }
    }
}

impl KnowledgeStore for MemoryStore {
    fn load(&self) -> Result<KnowledgeBase, StoreError> {
        self.inner
            .lock()
            .map(|kb| kb.clone())
            .map_err(|_| StoreError::Poisoned)
    }

    fn save(&self, kb: &KnowledgeBase) -> Result<(), StoreError> {
        let mut guard = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        *guard = kb.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teach_normalizes_and_overwrites() {
        let mut kb = KnowledgeBase::new();
        assert_eq!(teach(&mut kb, "What is your NAME?", "Bot"), "what is your name");
        teach(&mut kb, "what is your name", "Robo");
        assert_eq!(kb.len(), 1);
        assert_eq!(kb["what is your name"], "Robo");
    }

    #[test]
    fn alias_copies_existing_answer() {
        let mut kb = KnowledgeBase::new();
        teach(&mut kb, "how old are you", "Two");
        assert!(alias(&mut kb, "Your age?", "how old are you"));
        assert_eq!(kb["your age"], "Two");
        assert!(!alias(&mut kb, "x", "unknown"));
        assert_eq!(kb.len(), 2);
    }

    #[test]
    fn json_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("kb.json"));
        assert!(store.load().unwrap().is_empty());

        let mut kb = KnowledgeBase::new();
        teach(&mut kb, "what is your name", "Bot");
        store.save(&kb).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        assert_eq!(text, "{\n    \"what is your name\": \"Bot\"\n}\n");
        assert_eq!(store.load().unwrap(), kb);
    }

    #[test]
    fn json_store_blank_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");
        fs::write(&path, "  \n").unwrap();
        assert!(JsonFileStore::new(path).load().unwrap().is_empty());
    }

    #[test]
    fn json_store_rejects_non_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");
        fs::write(&path, "[1, 2]").unwrap();
        let err = JsonFileStore::new(path).load().unwrap_err();
        assert!(matches!(err, StoreError::Json(_)));
    }

    #[test]
    fn memory_store_seeds_normalized_keys() {
        let store = MemoryStore::with_entries([("Hello!", "Hi")]);
        assert_eq!(store.load().unwrap()["hello"], "Hi");
    }
}
