//! Durable-store collaborator traits with in-memory implementations.
//!
//! The sync store enforces `(node_id, sync_id)` uniqueness atomically at
//! insert time: the first writer wins and every concurrent retry observes the
//! stored original. Nonce claims are likewise single atomic insertions.

use crate::channel::envelope::{SyncEnvelope, SyncStatus};
use crate::consensus::session::ConsensusSession;
use crate::core::{Error, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock};

/// Outcome of an envelope insertion.
#[derive(Clone, Debug)]
pub enum InsertOutcome {
    /// This writer stored the envelope
    Inserted,
    /// The key already existed; the stored original is returned
    Duplicate(SyncEnvelope),
}

/// Persistence for sync envelopes.
#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Insert an envelope, enforcing `(node_id, sync_id)` uniqueness in one
    /// atomic step. Never read-then-write.
    async fn insert(&self, envelope: SyncEnvelope) -> Result<InsertOutcome>;

    /// Update the lifecycle state of a stored envelope.
    async fn update_status(&self, node_id: &str, sync_id: &str, status: SyncStatus) -> Result<()>;

    /// Fetch an envelope by its dedup key.
    async fn get(&self, node_id: &str, sync_id: &str) -> Result<Option<SyncEnvelope>>;

    /// Number of stored envelopes.
    async fn count(&self) -> Result<u64>;
}

/// Single-use nonce tracking.
#[async_trait]
pub trait NonceStore: Send + Sync {
    /// Claim a nonce. Returns true for the first claimant only.
    async fn claim(&self, nonce: &str) -> Result<bool>;
}

/// Persistence for consensus sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store or replace a session.
    async fn put(&self, session: ConsensusSession) -> Result<()>;

    /// Fetch a session by ID.
    async fn get(&self, session_id: &str) -> Result<Option<ConsensusSession>>;

    /// Most recent sessions, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<ConsensusSession>>;

    /// All sessions (aggregate reads).
    async fn list(&self) -> Result<Vec<ConsensusSession>>;
}

/// Fetch a session or fail with a not-found error.
pub async fn require_session(store: &dyn SessionStore, session_id: &str) -> Result<ConsensusSession> {
    store
        .get(session_id)
        .await?
        .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))
}

/// In-memory sync store.
pub struct InMemorySyncStore {
    envelopes: Mutex<HashMap<(String, String), SyncEnvelope>>,
}

impl InMemorySyncStore {
    pub fn new() -> Self {
        Self {
            envelopes: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySyncStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SyncStore for InMemorySyncStore {
    async fn insert(&self, envelope: SyncEnvelope) -> Result<InsertOutcome> {
        let key = (envelope.node_id.clone(), envelope.sync_id.clone());
        let mut envelopes = self.envelopes.lock().unwrap();
        match envelopes.entry(key) {
            std::collections::hash_map::Entry::Occupied(existing) => {
                Ok(InsertOutcome::Duplicate(existing.get().clone()))
            }
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(envelope);
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    async fn update_status(&self, node_id: &str, sync_id: &str, status: SyncStatus) -> Result<()> {
        let key = (node_id.to_string(), sync_id.to_string());
        let mut envelopes = self.envelopes.lock().unwrap();
        let envelope = envelopes
            .get_mut(&key)
            .ok_or_else(|| Error::Internal(format!("envelope ({}, {}) not stored", node_id, sync_id)))?;
        envelope.transition(status)
    }

    async fn get(&self, node_id: &str, sync_id: &str) -> Result<Option<SyncEnvelope>> {
        let key = (node_id.to_string(), sync_id.to_string());
        Ok(self.envelopes.lock().unwrap().get(&key).cloned())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.envelopes.lock().unwrap().len() as u64)
    }
}

/// In-memory nonce store.
pub struct InMemoryNonceStore {
    nonces: Mutex<HashSet<String>>,
}

impl InMemoryNonceStore {
    pub fn new() -> Self {
        Self {
            nonces: Mutex::new(HashSet::new()),
        }
    }
}

impl Default for InMemoryNonceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NonceStore for InMemoryNonceStore {
    async fn claim(&self, nonce: &str) -> Result<bool> {
        Ok(self.nonces.lock().unwrap().insert(nonce.to_string()))
    }
}

/// In-memory session store.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, ConsensusSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(&self, session: ConsensusSession) -> Result<()> {
        self.sessions
            .write()
            .unwrap()
            .insert(session.session_id.clone(), session);
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<ConsensusSession>> {
        Ok(self.sessions.read().unwrap().get(session_id).cloned())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ConsensusSession>> {
        let mut sessions: Vec<ConsensusSession> =
            self.sessions.read().unwrap().values().cloned().collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sessions.truncate(limit);
        Ok(sessions)
    }

    async fn list(&self) -> Result<Vec<ConsensusSession>> {
        Ok(self.sessions.read().unwrap().values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::envelope::{SyncMetadata, SyncRequest};
    use crate::core::now;
    use serde_json::json;
    use std::sync::Arc;

    fn envelope(node: &str, sync_id: &str) -> SyncEnvelope {
        SyncEnvelope::inbound(&SyncRequest {
            node_id: node.to_string(),
            sync_type: "state".to_string(),
            data: json!({"v": 1}),
            metadata: SyncMetadata {
                checksum: "00".repeat(32),
                sync_id: sync_id.to_string(),
                timestamp: now(),
                version: "1.0.0".to_string(),
            },
        })
    }

    #[tokio::test]
    async fn test_insert_enforces_uniqueness() {
        let store = InMemorySyncStore::new();

        let first = store.insert(envelope("node-a", "s1")).await.unwrap();
        assert!(matches!(first, InsertOutcome::Inserted));

        let second = store.insert(envelope("node-a", "s1")).await.unwrap();
        match second {
            InsertOutcome::Duplicate(existing) => assert_eq!(existing.sync_id, "s1"),
            InsertOutcome::Inserted => panic!("duplicate key must not insert"),
        }
    }

    #[tokio::test]
    async fn test_same_sync_id_different_node_is_distinct() {
        let store = InMemorySyncStore::new();
        store.insert(envelope("node-a", "s1")).await.unwrap();

        let outcome = store.insert(envelope("node-b", "s1")).await.unwrap();
        assert!(matches!(outcome, InsertOutcome::Inserted));
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_accept_exactly_one() {
        let store = Arc::new(InMemorySyncStore::new());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.insert(envelope("node-a", "race")).await.unwrap()
            }));
        }

        let mut inserted = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), InsertOutcome::Inserted) {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_nonce_claimed_exactly_once() {
        let store = InMemoryNonceStore::new();
        assert!(store.claim("nonce-1").await.unwrap());
        assert!(!store.claim("nonce-1").await.unwrap());
        assert!(store.claim("nonce-2").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_status_unknown_key_fails() {
        let store = InMemorySyncStore::new();
        let err = store
            .update_status("node-a", "missing", SyncStatus::Verifying)
            .await
            .unwrap_err();
        assert_eq!(err.classification(), "internal_error");
    }
}
