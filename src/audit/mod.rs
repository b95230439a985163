//! Append-only audit log.
//!
//! Every channel and pipeline outcome, success or failure, is recorded with
//! its classification. Entries are never mutated or deleted.

use crate::core::{now, Result, Timestamp};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// Category of audited event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// Consensus session created
    SessionCreated,
    /// Consensus resolved to a final status
    ConsensusResolved,
    /// Governance reviewer approved or rejected a held session
    GovernanceReview,
    /// Explicit override of a held or rejected session
    GovernanceOverride,
    /// One broadcast delivery attempt
    BroadcastDelivery,
    /// Inbound sync processed
    SyncInbound,
    /// Outbound sync recorded
    SyncOutbound,
}

/// An audit record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Entry ID
    pub id: String,
    /// Event category
    pub event_type: AuditEventType,
    /// Acting node or reviewer
    pub actor: String,
    /// Operation or endpoint involved
    pub endpoint: String,
    /// Outcome
    pub success: bool,
    /// Failure classification, when unsuccessful
    pub failure_reason: Option<String>,
    /// Additional context
    pub metadata: HashMap<String, serde_json::Value>,
    /// Event time
    pub timestamp: Timestamp,
}

impl AuditEntry {
    /// Create a successful entry.
    pub fn new(event_type: AuditEventType, actor: &str, endpoint: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_type,
            actor: actor.to_string(),
            endpoint: endpoint.to_string(),
            success: true,
            failure_reason: None,
            metadata: HashMap::new(),
            timestamp: now(),
        }
    }

    /// Mark as failed with a classification.
    pub fn failed(mut self, reason: &str) -> Self {
        self.success = false;
        self.failure_reason = Some(reason.to_string());
        self
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, key: &str, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.metadata.insert(key.to_string(), v);
        }
        self
    }
}

/// Filter for querying audit entries.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuditFilter {
    /// Filter by actor
    pub actor: Option<String>,
    /// Filter by event category
    pub event_type: Option<AuditEventType>,
    /// Filter by outcome
    pub success: Option<bool>,
    /// Filter by date from
    pub date_from: Option<Timestamp>,
    /// Filter by date to
    pub date_to: Option<Timestamp>,
    /// Maximum results
    pub limit: Option<usize>,
}

impl AuditFilter {
    /// Create a new empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by actor.
    pub fn by_actor(mut self, actor: &str) -> Self {
        self.actor = Some(actor.to_string());
        self
    }

    /// Filter by event category.
    pub fn by_type(mut self, event_type: AuditEventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    /// Filter failed entries only.
    pub fn failed_only(mut self) -> Self {
        self.success = Some(false);
        self
    }

    /// Filter by date range.
    pub fn by_date_range(mut self, from: Timestamp, to: Timestamp) -> Self {
        self.date_from = Some(from);
        self.date_to = Some(to);
        self
    }

    /// Set result limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check if an entry matches this filter.
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(actor) = &self.actor {
            if &entry.actor != actor {
                return false;
            }
        }
        if let Some(event_type) = &self.event_type {
            if &entry.event_type != event_type {
                return false;
            }
        }
        if let Some(success) = self.success {
            if entry.success != success {
                return false;
            }
        }
        if let Some(from) = self.date_from {
            if entry.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if entry.timestamp > to {
                return false;
            }
        }
        true
    }
}

/// Append-only audit backend.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Append a new entry.
    async fn append(&self, entry: AuditEntry) -> Result<()>;

    /// Query entries matching a filter, oldest first.
    async fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>>;

    /// Total entry count.
    async fn count(&self) -> Result<u64>;
}

/// In-memory audit log.
pub struct InMemoryAuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn append(&self, entry: AuditEntry) -> Result<()> {
        self.entries.write().unwrap().push(entry);
        Ok(())
    }

    async fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>> {
        let entries = self.entries.read().unwrap();
        let mut matched: Vec<AuditEntry> =
            entries.iter().filter(|e| filter.matches(e)).cloned().collect();
        if let Some(limit) = filter.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.entries.read().unwrap().len() as u64)
    }
}
