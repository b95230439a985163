//! Sync envelopes and wire types for the `/sync` contract.

use crate::core::{now, Error, Result, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a sync envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Created, not yet checked
    Pending,
    /// Verification pipeline in progress
    Verifying,
    /// Accepted and stored
    Verified,
    /// Replayed (node_id, sync_id) pair; original result stands
    Duplicate,
    /// Rejected by a verification step
    Failed,
}

impl SyncStatus {
    /// Whether the envelope has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncStatus::Verified | SyncStatus::Duplicate | SyncStatus::Failed)
    }

    fn can_transition(&self, to: SyncStatus) -> bool {
        matches!(
            (self, to),
            (SyncStatus::Pending, SyncStatus::Verifying)
                | (SyncStatus::Verifying, SyncStatus::Verified)
                | (SyncStatus::Verifying, SyncStatus::Duplicate)
                | (SyncStatus::Verifying, SyncStatus::Failed)
        )
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SyncStatus::Pending => "pending",
            SyncStatus::Verifying => "verifying",
            SyncStatus::Verified => "verified",
            SyncStatus::Duplicate => "duplicate",
            SyncStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Message direction relative to this service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDirection {
    Inbound,
    Outbound,
}

/// Sender-declared metadata accompanying a sync payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncMetadata {
    /// Declared payload checksum (hex SHA3-256 over canonical JSON)
    pub checksum: String,
    /// Sender-assigned ID, unique per node
    pub sync_id: String,
    /// Sender clock at submission
    pub timestamp: Timestamp,
    /// Sender schema/protocol version
    pub version: String,
}

/// Body of a `/sync` request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncRequest {
    /// Sending node
    pub node_id: String,
    /// Kind of data being synchronized (e.g. "decision", "state")
    pub sync_type: String,
    /// The payload itself
    pub data: serde_json::Value,
    /// Declared metadata
    pub metadata: SyncMetadata,
}

/// A tracked sync message, inbound or outbound.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncEnvelope {
    /// Envelope ID
    pub envelope_id: String,
    /// Originating (inbound) or target (outbound) node
    pub node_id: String,
    /// Sender-assigned sync ID; `(node_id, sync_id)` is the dedup key
    pub sync_id: String,
    /// Direction relative to this service
    pub direction: SyncDirection,
    /// Kind of synchronized data
    pub sync_type: String,
    /// The payload
    pub payload: serde_json::Value,
    /// Checksum declared by the sender
    pub declared_checksum: String,
    /// Lifecycle state
    pub status: SyncStatus,
    /// Number of items the payload carries
    pub items_processed: u64,
    /// Storage time
    pub stored_at: Timestamp,
}

impl SyncEnvelope {
    /// Build an inbound envelope from a parsed request.
    pub fn inbound(request: &SyncRequest) -> Self {
        Self {
            envelope_id: Uuid::new_v4().to_string(),
            node_id: request.node_id.clone(),
            sync_id: request.metadata.sync_id.clone(),
            direction: SyncDirection::Inbound,
            sync_type: request.sync_type.clone(),
            payload: request.data.clone(),
            declared_checksum: request.metadata.checksum.clone(),
            status: SyncStatus::Pending,
            items_processed: count_items(&request.data),
            stored_at: now(),
        }
    }

    /// Build an outbound envelope for a broadcast delivery.
    pub fn outbound(
        target_node: &str,
        sync_id: &str,
        sync_type: &str,
        payload: serde_json::Value,
        checksum: &str,
    ) -> Self {
        let items = count_items(&payload);
        Self {
            envelope_id: Uuid::new_v4().to_string(),
            node_id: target_node.to_string(),
            sync_id: sync_id.to_string(),
            direction: SyncDirection::Outbound,
            sync_type: sync_type.to_string(),
            payload,
            declared_checksum: checksum.to_string(),
            status: SyncStatus::Pending,
            items_processed: items,
            stored_at: now(),
        }
    }

    /// Advance the lifecycle state.
    pub fn transition(&mut self, to: SyncStatus) -> Result<()> {
        if !self.status.can_transition(to) {
            return Err(Error::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        Ok(())
    }

    /// Acknowledgment derived from this envelope's stored state.
    pub fn acknowledgment(&self, duplicate: bool) -> SyncAcknowledgment {
        SyncAcknowledgment {
            duplicate,
            checksum_verified: true,
            items_processed: self.items_processed,
            stored_at: self.stored_at,
        }
    }
}

fn count_items(data: &serde_json::Value) -> u64 {
    match data {
        serde_json::Value::Array(items) => items.len() as u64,
        _ => 1,
    }
}

/// Acknowledgment returned for an accepted (or deduplicated) sync.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncAcknowledgment {
    /// Whether this request replayed an already-stored sync
    pub duplicate: bool,
    /// Whether the recomputed checksum matched the declared one
    pub checksum_verified: bool,
    /// Items accepted when the envelope was first stored
    pub items_processed: u64,
    /// When the envelope was first stored
    pub stored_at: Timestamp,
}

/// Response body of a `/sync` request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncResponse {
    pub success: bool,
    pub sync_id: String,
    pub acknowledgment: SyncAcknowledgment,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> SyncRequest {
        SyncRequest {
            node_id: "node-a".to_string(),
            sync_type: "decision".to_string(),
            data: json!([{"k": 1}, {"k": 2}, {"k": 3}]),
            metadata: SyncMetadata {
                checksum: "00".repeat(32),
                sync_id: "sync-1".to_string(),
                timestamp: now(),
                version: "1.0.0".to_string(),
            },
        }
    }

    #[test]
    fn test_inbound_envelope_counts_array_items() {
        let envelope = SyncEnvelope::inbound(&request());
        assert_eq!(envelope.items_processed, 3);
        assert_eq!(envelope.status, SyncStatus::Pending);
        assert_eq!(envelope.direction, SyncDirection::Inbound);
    }

    #[test]
    fn test_scalar_payload_counts_as_one() {
        let mut req = request();
        req.data = json!({"single": true});
        assert_eq!(SyncEnvelope::inbound(&req).items_processed, 1);
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut envelope = SyncEnvelope::inbound(&request());
        envelope.transition(SyncStatus::Verifying).unwrap();
        envelope.transition(SyncStatus::Verified).unwrap();
        assert!(envelope.status.is_terminal());
    }

    #[test]
    fn test_terminal_state_is_frozen() {
        let mut envelope = SyncEnvelope::inbound(&request());
        envelope.transition(SyncStatus::Verifying).unwrap();
        envelope.transition(SyncStatus::Failed).unwrap();

        let err = envelope.transition(SyncStatus::Verified).unwrap_err();
        assert_eq!(err.classification(), "invalid_transition");
    }

    #[test]
    fn test_cannot_skip_verifying() {
        let mut envelope = SyncEnvelope::inbound(&request());
        assert!(envelope.transition(SyncStatus::Verified).is_err());
    }

    #[test]
    fn test_acknowledgment_reflects_envelope() {
        let mut envelope = SyncEnvelope::inbound(&request());
        envelope.transition(SyncStatus::Verifying).unwrap();
        envelope.transition(SyncStatus::Verified).unwrap();

        let ack = envelope.acknowledgment(false);
        assert!(!ack.duplicate);
        assert_eq!(ack.items_processed, 3);
    }
}
