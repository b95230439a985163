//! Broadcast dispatcher.
//!
//! Fans an approved decision out to participating nodes, one signed delivery
//! per target, concurrently and under a per-target timeout. Failures are
//! collected per target and never retried in-band.

use crate::audit::{AuditEntry, AuditEventType, AuditLog};
use crate::channel::envelope::{SyncEnvelope, SyncStatus};
use crate::channel::outbound::{OutboundSigner, SignedDelivery};
use crate::consensus::session::{ConsensusSession, SessionStatus};
use crate::core::{now, Error, Result, Timestamp};
use crate::registry::NodeRegistry;
use crate::store::{InsertOutcome, SyncStore};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Transport used to move a signed delivery to a node endpoint.
#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    /// Deliver to a single endpoint. Errors are collected, not retried.
    async fn deliver(&self, endpoint: &str, delivery: &SignedDelivery) -> Result<()>;
}

/// Outcome of one delivery attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "status", content = "detail")]
pub enum DeliveryStatus {
    /// Target acknowledged the delivery
    Delivered,
    /// Delivery failed or timed out
    Failed(String),
    /// Target was not attempted (inactive or unknown)
    Skipped(String),
}

/// Per-target broadcast result.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TargetResult {
    /// Target node
    pub node_id: String,
    /// Attempt outcome
    pub status: DeliveryStatus,
}

/// Aggregate broadcast state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastStatus {
    Pending,
    Broadcasting,
    /// Every issued delivery succeeded
    Completed,
    /// A strict subset of issued deliveries succeeded
    Partial,
    /// No issued delivery succeeded
    Failed,
}

/// Record of one broadcast run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BroadcastRecord {
    /// Session being broadcast
    pub session_id: String,
    /// Resolved target list
    pub targets: Vec<String>,
    /// Per-target outcomes
    pub results: Vec<TargetResult>,
    /// Aggregate status
    pub status: BroadcastStatus,
    /// Start time
    pub started_at: Timestamp,
    /// Completion time
    pub finished_at: Timestamp,
}

impl BroadcastRecord {
    /// Number of successful deliveries.
    pub fn success_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == DeliveryStatus::Delivered)
            .count()
    }
}

/// Fans deliveries out to registry endpoints.
pub struct BroadcastDispatcher {
    registry: Arc<dyn NodeRegistry>,
    transport: Arc<dyn DeliveryTransport>,
    signer: OutboundSigner,
    sync_store: Arc<dyn SyncStore>,
    audit: Arc<dyn AuditLog>,
    timeout: Duration,
}

impl BroadcastDispatcher {
    /// Create a dispatcher.
    pub fn new(
        registry: Arc<dyn NodeRegistry>,
        transport: Arc<dyn DeliveryTransport>,
        signer: OutboundSigner,
        sync_store: Arc<dyn SyncStore>,
        audit: Arc<dyn AuditLog>,
        timeout: Duration,
    ) -> Self {
        Self {
            registry,
            transport,
            signer,
            sync_store,
            audit,
            timeout,
        }
    }

    /// Broadcast a session's final decision.
    ///
    /// `targets` restricts delivery to a subset; by default every
    /// participating node is addressed. Only broadcast-eligible sessions
    /// (approved, or moved past review by override) are accepted.
    pub async fn dispatch(
        &self,
        session: &ConsensusSession,
        targets: Option<Vec<String>>,
    ) -> Result<BroadcastRecord> {
        match session.status {
            status if status.is_broadcastable() => {}
            SessionStatus::ReviewRequired => {
                return Err(Error::GovernanceBlocked(session.session_id.clone()));
            }
            status => {
                return Err(Error::Validation(format!(
                    "session {} is not broadcastable in status {}",
                    session.session_id, status
                )));
            }
        }

        let targets = targets.unwrap_or_else(|| session.participating_nodes.clone());
        let started_at = now();

        let payload = json!({
            "session_id": session.session_id,
            "decision_type": session.decision_type,
            "final_decision": session.final_decision,
            "final_confidence": session.final_confidence,
            "checksum": session.checksum,
            "status": session.status,
        });

        let attempts = targets.iter().map(|target| {
            let payload = payload.clone();
            async move { self.deliver_one(session, target, &payload).await }
        });
        let results: Vec<TargetResult> = futures::future::join_all(attempts).await;

        let issued = results
            .iter()
            .filter(|r| !matches!(r.status, DeliveryStatus::Skipped(_)))
            .count();
        let delivered = results
            .iter()
            .filter(|r| r.status == DeliveryStatus::Delivered)
            .count();

        let status = if issued == 0 {
            BroadcastStatus::Failed
        } else if delivered == issued {
            BroadcastStatus::Completed
        } else if delivered > 0 {
            BroadcastStatus::Partial
        } else {
            BroadcastStatus::Failed
        };

        info!(
            session_id = %session.session_id,
            targets = targets.len(),
            delivered,
            ?status,
            "broadcast finished"
        );

        Ok(BroadcastRecord {
            session_id: session.session_id.clone(),
            targets,
            results,
            status,
            started_at,
            finished_at: now(),
        })
    }

    async fn deliver_one(
        &self,
        session: &ConsensusSession,
        target: &str,
        payload: &serde_json::Value,
    ) -> TargetResult {
        let entry = match self.registry.get(target).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                return self
                    .record_skip(session, target, "not registered")
                    .await
            }
            Err(err) => {
                return self
                    .record_failure(session, target, &format!("registry lookup failed: {}", err))
                    .await
            }
        };
        if !entry.active {
            return self.record_skip(session, target, "node inactive").await;
        }

        let delivery = match self.signer.sign("POST", "/sync", payload) {
            Ok(delivery) => delivery,
            Err(err) => {
                return self
                    .record_failure(session, target, &format!("signing failed: {}", err))
                    .await
            }
        };

        let outcome =
            tokio::time::timeout(self.timeout, self.transport.deliver(&entry.endpoint, &delivery))
                .await;

        match outcome {
            Ok(Ok(())) => {
                self.record_outbound(session, target, payload, &delivery, SyncStatus::Verified)
                    .await;
                self.audit_delivery(session, target, None).await;
                TargetResult {
                    node_id: target.to_string(),
                    status: DeliveryStatus::Delivered,
                }
            }
            Ok(Err(err)) => {
                let reason = err.to_string();
                self.record_outbound(session, target, payload, &delivery, SyncStatus::Failed)
                    .await;
                self.record_failure(session, target, &reason).await
            }
            Err(_) => {
                let reason = format!("timed out after {:?}", self.timeout);
                self.record_outbound(session, target, payload, &delivery, SyncStatus::Failed)
                    .await;
                self.record_failure(session, target, &reason).await
            }
        }
    }

    /// Track the outbound message as a sync envelope. A re-broadcast of the
    /// same session to the same target keeps the original envelope.
    async fn record_outbound(
        &self,
        session: &ConsensusSession,
        target: &str,
        payload: &serde_json::Value,
        delivery: &SignedDelivery,
        status: SyncStatus,
    ) {
        let sync_id = format!("broadcast-{}", session.session_id);
        let mut envelope =
            SyncEnvelope::outbound(target, &sync_id, "decision", payload.clone(), &delivery.checksum);
        if envelope.transition(SyncStatus::Verifying).is_err() {
            return;
        }
        match self.sync_store.insert(envelope).await {
            Ok(InsertOutcome::Inserted) => {
                let _ = self.sync_store.update_status(target, &sync_id, status).await;
            }
            Ok(InsertOutcome::Duplicate(_)) => {}
            Err(err) => warn!(target, error = %err, "failed to record outbound envelope"),
        }
    }

    async fn audit_delivery(&self, session: &ConsensusSession, target: &str, failure: Option<&str>) {
        let mut entry = AuditEntry::new(
            AuditEventType::BroadcastDelivery,
            self.signer.node_id(),
            "/broadcast",
        )
        .with_metadata("session_id", &session.session_id)
        .with_metadata("target", target);
        if let Some(reason) = failure {
            entry = entry.failed(reason);
        }
        if let Err(err) = self.audit.append(entry).await {
            warn!(target, error = %err, "failed to audit delivery");
        }
    }

    async fn record_skip(
        &self,
        session: &ConsensusSession,
        target: &str,
        reason: &str,
    ) -> TargetResult {
        self.audit_delivery(session, target, Some(reason)).await;
        TargetResult {
            node_id: target.to_string(),
            status: DeliveryStatus::Skipped(reason.to_string()),
        }
    }

    async fn record_failure(
        &self,
        session: &ConsensusSession,
        target: &str,
        reason: &str,
    ) -> TargetResult {
        warn!(session_id = %session.session_id, target, reason, "delivery failed");
        self.audit_delivery(session, target, Some(reason)).await;
        TargetResult {
            node_id: target.to_string(),
            status: DeliveryStatus::Failed(reason.to_string()),
        }
    }
}
