//! Consensus engine facade.
//!
//! Wires the pipeline — graph builder, analyzer, resolver, governance gate,
//! broadcast dispatcher, secure channel — behind the operations an edge layer
//! exposes. Components are per-call values; all mutable state lives in stores
//! keyed by session, so concurrent sessions never share state.

use crate::audit::{AuditEntry, AuditEventType, AuditLog};
use crate::broadcast::{
    BroadcastDispatcher, BroadcastStatus, DeliveryTransport, TargetResult,
};
use crate::channel::inbound::{RequestHeaders, SecureChannel, SyncReceipt};
use crate::channel::outbound::OutboundSigner;
use crate::consensus::governance::{GateDecision, GovernanceGate};
use crate::consensus::resolver::ConsensusResolver;
use crate::consensus::session::{ConsensusMethod, ConsensusSession, SessionStatus};
use crate::core::{EngineConfig, Error, OppositionTable, Result};
use crate::graph::analyzer::RelationshipAnalyzer;
use crate::graph::builder::{GraphBuilder, NodeDecision};
use crate::registry::{CredentialStore, NodeRegistry};
use crate::store::{require_session, NonceStore, SessionStore, SyncStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::info;

/// Install a global tracing subscriber. Intended for binaries and
/// integration harnesses; safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().try_init();
}

/// Orchestration request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrchestrateRequest {
    /// Node requesting the consensus round
    pub initiator_node: String,
    /// Action family being decided
    pub decision_type: String,
    /// Submitted decisions (at least 2, from distinct nodes)
    pub decisions: Vec<NodeDecision>,
    /// Voting method; weighted-vote when omitted
    pub method: Option<ConsensusMethod>,
    /// Force a governance review regardless of outcome
    #[serde(default)]
    pub require_review: bool,
}

/// Orchestration outcome.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrchestrateOutcome {
    /// Session ID
    pub consensus_id: String,
    /// Final lifecycle status
    pub status: SessionStatus,
    /// Support ratio
    pub agreement_ratio: f64,
    /// Conflict level
    pub conflict_level: f64,
    /// Merged decision
    pub final_decision: serde_json::Value,
    /// Integrity checksum of the merged decision
    pub checksum: String,
}

/// Broadcast outcome.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BroadcastOutcome {
    /// Aggregate status
    pub broadcast_status: BroadcastStatus,
    /// Number of successful deliveries
    pub success_count: usize,
    /// Per-target outcomes
    pub per_node_results: Vec<TargetResult>,
}

/// Read-only aggregates over stored sessions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsensusStats {
    /// Total sessions ever created
    pub total_sessions: usize,
    /// Session counts by status
    pub by_status: HashMap<String, usize>,
    /// Mean agreement ratio across resolved sessions
    pub average_agreement: f64,
}

/// Running counters, maintained alongside the stores.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EngineMetrics {
    pub total_sessions: u64,
    pub approved_sessions: u64,
    pub rejected_sessions: u64,
    pub escalated_sessions: u64,
    pub executed_sessions: u64,
    pub average_agreement: f64,
}

/// Cheap liveness snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub registered_nodes: usize,
    pub total_sessions: usize,
    pub sync_envelopes: u64,
    pub audit_entries: u64,
}

/// External collaborators the engine is built from.
pub struct EngineDeps {
    pub registry: Arc<dyn NodeRegistry>,
    pub credentials: Arc<dyn CredentialStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub sync_store: Arc<dyn SyncStore>,
    pub nonces: Arc<dyn NonceStore>,
    pub audit: Arc<dyn AuditLog>,
    pub transport: Arc<dyn DeliveryTransport>,
    pub signer: OutboundSigner,
}

/// The orchestration facade.
pub struct ConsensusEngine {
    config: EngineConfig,
    opposition: OppositionTable,
    registry: Arc<dyn NodeRegistry>,
    sessions: Arc<dyn SessionStore>,
    sync_store: Arc<dyn SyncStore>,
    audit: Arc<dyn AuditLog>,
    channel: SecureChannel,
    dispatcher: BroadcastDispatcher,
    metrics: RwLock<EngineMetrics>,
}

impl ConsensusEngine {
    /// Assemble an engine. `audience` is the identity inbound tokens must be
    /// addressed to.
    pub fn new(
        config: EngineConfig,
        opposition: OppositionTable,
        audience: &str,
        deps: EngineDeps,
    ) -> Self {
        let channel = SecureChannel::new(
            deps.credentials.clone(),
            deps.nonces.clone(),
            deps.sync_store.clone(),
            deps.audit.clone(),
            config.clone(),
            audience,
        );
        let dispatcher = BroadcastDispatcher::new(
            deps.registry.clone(),
            deps.transport,
            deps.signer,
            deps.sync_store.clone(),
            deps.audit.clone(),
            Duration::from_secs(config.delivery_timeout_secs),
        );
        Self {
            config,
            opposition,
            registry: deps.registry,
            sessions: deps.sessions,
            sync_store: deps.sync_store,
            audit: deps.audit,
            channel,
            dispatcher,
            metrics: RwLock::new(EngineMetrics::default()),
        }
    }

    /// Run one consensus round end to end (graph, analysis, vote, gate).
    pub async fn orchestrate(&self, request: OrchestrateRequest) -> Result<OrchestrateOutcome> {
        let method = request.method.unwrap_or_default();
        let graph = GraphBuilder::build(request.decisions)?;

        let mut session = ConsensusSession::new(
            &request.initiator_node,
            &request.decision_type,
            graph.participating_nodes(),
            method,
        );
        self.audit
            .append(
                AuditEntry::new(
                    AuditEventType::SessionCreated,
                    &request.initiator_node,
                    "/orchestrate",
                )
                .with_metadata("session_id", &session.session_id)
                .with_metadata("method", method.to_string()),
            )
            .await?;
        session.transition(SessionStatus::Voting)?;
        self.sessions.put(session.clone()).await?;

        let analyzed = RelationshipAnalyzer::new(&self.config, &self.opposition).analyze(graph);
        let registered = self.registry.registered_count().await?;
        let resolution =
            ConsensusResolver::new(&self.config).resolve(&analyzed, method, registered)?;

        let gate = GovernanceGate::new(&self.config);
        let (final_status, gate_decision) = gate.evaluate(
            &session.session_id,
            &resolution,
            analyzed.conflict_level,
            request.require_review,
        );

        session.agreement_ratio = resolution.agreement_ratio;
        session.conflict_level = analyzed.conflict_level;
        session.coherence_score = analyzed.coherence_score;
        session.final_decision = Some(resolution.final_decision.clone());
        session.final_confidence = resolution.final_confidence;
        session.checksum = Some(resolution.checksum.clone());
        session.quorum_participation = resolution.participation;
        session.graph = Some(analyzed);
        if let GateDecision::Held(reason) = &gate_decision {
            session.hold_reason = Some(reason.clone());
        }
        session.transition(final_status)?;
        self.sessions.put(session.clone()).await?;

        self.audit
            .append(
                AuditEntry::new(
                    AuditEventType::ConsensusResolved,
                    &request.initiator_node,
                    "/orchestrate",
                )
                .with_metadata("session_id", &session.session_id)
                .with_metadata("status", final_status.to_string())
                .with_metadata("agreement_ratio", resolution.agreement_ratio),
            )
            .await?;
        self.update_metrics(&session);

        info!(
            session_id = %session.session_id,
            %method,
            status = %final_status,
            ratio = resolution.agreement_ratio,
            "consensus resolved"
        );

        Ok(OrchestrateOutcome {
            consensus_id: session.session_id,
            status: final_status,
            agreement_ratio: resolution.agreement_ratio,
            conflict_level: session.conflict_level,
            final_decision: resolution.final_decision,
            checksum: resolution.checksum,
        })
    }

    /// Broadcast an approved session's decision to its targets.
    pub async fn broadcast(
        &self,
        consensus_id: &str,
        targets: Option<Vec<String>>,
    ) -> Result<BroadcastOutcome> {
        let mut session = require_session(self.sessions.as_ref(), consensus_id).await?;
        let record = self.dispatcher.dispatch(&session, targets).await?;

        if record.status == BroadcastStatus::Completed {
            session.transition(SessionStatus::Executed)?;
            self.sessions.put(session).await?;
            let mut metrics = self.metrics.write().unwrap();
            metrics.executed_sessions += 1;
        }

        Ok(BroadcastOutcome {
            broadcast_status: record.status,
            success_count: record.success_count(),
            per_node_results: record.results,
        })
    }

    /// Accept an inbound signed sync through the secure channel.
    pub async fn ingest_sync(
        &self,
        method: &str,
        path: &str,
        headers: &RequestHeaders,
        body: &[u8],
    ) -> Result<SyncReceipt> {
        self.channel.receive(method, path, headers, body).await
    }

    /// Approve a session held for review.
    pub async fn approve_review(
        &self,
        consensus_id: &str,
        reviewer: &str,
        justification: &str,
    ) -> Result<ConsensusSession> {
        self.resolve_review(consensus_id, reviewer, true, justification).await
    }

    /// Reject a session held for review.
    pub async fn reject_review(
        &self,
        consensus_id: &str,
        reviewer: &str,
        justification: &str,
    ) -> Result<ConsensusSession> {
        self.resolve_review(consensus_id, reviewer, false, justification).await
    }

    async fn resolve_review(
        &self,
        consensus_id: &str,
        reviewer: &str,
        approved: bool,
        justification: &str,
    ) -> Result<ConsensusSession> {
        let mut session = require_session(self.sessions.as_ref(), consensus_id).await?;
        if session.status != SessionStatus::ReviewRequired {
            return Err(Error::Validation(format!(
                "session {} is not awaiting review (status {})",
                consensus_id, session.status
            )));
        }
        session.record_review(reviewer, approved, justification)?;
        self.sessions.put(session.clone()).await?;
        self.audit
            .append(
                AuditEntry::new(AuditEventType::GovernanceReview, reviewer, "/consensus")
                    .with_metadata("session_id", consensus_id)
                    .with_metadata("approved", approved),
            )
            .await?;
        Ok(session)
    }

    /// Explicitly override a held or rejected session.
    pub async fn override_session(
        &self,
        consensus_id: &str,
        actor: &str,
        justification: &str,
    ) -> Result<ConsensusSession> {
        let mut session = require_session(self.sessions.as_ref(), consensus_id).await?;
        session.record_override(actor, justification)?;
        self.sessions.put(session.clone()).await?;
        self.audit
            .append(
                AuditEntry::new(AuditEventType::GovernanceOverride, actor, "/consensus")
                    .with_metadata("session_id", consensus_id)
                    .with_metadata("justification", justification),
            )
            .await?;
        Ok(session)
    }

    /// Fetch a full session record.
    pub async fn session(&self, consensus_id: &str) -> Result<ConsensusSession> {
        require_session(self.sessions.as_ref(), consensus_id).await
    }

    /// Most recent sessions, newest first.
    pub async fn recent(&self, limit: usize) -> Result<Vec<ConsensusSession>> {
        self.sessions.recent(limit).await
    }

    /// Aggregates over all stored sessions.
    pub async fn stats(&self) -> Result<ConsensusStats> {
        let sessions = self.sessions.list().await?;
        let mut by_status: HashMap<String, usize> = HashMap::new();
        let mut ratio_sum = 0.0;
        let mut resolved = 0usize;
        for session in &sessions {
            *by_status.entry(session.status.to_string()).or_insert(0) += 1;
            if session.status != SessionStatus::Pending && session.status != SessionStatus::Voting {
                ratio_sum += session.agreement_ratio;
                resolved += 1;
            }
        }
        Ok(ConsensusStats {
            total_sessions: sessions.len(),
            by_status,
            average_agreement: if resolved == 0 { 0.0 } else { ratio_sum / resolved as f64 },
        })
    }

    /// Running engine counters.
    pub fn metrics(&self) -> EngineMetrics {
        self.metrics.read().unwrap().clone()
    }

    /// Cheap liveness snapshot over the collaborating stores.
    pub async fn health(&self) -> Result<HealthReport> {
        Ok(HealthReport {
            status: "ok".to_string(),
            registered_nodes: self.registry.registered_count().await?,
            total_sessions: self.sessions.list().await?.len(),
            sync_envelopes: self.sync_store.count().await?,
            audit_entries: self.audit.count().await?,
        })
    }

    fn update_metrics(&self, session: &ConsensusSession) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.total_sessions += 1;
        match session.status {
            SessionStatus::Approved => metrics.approved_sessions += 1,
            SessionStatus::Rejected => metrics.rejected_sessions += 1,
            SessionStatus::ReviewRequired => metrics.escalated_sessions += 1,
            _ => {}
        }
        metrics.average_agreement = (metrics.average_agreement
            * (metrics.total_sessions - 1) as f64
            + session.agreement_ratio)
            / metrics.total_sessions as f64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::InMemoryAuditLog;
    use crate::broadcast::DeliveryStatus;
    use crate::channel::envelope::{SyncMetadata, SyncRequest};
    use crate::channel::crypto::{payload_checksum, sign_request};
    use crate::channel::outbound::SignedDelivery;
    use crate::channel::token::TokenIssuer;
    use crate::core::now;
    use crate::graph::builder::Stance;
    use crate::registry::{
        InMemoryCredentialStore, InMemoryNodeRegistry, NodeCredential, NodeEntry,
    };
    use crate::store::{InMemoryNonceStore, InMemorySessionStore, InMemorySyncStore};
    use async_trait::async_trait;
    use serde_json::json;

    const AUDIENCE: &str = "consensus-core";

    struct OkTransport;

    #[async_trait]
    impl DeliveryTransport for OkTransport {
        async fn deliver(&self, _endpoint: &str, _delivery: &SignedDelivery) -> Result<()> {
            Ok(())
        }
    }

    struct Fixture {
        engine: ConsensusEngine,
        issuer: TokenIssuer,
        registry: Arc<InMemoryNodeRegistry>,
    }

    fn fixture(registered: &[&str]) -> Fixture {
        let issuer = TokenIssuer::generate("accord-ca");
        let registry = Arc::new(InMemoryNodeRegistry::new());
        for node in registered {
            registry.register(NodeEntry::new(node, "worker", &format!("http://{}/sync", node)));
        }
        let credentials = Arc::new(InMemoryCredentialStore::new(issuer.verifying_key()));
        credentials.insert(NodeCredential {
            node_id: "node-a".to_string(),
            key_id: "k1".to_string(),
            secret: b"node-a-secret".to_vec(),
        });

        let engine = ConsensusEngine::new(
            EngineConfig::default(),
            OppositionTable::with_defaults(),
            AUDIENCE,
            EngineDeps {
                registry: registry.clone(),
                credentials,
                sessions: Arc::new(InMemorySessionStore::new()),
                sync_store: Arc::new(InMemorySyncStore::new()),
                nonces: Arc::new(InMemoryNonceStore::new()),
                audit: Arc::new(InMemoryAuditLog::new()),
                transport: Arc::new(OkTransport),
                signer: OutboundSigner::new(
                    "hub-node",
                    "hub-key",
                    b"hub-secret".to_vec(),
                    "hub-token".to_string(),
                ),
            },
        );
        Fixture { engine, issuer, registry }
    }

    fn supporting(node: &str, weight: f64) -> NodeDecision {
        NodeDecision::new(node, "scale-up", json!({"replicas": 3, "region": "eu"}))
            .with_confidence(weight / 0.6)
            .with_impact(0.0)
    }

    fn opposing(node: &str, weight: f64) -> NodeDecision {
        supporting(node, weight).with_stance(Stance::Oppose)
    }

    fn orchestrate_request(decisions: Vec<NodeDecision>) -> OrchestrateRequest {
        OrchestrateRequest {
            initiator_node: "node-a".to_string(),
            decision_type: "scale-up".to_string(),
            decisions,
            method: None,
            require_review: false,
        }
    }

    #[tokio::test]
    async fn test_orchestrate_rejects_single_decision() {
        let f = fixture(&["node-a", "node-b"]);
        let err = f
            .engine
            .orchestrate(orchestrate_request(vec![supporting("node-a", 0.5)]))
            .await
            .unwrap_err();
        assert_eq!(err.classification(), "validation_error");
    }

    #[tokio::test]
    async fn test_orchestrate_weighted_vote_approves() {
        let f = fixture(&["node-a", "node-b", "node-c"]);
        let outcome = f
            .engine
            .orchestrate(orchestrate_request(vec![
                supporting("node-a", 0.5),
                supporting("node-b", 0.3),
                opposing("node-c", 0.2),
            ]))
            .await
            .unwrap();

        assert!((outcome.agreement_ratio - 0.8).abs() < 1e-9);
        assert_eq!(outcome.status, SessionStatus::Approved);
        assert_eq!(outcome.final_decision["replicas"], json!(3));
        assert_eq!(outcome.checksum.len(), 64);
    }

    #[tokio::test]
    async fn test_conflicting_decisions_are_held() {
        let f = fixture(&["node-a", "node-b"]);
        // Opposing action types with divergent payloads: full conflict.
        let outcome = f
            .engine
            .orchestrate(orchestrate_request(vec![
                NodeDecision::new("node-a", "scale-up", json!({"replicas": 9}))
                    .with_confidence(0.95),
                NodeDecision::new("node-b", "scale-down", json!({"floor": 1, "drain": true}))
                    .with_confidence(0.9),
            ]))
            .await
            .unwrap();

        assert_eq!(outcome.conflict_level, 1.0);
        assert_eq!(outcome.status, SessionStatus::ReviewRequired);

        let session = f.engine.session(&outcome.consensus_id).await.unwrap();
        assert!(session.hold_reason.is_some());
    }

    #[tokio::test]
    async fn test_review_then_broadcast() {
        let f = fixture(&["node-a", "node-b"]);
        let outcome = f
            .engine
            .orchestrate(orchestrate_request(vec![
                NodeDecision::new("node-a", "scale-up", json!({"replicas": 9}))
                    .with_confidence(0.95),
                NodeDecision::new("node-b", "scale-down", json!({"floor": 1, "drain": true}))
                    .with_confidence(0.9),
            ]))
            .await
            .unwrap();
        assert_eq!(outcome.status, SessionStatus::ReviewRequired);

        // Broadcasting a held session is blocked.
        let err = f.engine.broadcast(&outcome.consensus_id, None).await.unwrap_err();
        assert_eq!(err.classification(), "governance_blocked");

        let session = f
            .engine
            .approve_review(&outcome.consensus_id, "reviewer-1", "conflict resolved offline")
            .await
            .unwrap();
        assert_eq!(session.status, SessionStatus::Approved);

        let broadcast = f.engine.broadcast(&outcome.consensus_id, None).await.unwrap();
        assert_eq!(broadcast.broadcast_status, BroadcastStatus::Completed);
        assert_eq!(broadcast.success_count, 2);

        let session = f.engine.session(&outcome.consensus_id).await.unwrap();
        assert_eq!(session.status, SessionStatus::Executed);
    }

    #[tokio::test]
    async fn test_override_rejected_session() {
        let f = fixture(&["node-a", "node-b", "node-c"]);
        let outcome = f
            .engine
            .orchestrate(orchestrate_request(vec![
                supporting("node-a", 0.1),
                opposing("node-b", 0.5),
                opposing("node-c", 0.4),
            ]))
            .await
            .unwrap();
        assert_eq!(outcome.status, SessionStatus::Rejected);

        let session = f
            .engine
            .override_session(&outcome.consensus_id, "operator-1", "incident remediation")
            .await
            .unwrap();
        assert_eq!(session.status, SessionStatus::Overridden);

        let broadcast = f.engine.broadcast(&outcome.consensus_id, None).await.unwrap();
        assert_eq!(broadcast.broadcast_status, BroadcastStatus::Completed);
    }

    #[tokio::test]
    async fn test_quorum_insufficient_participation_held() {
        let f = fixture(&["node-a", "node-b", "node-c", "node-d", "node-e"]);
        let mut request = orchestrate_request(vec![
            supporting("node-a", 0.5),
            supporting("node-b", 0.5),
        ]);
        request.method = Some(ConsensusMethod::Quorum);

        let outcome = f.engine.orchestrate(request).await.unwrap();
        assert_eq!(outcome.status, SessionStatus::ReviewRequired);

        let session = f.engine.session(&outcome.consensus_id).await.unwrap();
        assert_eq!(session.quorum_participation, Some(0.4));
    }

    #[tokio::test]
    async fn test_broadcast_skips_inactive_target() {
        let f = fixture(&["node-a", "node-b", "node-c"]);
        f.registry.deactivate("node-c");

        let outcome = f
            .engine
            .orchestrate(orchestrate_request(vec![
                supporting("node-a", 0.5),
                supporting("node-b", 0.4),
                supporting("node-c", 0.3),
            ]))
            .await
            .unwrap();

        let broadcast = f.engine.broadcast(&outcome.consensus_id, None).await.unwrap();
        assert_eq!(broadcast.success_count, 2);
        let skipped = broadcast
            .per_node_results
            .iter()
            .find(|r| r.node_id == "node-c")
            .unwrap();
        assert!(matches!(skipped.status, DeliveryStatus::Skipped(_)));
    }

    #[tokio::test]
    async fn test_sync_roundtrip_through_engine() {
        let f = fixture(&["node-a", "node-b"]);
        let data = json!([{"metric": "load", "value": 0.7}]);
        let request = SyncRequest {
            node_id: "node-a".to_string(),
            sync_type: "state".to_string(),
            metadata: SyncMetadata {
                checksum: payload_checksum(&data).unwrap(),
                sync_id: "sync-1".to_string(),
                timestamp: now(),
                version: "1.0.0".to_string(),
            },
            data,
        };
        let body = serde_json::to_vec(&request).unwrap();
        let timestamp = now().timestamp();
        let token = f.issuer.issue_for("node-a", "worker", AUDIENCE).unwrap();
        let headers = RequestHeaders {
            token: token.encode().unwrap(),
            key_id: "k1".to_string(),
            timestamp,
            signature: sign_request(b"node-a-secret", "POST", "/sync", &body, timestamp).unwrap(),
            nonce: "engine-nonce-1".to_string(),
        };

        let receipt = f.engine.ingest_sync("POST", "/sync", &headers, &body).await.unwrap();
        assert!(receipt.response.success);
        assert_eq!(receipt.response.acknowledgment.items_processed, 1);
    }

    #[tokio::test]
    async fn test_stats_and_recent() {
        let f = fixture(&["node-a", "node-b", "node-c"]);
        for _ in 0..3 {
            f.engine
                .orchestrate(orchestrate_request(vec![
                    supporting("node-a", 0.5),
                    supporting("node-b", 0.3),
                ]))
                .await
                .unwrap();
        }

        let stats = f.engine.stats().await.unwrap();
        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.by_status.get("approved"), Some(&3));
        assert!(stats.average_agreement > 0.99);

        let recent = f.engine.recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent[0].created_at >= recent[1].created_at);

        let metrics = f.engine.metrics();
        assert_eq!(metrics.total_sessions, 3);
        assert_eq!(metrics.approved_sessions, 3);
    }

    #[tokio::test]
    async fn test_health_snapshot() {
        let f = fixture(&["node-a", "node-b"]);
        let health = f.engine.health().await.unwrap();
        assert_eq!(health.status, "ok");
        assert_eq!(health.registered_nodes, 2);
        assert_eq!(health.total_sessions, 0);
    }

    #[tokio::test]
    async fn test_review_of_unheld_session_rejected() {
        let f = fixture(&["node-a", "node-b"]);
        let outcome = f
            .engine
            .orchestrate(orchestrate_request(vec![
                supporting("node-a", 0.5),
                supporting("node-b", 0.3),
            ]))
            .await
            .unwrap();
        assert_eq!(outcome.status, SessionStatus::Approved);

        let err = f
            .engine
            .approve_review(&outcome.consensus_id, "reviewer-1", "noop")
            .await
            .unwrap_err();
        assert_eq!(err.classification(), "validation_error");
    }
}
