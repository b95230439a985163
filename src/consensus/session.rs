//! Consensus session model and status lifecycle.

use crate::core::{now, Error, Result, Timestamp};
use crate::graph::analyzer::AnalyzedGraph;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Voting method applied by the resolver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConsensusMethod {
    /// Influence proportional to each node's derived weight
    #[default]
    WeightedVote,
    /// Every participant must support
    Unanimous,
    /// Unweighted simple majority
    Majority,
    /// Majority among participants, gated on minimum participation
    Quorum,
}

impl std::fmt::Display for ConsensusMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConsensusMethod::WeightedVote => "weighted-vote",
            ConsensusMethod::Unanimous => "unanimous",
            ConsensusMethod::Majority => "majority",
            ConsensusMethod::Quorum => "quorum",
        };
        write!(f, "{}", s)
    }
}

/// Lifecycle status of a consensus session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Created, pipeline not yet run
    Pending,
    /// Graph built, vote in progress
    Voting,
    /// Threshold met, eligible for broadcast
    Approved,
    /// Held for an external governance decision
    ReviewRequired,
    /// Vote failed or reviewer rejected
    Rejected,
    /// Moved past a hold or rejection by explicit override
    Overridden,
    /// Broadcast completed
    Executed,
}

impl SessionStatus {
    /// Whether this status permits broadcast.
    pub fn is_broadcastable(&self) -> bool {
        matches!(self, SessionStatus::Approved | SessionStatus::Overridden)
    }

    /// Whether the session has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Executed | SessionStatus::Rejected | SessionStatus::Overridden
        )
    }

    /// Forward-only transition table. The override arc
    /// (`ReviewRequired`/`Rejected` -> `Overridden`) is the one sanctioned
    /// exception to strictly forward movement.
    pub fn can_transition(&self, to: SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (self, to),
            (Pending, Voting)
                | (Voting, Approved)
                | (Voting, ReviewRequired)
                | (Voting, Rejected)
                | (ReviewRequired, Approved)
                | (ReviewRequired, Rejected)
                | (ReviewRequired, Overridden)
                | (Rejected, Overridden)
                | (Approved, Executed)
                | (Overridden, Executed)
        )
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Voting => "voting",
            SessionStatus::Approved => "approved",
            SessionStatus::ReviewRequired => "review_required",
            SessionStatus::Rejected => "rejected",
            SessionStatus::Overridden => "overridden",
            SessionStatus::Executed => "executed",
        };
        write!(f, "{}", s)
    }
}

/// A recorded governance review decision.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Reviewer identity
    pub reviewer: String,
    /// Whether the reviewer approved
    pub approved: bool,
    /// Required justification
    pub justification: String,
    /// Decision time
    pub decided_at: Timestamp,
}

/// A recorded override action.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OverrideRecord {
    /// Actor performing the override
    pub actor: String,
    /// Required justification
    pub justification: String,
    /// Status the session held before the override
    pub previous_status: SessionStatus,
    /// Override time
    pub overridden_at: Timestamp,
}

/// One round of multi-node decision resolution. Never reused for a second vote.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsensusSession {
    /// Session ID
    pub session_id: String,
    /// Node that requested orchestration
    pub initiator_node: String,
    /// Action family being decided
    pub decision_type: String,
    /// Distinct nodes that submitted decisions
    pub participating_nodes: Vec<String>,
    /// Voting method
    pub method: ConsensusMethod,
    /// Analyzed decision graph
    pub graph: Option<AnalyzedGraph>,
    /// Support ratio produced by the resolver
    pub agreement_ratio: f64,
    /// Conflict level from the analyzer
    pub conflict_level: f64,
    /// Coherence score from the analyzer
    pub coherence_score: f64,
    /// Merged outcome of the supporting decisions
    pub final_decision: Option<serde_json::Value>,
    /// Weight-normalized confidence of the supporting decisions
    pub final_confidence: f64,
    /// Digest over the canonical serialization of the final decision
    pub checksum: Option<String>,
    /// Participation fraction observed by the quorum method
    pub quorum_participation: Option<f64>,
    /// Lifecycle status
    pub status: SessionStatus,
    /// Reason the governance gate held this session, if it did
    pub hold_reason: Option<String>,
    /// Recorded reviewer decision
    pub review: Option<ReviewRecord>,
    /// Recorded override action
    pub override_record: Option<OverrideRecord>,
    /// Creation time
    pub created_at: Timestamp,
    /// Last mutation time
    pub updated_at: Timestamp,
}

impl ConsensusSession {
    /// Create a pending session.
    pub fn new(
        initiator_node: &str,
        decision_type: &str,
        participating_nodes: Vec<String>,
        method: ConsensusMethod,
    ) -> Self {
        let created = now();
        Self {
            session_id: Uuid::new_v4().to_string(),
            initiator_node: initiator_node.to_string(),
            decision_type: decision_type.to_string(),
            participating_nodes,
            method,
            graph: None,
            agreement_ratio: 0.0,
            conflict_level: 0.0,
            coherence_score: 1.0,
            final_decision: None,
            final_confidence: 0.0,
            checksum: None,
            quorum_participation: None,
            status: SessionStatus::Pending,
            hold_reason: None,
            review: None,
            override_record: None,
            created_at: created,
            updated_at: created,
        }
    }

    /// Advance the lifecycle status.
    pub fn transition(&mut self, to: SessionStatus) -> Result<()> {
        if !self.status.can_transition(to) {
            return Err(Error::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        self.updated_at = now();
        Ok(())
    }

    /// Record a reviewer decision and move the session accordingly.
    pub fn record_review(&mut self, reviewer: &str, approved: bool, justification: &str) -> Result<()> {
        if justification.trim().is_empty() {
            return Err(Error::Validation(
                "governance decisions require a justification".to_string(),
            ));
        }
        let target = if approved {
            SessionStatus::Approved
        } else {
            SessionStatus::Rejected
        };
        self.transition(target)?;
        self.review = Some(ReviewRecord {
            reviewer: reviewer.to_string(),
            approved,
            justification: justification.to_string(),
            decided_at: now(),
        });
        Ok(())
    }

    /// Record an explicit override of a held or rejected session.
    pub fn record_override(&mut self, actor: &str, justification: &str) -> Result<()> {
        if justification.trim().is_empty() {
            return Err(Error::Validation(
                "overrides require a justification".to_string(),
            ));
        }
        let previous = self.status;
        self.transition(SessionStatus::Overridden)?;
        self.override_record = Some(OverrideRecord {
            actor: actor.to_string(),
            justification: justification.to_string(),
            previous_status: previous,
            overridden_at: now(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ConsensusSession {
        ConsensusSession::new(
            "node-a",
            "scale-up",
            vec!["node-a".to_string(), "node-b".to_string()],
            ConsensusMethod::WeightedVote,
        )
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut s = session();
        s.transition(SessionStatus::Voting).unwrap();
        s.transition(SessionStatus::Approved).unwrap();
        s.transition(SessionStatus::Executed).unwrap();
        assert!(s.status.is_terminal());
    }

    #[test]
    fn test_backward_transition_rejected() {
        let mut s = session();
        s.transition(SessionStatus::Voting).unwrap();
        s.transition(SessionStatus::Approved).unwrap();

        let err = s.transition(SessionStatus::Voting).unwrap_err();
        assert_eq!(err.classification(), "invalid_transition");
    }

    #[test]
    fn test_review_requires_justification() {
        let mut s = session();
        s.transition(SessionStatus::Voting).unwrap();
        s.transition(SessionStatus::ReviewRequired).unwrap();

        assert!(s.record_review("reviewer-1", true, "  ").is_err());
        s.record_review("reviewer-1", true, "risk assessed, proceeding").unwrap();
        assert_eq!(s.status, SessionStatus::Approved);
        assert!(s.review.is_some());
    }

    #[test]
    fn test_override_from_rejected() {
        let mut s = session();
        s.transition(SessionStatus::Voting).unwrap();
        s.transition(SessionStatus::Rejected).unwrap();

        s.record_override("operator-1", "incident response requires this action")
            .unwrap();
        assert_eq!(s.status, SessionStatus::Overridden);
        assert!(s.status.is_broadcastable());
        assert_eq!(
            s.override_record.as_ref().unwrap().previous_status,
            SessionStatus::Rejected
        );
    }

    #[test]
    fn test_executed_is_frozen() {
        let mut s = session();
        s.transition(SessionStatus::Voting).unwrap();
        s.transition(SessionStatus::Approved).unwrap();
        s.transition(SessionStatus::Executed).unwrap();

        assert!(s.transition(SessionStatus::Overridden).is_err());
    }

    #[test]
    fn test_method_display() {
        assert_eq!(ConsensusMethod::WeightedVote.to_string(), "weighted-vote");
        assert_eq!(ConsensusMethod::Quorum.to_string(), "quorum");
    }
}
