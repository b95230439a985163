//! Governance gate.
//!
//! Decides whether a resolved consensus may auto-execute or must be held for
//! an external reviewer. Held sessions are visible states, never discarded.

use crate::consensus::resolver::Resolution;
use crate::consensus::session::SessionStatus;
use crate::core::EngineConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Outcome of the gate evaluation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateDecision {
    /// The session may proceed without manual review
    AutoApproved,
    /// The session is held at review_required for an external decision
    Held(String),
    /// The gate did not engage; the resolver status stands
    NotTriggered,
}

/// Escalation checkpoint between resolution and execution.
pub struct GovernanceGate<'a> {
    config: &'a EngineConfig,
}

impl<'a> GovernanceGate<'a> {
    /// Create a gate over the given configuration.
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Evaluate a resolution and return the status the session should take.
    ///
    /// The gate engages when the caller requested review, the conflict level
    /// reaches the threshold, or the resolver itself asked for review. A
    /// rejected resolution is never upgraded here; the explicit override
    /// action is the only path out of rejection.
    pub fn evaluate(
        &self,
        session_id: &str,
        resolution: &Resolution,
        conflict_level: f64,
        review_requested: bool,
    ) -> (SessionStatus, GateDecision) {
        if resolution.status == SessionStatus::Rejected {
            return (SessionStatus::Rejected, GateDecision::NotTriggered);
        }

        let triggered = review_requested
            || conflict_level >= self.config.conflict_threshold
            || resolution.status == SessionStatus::ReviewRequired;

        if !triggered {
            return (resolution.status, GateDecision::NotTriggered);
        }

        // Insufficient participation is never bypassed: a high ratio among the
        // few nodes that showed up says nothing about the registered set.
        if resolution.quorum_met
            && resolution.agreement_ratio >= self.config.auto_approve_ratio
            && conflict_level < self.config.auto_approve_conflict
        {
            info!(
                session_id,
                ratio = resolution.agreement_ratio,
                conflict = conflict_level,
                "governance gate auto-approved session"
            );
            return (SessionStatus::Approved, GateDecision::AutoApproved);
        }

        let reason = if !resolution.quorum_met {
            "insufficient quorum participation".to_string()
        } else if review_requested {
            "manual review requested by caller".to_string()
        } else if conflict_level >= self.config.conflict_threshold {
            format!(
                "conflict level {:.2} at or above threshold {:.2}",
                conflict_level, self.config.conflict_threshold
            )
        } else {
            format!(
                "agreement ratio {:.2} below approval threshold",
                resolution.agreement_ratio
            )
        };

        info!(session_id, %reason, "governance gate held session for review");
        (SessionStatus::ReviewRequired, GateDecision::Held(reason))
    }
}
