//! Consensus resolver.
//!
//! Applies the selected voting method to an analyzed graph and produces the
//! merged outcome, its confidence, and an integrity checksum.

use crate::channel::crypto::payload_checksum;
use crate::consensus::session::{ConsensusMethod, SessionStatus};
use crate::core::{EngineConfig, Result};
use crate::graph::analyzer::AnalyzedGraph;
use crate::graph::builder::{DecisionNode, Stance};
use serde::{Deserialize, Serialize};

/// Outcome of applying a voting method.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Resolution {
    /// Method applied
    pub method: ConsensusMethod,
    /// Support ratio under that method
    pub agreement_ratio: f64,
    /// Merged payload of the supporting decisions
    pub final_decision: serde_json::Value,
    /// Weight-normalized average confidence of the supporting decisions
    pub final_confidence: f64,
    /// Hex digest over the canonical serialization of `final_decision`
    pub checksum: String,
    /// Resolved status before the governance gate runs
    pub status: SessionStatus,
    /// Supporting decision count
    pub supporting: usize,
    /// Opposing decision count
    pub opposing: usize,
    /// Participation fraction (quorum method only)
    pub participation: Option<f64>,
    /// False only when the quorum method saw insufficient participation
    pub quorum_met: bool,
}

/// Applies voting methods to analyzed graphs. Pure per-call component.
pub struct ConsensusResolver<'a> {
    config: &'a EngineConfig,
}

impl<'a> ConsensusResolver<'a> {
    /// Create a resolver over the given configuration.
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Resolve the vote. `registered_count` is the quorum denominator supplied
    /// by the node registry.
    pub fn resolve(
        &self,
        analyzed: &AnalyzedGraph,
        method: ConsensusMethod,
        registered_count: usize,
    ) -> Result<Resolution> {
        let nodes = &analyzed.graph.nodes;
        let supporting = nodes.iter().filter(|n| n.decision.stance == Stance::Support).count();
        let opposing = nodes.len() - supporting;

        let weighted_ratio = {
            let total: f64 = nodes.iter().map(|n| n.weight).sum();
            if total == 0.0 {
                0.0
            } else {
                nodes
                    .iter()
                    .filter(|n| n.decision.stance == Stance::Support)
                    .map(|n| n.weight)
                    .sum::<f64>()
                    / total
            }
        };
        let count_ratio = supporting as f64 / nodes.len() as f64;

        let mut participation = None;
        let (ratio, approved, quorum_met) = match method {
            ConsensusMethod::WeightedVote => (
                weighted_ratio,
                weighted_ratio >= self.config.approval_threshold,
                true,
            ),
            ConsensusMethod::Unanimous => (weighted_ratio, opposing == 0, true),
            ConsensusMethod::Majority => (count_ratio, count_ratio > 0.5, true),
            ConsensusMethod::Quorum => {
                let participants = analyzed.graph.participating_nodes().len();
                let fraction = if registered_count == 0 {
                    0.0
                } else {
                    participants as f64 / registered_count as f64
                };
                participation = Some(fraction);
                let met = fraction >= self.config.quorum_threshold;
                (count_ratio, met && count_ratio > 0.5, met)
            }
        };

        let status = if !quorum_met {
            SessionStatus::ReviewRequired
        } else if approved && analyzed.conflict_level < self.config.conflict_threshold {
            SessionStatus::Approved
        } else if ratio >= self.config.review_threshold {
            SessionStatus::ReviewRequired
        } else {
            SessionStatus::Rejected
        };

        let supporters: Vec<&DecisionNode> = nodes
            .iter()
            .filter(|n| n.decision.stance == Stance::Support)
            .collect();
        let final_decision = merge_supporting(&supporters);
        let checksum = payload_checksum(&final_decision)?;

        let final_confidence = {
            let total: f64 = supporters.iter().map(|n| n.weight).sum();
            if total == 0.0 {
                0.0
            } else {
                supporters
                    .iter()
                    .map(|n| n.weight * n.decision.confidence)
                    .sum::<f64>()
                    / total
            }
        };

        Ok(Resolution {
            method,
            agreement_ratio: ratio,
            final_decision,
            final_confidence,
            checksum,
            status,
            supporting,
            opposing,
            participation,
            quorum_met,
        })
    }
}

/// Field-level merge of the supporting payloads.
///
/// For each field the value proposed by the highest-weight decision wins; ties
/// break to the earliest submission, then to the smallest decision ID so the
/// result never depends on input order.
fn merge_supporting(supporters: &[&DecisionNode]) -> serde_json::Value {
    let mut fields = std::collections::BTreeSet::new();
    for node in supporters {
        if let Some(object) = node.decision.payload.as_object() {
            fields.extend(object.keys().cloned());
        }
    }

    let mut merged = serde_json::Map::new();
    for key in fields {
        let winner = supporters
            .iter()
            .filter(|n| n.decision.payload.get(&key).is_some())
            .max_by(|a, b| {
                // Highest weight first, then earliest submission, then smallest ID.
                a.weight
                    .partial_cmp(&b.weight)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.decision.submitted_at.cmp(&a.decision.submitted_at))
                    .then_with(|| b.decision.id.cmp(&a.decision.id))
            });
        if let Some(node) = winner {
            if let Some(value) = node.decision.payload.get(&key) {
                merged.insert(key, value.clone());
            }
        }
    }

    serde_json::Value::Object(merged)
}
