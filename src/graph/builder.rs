//! Decision graph builder.
//!
//! Turns a flat list of per-node decisions into a weighted vertex set.

use crate::core::{now, Error, Result, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Declared stance of a node toward the proposed outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    /// The node backs the proposal
    Support,
    /// The node opposes the proposal
    Oppose,
}

/// A decision submitted by a single node. Immutable once part of a session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeDecision {
    /// Decision ID
    pub id: String,
    /// Proposing node
    pub node_id: String,
    /// Action this decision proposes (e.g. "scale-up")
    pub decision_type: String,
    /// Proposed parameters as a JSON object
    pub payload: serde_json::Value,
    /// Self-declared confidence (0-1)
    pub confidence: f64,
    /// Estimated impact (0-1)
    pub impact: f64,
    /// Priority on the 1-10 scale
    pub priority: u8,
    /// Stance toward the collective outcome
    pub stance: Stance,
    /// Decision this one depends on, if any
    pub depends_on: Option<String>,
    /// Submission time
    pub submitted_at: Timestamp,
}

impl NodeDecision {
    /// Create a new supporting decision with neutral defaults.
    pub fn new(node_id: &str, decision_type: &str, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            node_id: node_id.to_string(),
            decision_type: decision_type.to_string(),
            payload,
            confidence: 0.5,
            impact: 0.5,
            priority: 5,
            stance: Stance::Support,
            depends_on: None,
            submitted_at: now(),
        }
    }

    /// Set confidence.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Set impact.
    pub fn with_impact(mut self, impact: f64) -> Self {
        self.impact = impact.clamp(0.0, 1.0);
        self
    }

    /// Set priority (clamped to 1-10).
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority.clamp(1, 10);
        self
    }

    /// Set stance.
    pub fn with_stance(mut self, stance: Stance) -> Self {
        self.stance = stance;
        self
    }

    /// Declare a dependency on another decision.
    pub fn depends_on(mut self, decision_id: &str) -> Self {
        self.depends_on = Some(decision_id.to_string());
        self
    }
}

/// A graph vertex: a decision plus its derived voting weight.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecisionNode {
    /// The underlying decision
    pub decision: NodeDecision,
    /// Derived weight used by the resolver
    pub weight: f64,
}

/// A weighted decision graph. Edges are produced by the analyzer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecisionGraph {
    /// Graph vertices
    pub nodes: Vec<DecisionNode>,
}

impl DecisionGraph {
    /// Total weight across all vertices.
    pub fn total_weight(&self) -> f64 {
        self.nodes.iter().map(|n| n.weight).sum()
    }

    /// Look up a vertex by decision ID.
    pub fn node(&self, decision_id: &str) -> Option<&DecisionNode> {
        self.nodes.iter().find(|n| n.decision.id == decision_id)
    }

    /// Distinct participating node IDs, in first-seen order.
    pub fn participating_nodes(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for node in &self.nodes {
            if seen.insert(node.decision.node_id.clone()) {
                out.push(node.decision.node_id.clone());
            }
        }
        out
    }
}

/// Map the 1-10 priority scale onto a [0.5, 1.5] weight multiplier.
pub fn priority_factor(priority: u8) -> f64 {
    let p = priority.clamp(1, 10) as f64;
    0.5 + (p - 1.0) / 9.0
}

/// Builds a weighted decision graph from submitted decisions.
pub struct GraphBuilder;

impl GraphBuilder {
    /// Build the graph. Requires at least 2 decisions from distinct nodes.
    pub fn build(decisions: Vec<NodeDecision>) -> Result<DecisionGraph> {
        let distinct: HashSet<&str> = decisions.iter().map(|d| d.node_id.as_str()).collect();
        if decisions.len() < 2 || distinct.len() < 2 {
            return Err(Error::Validation(format!(
                "consensus requires at least 2 decisions from distinct nodes, got {} from {}",
                decisions.len(),
                distinct.len()
            )));
        }

        let nodes = decisions
            .into_iter()
            .map(|decision| {
                let weight = decision.confidence * 0.6
                    + decision.impact * 0.4 * priority_factor(decision.priority);
                DecisionNode { decision, weight }
            })
            .collect();

        Ok(DecisionGraph { nodes })
    }
}
