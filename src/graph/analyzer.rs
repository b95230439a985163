//! Relationship analyzer.
//!
//! Classifies every pair of decisions and scores overall coherence.

use crate::core::{EngineConfig, OppositionTable};
use crate::graph::builder::{DecisionGraph, NodeDecision};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Kind of relation between two decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    /// Payloads align closely
    Supports,
    /// Divergent payloads with semantically opposing actions
    Conflicts,
    /// One decision declares the other as a prerequisite (directional)
    Depends,
    /// No meaningful relation
    Neutral,
}

/// An edge between two decisions.
///
/// `Supports`/`Conflicts`/`Neutral` edges are symmetric; `Depends` points from
/// the dependent decision (`a`) to its prerequisite (`b`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecisionEdge {
    /// First decision ID
    pub a: String,
    /// Second decision ID
    pub b: String,
    /// Relation kind
    pub relation: RelationKind,
    /// Relation strength (0-1)
    pub strength: f64,
    /// Human-readable reason
    pub reason: String,
}

impl DecisionEdge {
    /// Check whether this edge connects the two given decisions, either way around.
    pub fn connects(&self, x: &str, y: &str) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }
}

/// Output of the analyzer: the graph plus its classified edges and scores.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalyzedGraph {
    /// The weighted vertex set
    pub graph: DecisionGraph,
    /// All classified edges
    pub edges: Vec<DecisionEdge>,
    /// Conflict edges, retained separately for reporting
    pub conflicting_pairs: Vec<DecisionEdge>,
    /// conflict_edges / total_edges
    pub conflict_level: f64,
    /// 1 - conflict_level
    pub coherence_score: f64,
}

/// Pure, deterministic pairwise classifier.
pub struct RelationshipAnalyzer<'a> {
    config: &'a EngineConfig,
    opposition: &'a OppositionTable,
}

impl<'a> RelationshipAnalyzer<'a> {
    /// Create an analyzer over the given configuration.
    pub fn new(config: &'a EngineConfig, opposition: &'a OppositionTable) -> Self {
        Self { config, opposition }
    }

    /// Classify every unordered pair of decisions.
    pub fn analyze(&self, graph: DecisionGraph) -> AnalyzedGraph {
        let mut edges = Vec::new();

        for i in 0..graph.nodes.len() {
            for j in (i + 1)..graph.nodes.len() {
                let a = &graph.nodes[i].decision;
                let b = &graph.nodes[j].decision;
                edges.push(self.classify(a, b));
            }
        }

        let conflicting_pairs: Vec<DecisionEdge> = edges
            .iter()
            .filter(|e| e.relation == RelationKind::Conflicts)
            .cloned()
            .collect();

        let conflict_level = if edges.is_empty() {
            0.0
        } else {
            conflicting_pairs.len() as f64 / edges.len() as f64
        };

        AnalyzedGraph {
            graph,
            edges,
            conflicting_pairs,
            conflict_level,
            coherence_score: 1.0 - conflict_level,
        }
    }

    fn classify(&self, a: &NodeDecision, b: &NodeDecision) -> DecisionEdge {
        // Declared dependencies win over similarity.
        if a.depends_on.as_deref() == Some(b.id.as_str()) {
            return DecisionEdge {
                a: a.id.clone(),
                b: b.id.clone(),
                relation: RelationKind::Depends,
                strength: 1.0,
                reason: format!("'{}' declares '{}' as a prerequisite", a.id, b.id),
            };
        }
        if b.depends_on.as_deref() == Some(a.id.as_str()) {
            return DecisionEdge {
                a: b.id.clone(),
                b: a.id.clone(),
                relation: RelationKind::Depends,
                strength: 1.0,
                reason: format!("'{}' declares '{}' as a prerequisite", b.id, a.id),
            };
        }

        let similarity = field_overlap(&a.payload, &b.payload);

        if similarity > self.config.support_similarity {
            DecisionEdge {
                a: a.id.clone(),
                b: b.id.clone(),
                relation: RelationKind::Supports,
                strength: similarity,
                reason: format!("payload similarity {:.2} indicates aligned proposals", similarity),
            }
        } else if similarity < self.config.conflict_similarity
            && self.opposition.opposes(&a.decision_type, &b.decision_type)
        {
            DecisionEdge {
                a: a.id.clone(),
                b: b.id.clone(),
                relation: RelationKind::Conflicts,
                strength: 1.0 - similarity,
                reason: format!(
                    "'{}' opposes '{}' with divergent payloads (similarity {:.2})",
                    a.decision_type, b.decision_type, similarity
                ),
            }
        } else {
            DecisionEdge {
                a: a.id.clone(),
                b: b.id.clone(),
                relation: RelationKind::Neutral,
                strength: similarity,
                reason: "no significant relation".to_string(),
            }
        }
    }
}

/// Field-set overlap ratio between two JSON payloads.
///
/// Non-object payloads contribute no fields; two decisions with no fields at
/// all score 0.0.
fn field_overlap(a: &serde_json::Value, b: &serde_json::Value) -> f64 {
    let keys_a: HashSet<&String> = a.as_object().map(|o| o.keys().collect()).unwrap_or_default();
    let keys_b: HashSet<&String> = b.as_object().map(|o| o.keys().collect()).unwrap_or_default();

    let union = keys_a.union(&keys_b).count();
    if union == 0 {
        return 0.0;
    }
    keys_a.intersection(&keys_b).count() as f64 / union as f64
}
