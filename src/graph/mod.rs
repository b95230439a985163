//! Decision graph construction and relationship analysis.

pub mod analyzer;
pub mod builder;

pub use analyzer::{AnalyzedGraph, DecisionEdge, RelationKind, RelationshipAnalyzer};
pub use builder::{DecisionGraph, DecisionNode, GraphBuilder, NodeDecision, Stance};
