//! # Accord — cooperative decision consensus
//!
//! A decision-consensus engine for a small, known set of cooperating nodes,
//! plus the authenticated sync channel they exchange state over:
//! - **graph**: weighted decision graphs and pairwise relationship analysis
//! - **consensus**: voting methods, session lifecycle, governance gate
//! - **broadcast**: concurrent fan-out of approved decisions
//! - **channel**: mutual authentication, integrity, replay defense, idempotent
//!   delivery
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use accord::graph::{GraphBuilder, NodeDecision};
//! use serde_json::json;
//!
//! let graph = GraphBuilder::build(vec![
//!     NodeDecision::new("node-a", "scale-up", json!({"replicas": 3})),
//!     NodeDecision::new("node-b", "scale-up", json!({"replicas": 5})),
//! ])
//! .unwrap();
//! println!("total weight: {}", graph.total_weight());
//! ```

pub mod audit;
pub mod broadcast;
pub mod channel;
pub mod consensus;
pub mod core;
pub mod engine;
pub mod graph;
pub mod registry;
pub mod store;

pub use crate::core::error::{Error, Result};
pub use crate::engine::{ConsensusEngine, EngineDeps, OrchestrateOutcome, OrchestrateRequest};
