//! Core utilities and common types for the consensus engine.

pub mod config;
pub mod error;
pub mod types;

pub use config::{EngineConfig, OppositionTable};
pub use error::{Error, Result};
pub use types::*;
