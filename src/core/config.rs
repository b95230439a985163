//! Engine configuration and the opposing-action vocabulary.

use crate::core::Result;
use serde::{Deserialize, Serialize};

/// Tunable thresholds for the consensus pipeline and sync channel.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Weighted-vote approval threshold
    pub approval_threshold: f64,
    /// Minimum ratio for a failed vote to be held for review instead of rejected
    pub review_threshold: f64,
    /// Minimum participation fraction for the quorum method
    pub quorum_threshold: f64,
    /// Conflict level at or above which the governance gate engages
    pub conflict_threshold: f64,
    /// Agreement ratio required for the gate to auto-approve
    pub auto_approve_ratio: f64,
    /// Conflict level that must not be reached for the gate to auto-approve
    pub auto_approve_conflict: f64,
    /// Payload similarity above which two decisions support each other
    pub support_similarity: f64,
    /// Payload similarity below which opposing decision types conflict
    pub conflict_similarity: f64,
    /// Replay tolerance window for signed requests, in seconds
    pub replay_tolerance_secs: i64,
    /// Per-target broadcast delivery timeout, in seconds
    pub delivery_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            approval_threshold: 0.70,
            review_threshold: 0.40,
            quorum_threshold: 0.60,
            conflict_threshold: 0.50,
            auto_approve_ratio: 0.80,
            auto_approve_conflict: 0.30,
            support_similarity: 0.70,
            conflict_similarity: 0.30,
            replay_tolerance_secs: 300,
            delivery_timeout_secs: 10,
        }
    }
}

/// A pair of semantically opposing decision types.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpposingPair {
    pub a: String,
    pub b: String,
}

/// Versioned vocabulary of opposing action pairs.
///
/// Maintained as configuration data rather than code so deployments can extend
/// the vocabulary without rebuilding.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OppositionTable {
    /// Vocabulary version
    pub version: String,
    /// Opposing pairs (symmetric)
    pub pairs: Vec<OpposingPair>,
}

impl OppositionTable {
    /// Create an empty table.
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            pairs: Vec::new(),
        }
    }

    /// Built-in vocabulary shipped with the engine.
    pub fn with_defaults() -> Self {
        let mut table = Self::new("1.0.0");
        for (a, b) in [
            ("scale-up", "scale-down"),
            ("scale-out", "scale-in"),
            ("increase-restriction", "reduce-restriction"),
            ("allocate-resources", "release-resources"),
            ("enable-feature", "disable-feature"),
            ("expand-capacity", "reduce-capacity"),
        ] {
            table = table.with_pair(a, b);
        }
        table
    }

    /// Add an opposing pair.
    pub fn with_pair(mut self, a: &str, b: &str) -> Self {
        self.pairs.push(OpposingPair {
            a: a.to_string(),
            b: b.to_string(),
        });
        self
    }

    /// Check whether two decision types oppose each other (symmetric).
    pub fn opposes(&self, a: &str, b: &str) -> bool {
        self.pairs
            .iter()
            .any(|p| (p.a == a && p.b == b) || (p.a == b && p.b == a))
    }

    /// Load a table from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = EngineConfig::default();
        assert_eq!(config.approval_threshold, 0.70);
        assert_eq!(config.review_threshold, 0.40);
        assert_eq!(config.replay_tolerance_secs, 300);
    }

    #[test]
    fn test_opposes_is_symmetric() {
        let table = OppositionTable::with_defaults();
        assert!(table.opposes("scale-up", "scale-down"));
        assert!(table.opposes("scale-down", "scale-up"));
        assert!(!table.opposes("scale-up", "enable-feature"));
    }

    #[test]
    fn test_table_json_roundtrip() {
        let table = OppositionTable::new("2.0.0").with_pair("open", "close");
        let json = table.to_json().unwrap();
        let parsed = OppositionTable::from_json(&json).unwrap();
        assert_eq!(parsed.version, "2.0.0");
        assert!(parsed.opposes("close", "open"));
    }
}
