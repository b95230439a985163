//! Consensus session lifecycle, resolution, and governance.

pub mod governance;
pub mod resolver;
pub mod session;

pub use governance::{GateDecision, GovernanceGate};
pub use resolver::{ConsensusResolver, Resolution};
pub use session::{ConsensusMethod, ConsensusSession, OverrideRecord, ReviewRecord, SessionStatus};
