//! State Management Module
//!
//! Holds the simulated node roster and the leader election logic
//! that operates on it.

mod membership;
pub mod election;

pub use election::{elect_if_needed, ElectionOutcome};
pub use membership::{ClusterRoster, NodeRole, NodeState, NodeStatus};
