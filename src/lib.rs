//! Votary - Simulated Distributed Cluster for Leader Election and Voting
//!
//! A single-process simulation of a small cluster: a fixed roster of nodes
//! elects a leader, tolerates simulated node failures by re-electing, and
//! processes votes for candidates through the leader, exposing a consistent
//! aggregate view to observers over HTTP.
//!
//! # Architecture
//!
//! All mutating commands (initialize, add-candidate, vote, fail-node) are
//! serialized through a single owned `Cluster` value; every mutation returns
//! a fresh snapshot plus a human-readable log of what happened. Failure
//! detection is explicit and instantaneous: failing the leader re-elects
//! within the same command, so the cluster self-heals before the call
//! returns.
//!
//! # Features
//!
//! - Deterministic leader election with monotonic terms
//! - Simulated node failure with immediate failover
//! - One-vote-per-voter ledger with tallies derived from ledger contents
//! - Lamport clock and round-robin load balancer simulation
//! - HTTP API matching the observer UI contract

pub mod api;
pub mod ballot;
pub mod cluster;
pub mod config;
pub mod error;
pub mod state;

pub use config::VotaryConfig;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ballot::{CandidateRegistry, VoteLedger};
    pub use crate::cluster::{Cluster, ClusterSnapshot, CommandOutcome};
    pub use crate::config::VotaryConfig;
    pub use crate::error::{Error, Result};
    pub use crate::state::{ClusterRoster, NodeRole, NodeState, NodeStatus};
}
