//! Cluster Snapshot
//!
//! The externally observable projection of cluster state. Snapshots are
//! derived on demand and never mutate the state they summarize; two
//! snapshots taken with no mutation in between are identical.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ballot::{CandidateRegistry, VoteLedger};
use crate::state::{ClusterRoster, NodeRole, NodeStatus};

/// Observable state of one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// Node id
    pub id: String,
    /// UP or DOWN
    pub status: NodeStatus,
    /// Current role
    pub role: NodeRole,
    /// Convenience flag for observers
    pub is_leader: bool,
    /// Last term the node observed
    pub term: u64,
    /// Per-candidate tallies as seen from this node. All nodes read the
    /// same global ledger, so this is a linearized view: every node
    /// reports identical counts.
    pub votes: BTreeMap<String, u64>,
}

/// Point-in-time view of the whole cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    /// Whether initialize has run
    pub initialized: bool,
    /// Election session id, stamped at initialize
    pub session_id: Option<Uuid>,
    /// When the session started
    pub initialized_at: Option<DateTime<Utc>>,
    /// All roster nodes in stable id order
    pub nodes: Vec<NodeSnapshot>,
    /// Registered candidates in registration order
    pub candidates: Vec<String>,
    /// Aggregate per-candidate tallies
    pub tally: BTreeMap<String, u64>,
    /// Current acting leader, if any
    pub leader_id: Option<String>,
    /// Cluster term (the leader's term, or the highest observed)
    pub term: u64,
    /// Number of accepted votes
    pub total_votes: u64,
    /// Logical clock value
    pub lamport_clock: u64,
    /// Requests routed through the simulated load balancer
    pub request_counter: u64,
}

impl ClusterSnapshot {
    /// Snapshot of an uninitialized cluster
    pub fn uninitialized() -> Self {
        Self {
            initialized: false,
            session_id: None,
            initialized_at: None,
            nodes: Vec::new(),
            candidates: Vec::new(),
            tally: BTreeMap::new(),
            leader_id: None,
            term: 0,
            total_votes: 0,
            lamport_clock: 0,
            request_counter: 0,
        }
    }

    /// Whether any live node holds the leader role
    pub fn has_leader(&self) -> bool {
        self.leader_id.is_some()
    }
}

/// Assembles snapshots from the owned cluster components
pub struct SnapshotBuilder<'a> {
    pub session_id: Uuid,
    pub initialized_at: DateTime<Utc>,
    pub roster: &'a ClusterRoster,
    pub registry: &'a CandidateRegistry,
    pub ledger: &'a VoteLedger,
    pub lamport_clock: u64,
    pub request_counter: u64,
}

impl SnapshotBuilder<'_> {
    /// Build a snapshot. Pure: reads every component, mutates none.
    pub fn build(&self) -> ClusterSnapshot {
        let tally = self.ledger.tally(self.registry);

        let nodes: Vec<NodeSnapshot> = self
            .roster
            .all_nodes()
            .map(|node| NodeSnapshot {
                id: node.id.clone(),
                status: node.status,
                role: node.role,
                is_leader: node.is_acting_leader(),
                term: node.term,
                votes: tally.clone(),
            })
            .collect();

        let leader = self.roster.current_leader();

        ClusterSnapshot {
            initialized: true,
            session_id: Some(self.session_id),
            initialized_at: Some(self.initialized_at),
            nodes,
            candidates: self.registry.names().to_vec(),
            term: leader
                .map(|l| l.term)
                .unwrap_or_else(|| self.roster.highest_term()),
            leader_id: leader.map(|l| l.id.clone()),
            tally,
            total_votes: self.ledger.len() as u64,
            lamport_clock: self.lamport_clock,
            request_counter: self.request_counter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uninitialized_snapshot() {
        let snapshot = ClusterSnapshot::uninitialized();
        assert!(!snapshot.initialized);
        assert!(!snapshot.has_leader());
        assert!(snapshot.nodes.is_empty());
    }

    #[test]
    fn test_builder_reflects_components() {
        let ids: Vec<String> = vec!["node-1".into(), "node-2".into()];
        let mut roster = ClusterRoster::new(&ids);
        roster.set_leader("node-1", 1).unwrap();

        let mut registry = CandidateRegistry::new();
        registry.register("Alice").unwrap();

        let mut ledger = VoteLedger::new();
        ledger.record("v1", "Alice").unwrap();

        let snapshot = SnapshotBuilder {
            session_id: Uuid::new_v4(),
            initialized_at: Utc::now(),
            roster: &roster,
            registry: &registry,
            ledger: &ledger,
            lamport_clock: 1,
            request_counter: 1,
        }
        .build();

        assert_eq!(snapshot.leader_id.as_deref(), Some("node-1"));
        assert_eq!(snapshot.term, 1);
        assert_eq!(snapshot.tally["Alice"], 1);
        assert_eq!(snapshot.total_votes, 1);
        // every node reports the same linearized tally
        for node in &snapshot.nodes {
            assert_eq!(node.votes, snapshot.tally);
        }
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = ClusterSnapshot::uninitialized();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: ClusterSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
