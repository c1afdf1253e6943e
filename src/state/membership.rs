//! Cluster Membership Management
//!
//! Tracks the fixed node roster: liveness, roles, and terms.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Node status in the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeStatus {
    /// Node is alive and participating
    Up,
    /// Node has been failed by the simulator
    Down,
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeStatus::Up => write!(f, "UP"),
            NodeStatus::Down => write!(f, "DOWN"),
        }
    }
}

/// Role of a node in the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    /// Node is the cluster leader
    Leader,
    /// Node is a follower
    Follower,
    /// Node is a candidate (during election)
    Candidate,
}

impl std::fmt::Display for NodeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeRole::Leader => write!(f, "LEADER"),
            NodeRole::Follower => write!(f, "FOLLOWER"),
            NodeRole::Candidate => write!(f, "CANDIDATE"),
        }
    }
}

/// State of a single node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeState {
    /// Unique node identifier
    pub id: String,
    /// Current status
    pub status: NodeStatus,
    /// Current role
    pub role: NodeRole,
    /// Last term this node observed
    pub term: u64,
}

impl NodeState {
    /// Create a new node state
    pub fn new(id: String) -> Self {
        Self {
            id,
            status: NodeStatus::Up,
            role: NodeRole::Follower,
            term: 0,
        }
    }

    /// Check if the node is alive
    pub fn is_up(&self) -> bool {
        self.status == NodeStatus::Up
    }

    /// Check if the node is the acting leader (leader role and alive)
    pub fn is_acting_leader(&self) -> bool {
        self.role == NodeRole::Leader && self.is_up()
    }
}

/// The fixed node roster
///
/// Nodes are created once and never removed, only marked Down.
/// Keyed by id in a BTreeMap so iteration order is stable.
pub struct ClusterRoster {
    nodes: BTreeMap<String, NodeState>,
}

impl ClusterRoster {
    /// Create a roster from a fixed list of node ids, all Up
    pub fn new(ids: &[String]) -> Self {
        let nodes = ids
            .iter()
            .map(|id| (id.clone(), NodeState::new(id.clone())))
            .collect();

        Self { nodes }
    }

    /// Get a node's state
    pub fn get(&self, id: &str) -> Option<&NodeState> {
        self.nodes.get(id)
    }

    /// Mark a node Down, clearing its leader role if it held one.
    /// Returns the node's state as it was before the failure.
    pub fn fail(&mut self, id: &str) -> Result<NodeState> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| Error::NodeNotFound(id.to_string()))?;

        let before = node.clone();
        node.status = NodeStatus::Down;
        if node.role == NodeRole::Leader {
            // a Down node never keeps the leader role
            node.role = NodeRole::Follower;
        }

        Ok(before)
    }

    /// All nodes in stable id order
    pub fn all_nodes(&self) -> impl Iterator<Item = &NodeState> {
        self.nodes.values()
    }

    /// All live nodes
    pub fn up_nodes(&self) -> Vec<&NodeState> {
        self.nodes.values().filter(|n| n.is_up()).collect()
    }

    /// The current acting leader, if any
    pub fn current_leader(&self) -> Option<&NodeState> {
        self.nodes.values().find(|n| n.is_acting_leader())
    }

    /// Highest term observed by any node
    pub fn highest_term(&self) -> u64 {
        self.nodes.values().map(|n| n.term).max().unwrap_or(0)
    }

    /// Install a new leader for the given term: the winner takes the
    /// leader role and the term, every other live node becomes a follower.
    pub fn set_leader(&mut self, leader_id: &str, term: u64) -> Result<()> {
        if !self.nodes.contains_key(leader_id) {
            return Err(Error::NodeNotFound(leader_id.to_string()));
        }

        for node in self.nodes.values_mut() {
            if node.id == leader_id {
                node.role = NodeRole::Leader;
                node.term = term;
            } else if node.is_up() {
                node.role = NodeRole::Follower;
                node.term = term;
            }
        }

        Ok(())
    }

    /// Total roster size
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the roster is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
