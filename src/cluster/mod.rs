//! Cluster Command Core
//!
//! The single serialization point for all cluster-mutating commands.
//! `Cluster` owns the roster, the candidate registry, and the vote ledger;
//! every command mutates through it and returns the resulting snapshot
//! together with a human-readable log of what happened, so a caller never
//! needs a separate read after a write.

mod snapshot;

pub use snapshot::{ClusterSnapshot, NodeSnapshot, SnapshotBuilder};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::ballot::{CandidateRegistry, VoteLedger};
use crate::error::Error;
use crate::state::{elect_if_needed, ClusterRoster, ElectionOutcome};

/// Ordered event log for a single command, oldest entry first.
///
/// Not persisted history: each command starts with an empty log and the
/// entries describe only what that command caused.
#[derive(Debug, Default)]
pub struct CommandLog {
    entries: Vec<String>,
}

impl CommandLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry
    pub fn push(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into());
    }

    /// Entries appended so far
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Consume the log, yielding its entries
    pub fn into_entries(self) -> Vec<String> {
        self.entries
    }
}

/// Result of a mutating command: what happened, plus the fresh snapshot
#[derive(Debug)]
pub struct CommandOutcome {
    /// Human-readable events caused by this command, oldest first
    pub log: Vec<String>,
    /// Cluster state after the command
    pub snapshot: ClusterSnapshot,
    /// Short status line for the caller, when there is one
    pub message: Option<String>,
}

/// State present once initialize has run
struct Session {
    id: Uuid,
    started_at: DateTime<Utc>,
    roster: ClusterRoster,
    registry: CandidateRegistry,
    ledger: VoteLedger,
    lamport_clock: u64,
    request_counter: u64,
}

impl Session {
    fn snapshot(&self) -> ClusterSnapshot {
        SnapshotBuilder {
            session_id: self.id,
            initialized_at: self.started_at,
            roster: &self.roster,
            registry: &self.registry,
            ledger: &self.ledger,
            lamport_clock: self.lamport_clock,
            request_counter: self.request_counter,
        }
        .build()
    }
}

/// The simulated cluster
///
/// Lifecycle: Uninitialized until `initialize` runs, then Leaderless or
/// Stable depending on the live roster. There is no terminal state; the
/// cluster always accepts further commands.
pub struct Cluster {
    node_ids: Vec<String>,
    session: Option<Session>,
}

impl Cluster {
    /// Create an uninitialized cluster with a fixed roster of node ids
    pub fn new(node_ids: Vec<String>) -> Self {
        Self {
            node_ids,
            session: None,
        }
    }

    /// (Re)create the node roster, clear candidates and votes, and run
    /// the first election. Always succeeds.
    pub fn initialize(&mut self) -> CommandOutcome {
        let mut log = CommandLog::new();
        log.push("[INIT] Initializing system...");

        let mut session = Session {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            roster: ClusterRoster::new(&self.node_ids),
            registry: CandidateRegistry::new(),
            ledger: VoteLedger::new(),
            lamport_clock: 0,
            request_counter: 0,
        };

        tracing::info!(session = %session.id, nodes = self.node_ids.len(), "cluster initialized");

        elect_if_needed(&mut session.roster, &mut log);

        log.push(format!(
            "[INIT] System reset complete. {} nodes created. Session {}.",
            self.node_ids.len(),
            session.id
        ));

        let snapshot = session.snapshot();
        self.session = Some(session);

        CommandOutcome {
            log: log.into_entries(),
            snapshot,
            message: Some("System initialized.".to_string()),
        }
    }

    /// Register a candidate. A reused name is a reported rejection.
    pub fn add_candidate(&mut self, name: &str) -> CommandOutcome {
        let mut log = CommandLog::new();
        let session = match self.session_or_reject(&mut log) {
            Some(s) => s,
            None => return Self::rejected(log, ClusterSnapshot::uninitialized()),
        };

        let message = match session.registry.register(name) {
            Ok(()) => {
                log.push(format!("[ADMIN] Added new candidate: {}.", name));
                tracing::info!(candidate = name, "candidate registered");
                Some(format!("Candidate '{}' registered.", name))
            }
            Err(err) => {
                log.push(format!("[ADMIN] Rejected: {}.", err));
                tracing::warn!(candidate = name, %err, "candidate registration rejected");
                Some(err.to_string())
            }
        };

        CommandOutcome {
            snapshot: session.snapshot(),
            log: log.into_entries(),
            message,
        }
    }

    /// Cast a vote through the leader. Unknown candidates and repeat
    /// voters are reported rejections; the ledger is untouched by either.
    pub fn cast_vote(&mut self, voter_id: &str, candidate: &str) -> CommandOutcome {
        let mut log = CommandLog::new();
        let node_ids = self.node_ids.clone();
        let session = match self.session_or_reject(&mut log) {
            Some(s) => s,
            None => return Self::rejected(log, ClusterSnapshot::uninitialized()),
        };

        log.push("[RPC-SIM] Received vote request from client.");

        session.lamport_clock += 1;
        log.push(format!(
            "[CLOCK L:{}] Lamport clock incremented for vote event.",
            session.lamport_clock
        ));

        session.request_counter += 1;
        // round-robin has nothing to pick from on an empty roster
        if !node_ids.is_empty() {
            let entry_node = &node_ids[(session.request_counter as usize - 1) % node_ids.len()];
            log.push(format!(
                "[LOAD BALANCER] Request #{}. Round-robin chose {} as entry node.",
                session.request_counter, entry_node
            ));
        }

        // Self-heal before processing: a vote arriving with no acting
        // leader triggers an election in the same command.
        if session.roster.current_leader().is_none() {
            log.push("[LEADER CHECK] Leader is down!");
            elect_if_needed(&mut session.roster, &mut log);
        }

        let leader_id = session.roster.current_leader().map(|l| l.id.clone());
        match &leader_id {
            Some(id) => {
                log.push(format!("[RPC-SIM] Request forwarded to leader: {}.", id))
            }
            // The vote is still accepted: with no real partition to reason
            // about, a leaderless ledger write cannot be observed as
            // inconsistent by anyone.
            None => log.push("[LEADER CHECK] No leader available; accepting vote directly."),
        }

        if !session.registry.contains(candidate) {
            let err = Error::UnknownCandidate(candidate.to_string());
            log.push(format!("[LEADER] Rejecting vote: {}.", err));
            tracing::warn!(voter = voter_id, candidate, "vote for unknown candidate rejected");
            return CommandOutcome {
                snapshot: session.snapshot(),
                log: log.into_entries(),
                message: Some(err.to_string()),
            };
        }

        if let Err(err) = session.ledger.record(voter_id, candidate) {
            log.push(format!("[LEADER] Rejecting vote: {}.", err));
            tracing::warn!(voter = voter_id, %err, "vote rejected");
            return CommandOutcome {
                snapshot: session.snapshot(),
                log: log.into_entries(),
                message: Some(err.to_string()),
            };
        }

        match &leader_id {
            Some(id) => log.push(format!(
                "[LEADER - {}] Vote for '{}' validated and recorded.",
                id, candidate
            )),
            None => log.push(format!(
                "[LEDGER] Vote for '{}' recorded without a leader.",
                candidate
            )),
        }

        let followers = session
            .roster
            .up_nodes()
            .iter()
            .filter(|n| Some(&n.id) != leader_id.as_ref())
            .count();
        log.push(format!(
            "[REPLICATION] Replicating ledger state to {} live follower node(s).",
            followers
        ));
        log.push("[REPLICATION] State consistent across all live nodes.");
        tracing::info!(voter = voter_id, candidate, "vote recorded");

        CommandOutcome {
            snapshot: session.snapshot(),
            log: log.into_entries(),
            message: Some("Vote cast successfully.".to_string()),
        }
    }

    /// Simulate a node failure. Failing the leader triggers re-election
    /// within the same command; failing a Down node is a success no-op.
    pub fn fail_node(&mut self, node_id: &str) -> CommandOutcome {
        let mut log = CommandLog::new();
        let session = match self.session_or_reject(&mut log) {
            Some(s) => s,
            None => return Self::rejected(log, ClusterSnapshot::uninitialized()),
        };

        let is_up = session.roster.get(node_id).map(|n| n.is_up());
        let message = match is_up {
            None => {
                let err = Error::NodeNotFound(node_id.to_string());
                log.push(format!("[FAILURE] Rejected: {}.", err));
                tracing::warn!(node = node_id, "fail-node for unknown node rejected");
                Some(err.to_string())
            }
            Some(false) => {
                log.push(format!(
                    "[FAILURE] Node {} is already DOWN; nothing to do.",
                    node_id
                ));
                Some(format!("Node {} was already down.", node_id))
            }
            Some(true) => {
                let before = session
                    .roster
                    .fail(node_id)
                    .expect("node existence checked above");
                log.push(format!(
                    "!! FAILURE SIMULATED !! Node {} has been shut down.",
                    node_id
                ));
                tracing::info!(node = node_id, was_leader = before.is_acting_leader(), "node failed");

                if before.is_acting_leader() {
                    log.push("[LEADER CHECK] Leader is down!");
                    match elect_if_needed(&mut session.roster, &mut log) {
                        ElectionOutcome::Elected { leader_id, term } => {
                            Some(format!("Node failed; {} leads term {}.", leader_id, term))
                        }
                        ElectionOutcome::NoQuorum => {
                            Some(format!("Node {} failed; cluster is leaderless.", node_id))
                        }
                        ElectionOutcome::Unchanged { .. } => {
                            Some(format!("Node {} failed.", node_id))
                        }
                    }
                } else {
                    Some(format!("Node {} failed.", node_id))
                }
            }
        };

        CommandOutcome {
            snapshot: session.snapshot(),
            log: log.into_entries(),
            message,
        }
    }

    /// Pure read of the current state. Never mutates anything.
    pub fn snapshot(&self) -> ClusterSnapshot {
        match &self.session {
            Some(session) => session.snapshot(),
            None => ClusterSnapshot::uninitialized(),
        }
    }

    fn session_or_reject(&mut self, log: &mut CommandLog) -> Option<&mut Session> {
        if self.session.is_none() {
            let err = Error::NotInitialized;
            log.push(format!("[REJECTED] {}.", err));
        }
        self.session.as_mut()
    }

    fn rejected(log: CommandLog, snapshot: ClusterSnapshot) -> CommandOutcome {
        CommandOutcome {
            log: log.into_entries(),
            snapshot,
            message: Some(Error::NotInitialized.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::NodeRole;

    fn cluster(n: usize) -> Cluster {
        let ids = (1..=n).map(|i| format!("node-{}", i)).collect();
        let mut cluster = Cluster::new(ids);
        cluster.initialize();
        cluster
    }

    fn leader_count(snapshot: &ClusterSnapshot) -> usize {
        snapshot.nodes.iter().filter(|n| n.is_leader).count()
    }

    #[test]
    fn test_initialize_elects_first_leader() {
        let mut c = Cluster::new(vec!["node-1".into(), "node-2".into(), "node-3".into()]);
        let outcome = c.initialize();

        assert_eq!(outcome.snapshot.leader_id.as_deref(), Some("node-1"));
        assert_eq!(outcome.snapshot.term, 1);
        assert!(outcome.log.iter().any(|l| l.contains("elected leader")));
    }

    #[test]
    fn test_initialize_resets_session() {
        let mut c = cluster(3);
        c.add_candidate("Alice");
        c.cast_vote("v1", "Alice");
        let first_session = c.snapshot().session_id;

        let outcome = c.initialize();
        assert!(outcome.snapshot.candidates.is_empty());
        assert_eq!(outcome.snapshot.total_votes, 0);
        assert_ne!(outcome.snapshot.session_id, first_session);
    }

    #[test]
    fn test_commands_before_initialize_are_rejected() {
        let mut c = Cluster::new(vec!["node-1".into()]);

        let outcome = c.cast_vote("v1", "Alice");
        assert!(!outcome.snapshot.initialized);
        assert!(outcome.log[0].contains("not initialized"));

        let outcome = c.fail_node("node-1");
        assert!(outcome.log[0].contains("not initialized"));
    }

    #[test]
    fn test_fail_leader_reelects_with_higher_term() {
        let mut c = cluster(3);
        let outcome = c.fail_node("node-1");

        let leader = outcome.snapshot.leader_id.clone().unwrap();
        assert_ne!(leader, "node-1");
        assert_eq!(outcome.snapshot.term, 2);
        let leader_node = outcome
            .snapshot
            .nodes
            .iter()
            .find(|n| n.id == leader)
            .unwrap();
        assert_eq!(leader_node.status, crate::state::NodeStatus::Up);
    }

    #[test]
    fn test_at_most_one_leader_for_any_fail_sequence() {
        let mut c = cluster(4);
        for id in ["node-3", "node-1", "node-9", "node-2", "node-4"] {
            let outcome = c.fail_node(id);
            assert!(leader_count(&outcome.snapshot) <= 1);
        }
    }

    #[test]
    fn test_fail_all_nodes_leaves_leaderless_no_quorum() {
        let mut c = cluster(2);
        c.fail_node("node-1");
        let outcome = c.fail_node("node-2");

        assert!(outcome.snapshot.leader_id.is_none());
        assert_eq!(leader_count(&outcome.snapshot), 0);
        assert!(outcome.log.iter().any(|l| l.contains("No quorum")));

        // re-failing a Down node is a success no-op
        let outcome = c.fail_node("node-2");
        assert!(outcome.log[0].contains("already DOWN"));
    }

    #[test]
    fn test_fail_unknown_node_reported() {
        let mut c = cluster(3);
        let before = c.snapshot();
        let outcome = c.fail_node("node-42");

        assert!(outcome.log[0].contains("Node not found"));
        assert_eq!(outcome.snapshot, before);
    }

    #[test]
    fn test_duplicate_candidate_rejected() {
        let mut c = cluster(3);
        c.add_candidate("Alice");
        let outcome = c.add_candidate("Alice");

        assert!(outcome.log[0].contains("already exists"));
        assert_eq!(outcome.snapshot.candidates.len(), 1);
    }

    #[test]
    fn test_duplicate_voter_rejected_tallies_unchanged() {
        let mut c = cluster(3);
        c.add_candidate("Alice");
        c.add_candidate("Bob");
        c.cast_vote("v1", "Alice");

        let outcome = c.cast_vote("v1", "Bob");
        assert!(outcome
            .log
            .iter()
            .any(|l| l.contains("has already voted")));
        assert_eq!(outcome.snapshot.tally["Alice"], 1);
        assert_eq!(outcome.snapshot.tally["Bob"], 0);
        assert_eq!(outcome.snapshot.total_votes, 1);
    }

    #[test]
    fn test_unknown_candidate_rejected_tallies_unchanged() {
        let mut c = cluster(3);
        c.add_candidate("Alice");

        let outcome = c.cast_vote("v1", "Mallory");
        assert!(outcome
            .log
            .iter()
            .any(|l| l.contains("is not registered")));
        assert_eq!(outcome.snapshot.tally["Alice"], 0);
        assert_eq!(outcome.snapshot.total_votes, 0);
    }

    #[test]
    fn test_vote_forwards_to_surviving_leader() {
        let mut c = cluster(3);
        c.add_candidate("Alice");
        c.fail_node("node-1");
        c.fail_node("node-2");

        let outcome = c.cast_vote("v1", "Alice");
        assert_eq!(outcome.snapshot.leader_id.as_deref(), Some("node-3"));
        assert_eq!(outcome.snapshot.tally["Alice"], 1);
        assert!(outcome
            .log
            .iter()
            .any(|l| l.contains("forwarded to leader: node-3")));
    }

    #[test]
    fn test_vote_accepted_without_any_leader() {
        let mut c = cluster(2);
        c.add_candidate("Alice");
        c.fail_node("node-1");
        c.fail_node("node-2");

        let outcome = c.cast_vote("v1", "Alice");
        assert!(outcome.snapshot.leader_id.is_none());
        assert_eq!(outcome.snapshot.tally["Alice"], 1);
        assert!(outcome
            .log
            .iter()
            .any(|l| l.contains("without a leader")));
    }

    #[test]
    fn test_lamport_clock_and_request_counter_advance() {
        let mut c = cluster(3);
        c.add_candidate("Alice");

        let first = c.cast_vote("v1", "Alice");
        assert_eq!(first.snapshot.lamport_clock, 1);
        assert_eq!(first.snapshot.request_counter, 1);

        // rejected votes still tick the clock: the request was an event
        let second = c.cast_vote("v1", "Alice");
        assert_eq!(second.snapshot.lamport_clock, 2);
        assert_eq!(second.snapshot.request_counter, 2);
        assert_eq!(second.snapshot.total_votes, 1);
    }

    #[test]
    fn test_snapshot_is_idempotent_and_pure() {
        let mut c = cluster(3);
        c.add_candidate("Alice");
        c.cast_vote("v1", "Alice");

        let a = c.snapshot();
        let b = c.snapshot();
        assert_eq!(a, b);
    }

    #[test]
    fn test_term_monotonic_across_reelections() {
        let mut c = cluster(3);
        let mut last_term = c.snapshot().term;

        for id in ["node-1", "node-2"] {
            let outcome = c.fail_node(id);
            assert!(outcome.snapshot.term > last_term);
            last_term = outcome.snapshot.term;
        }
    }

    #[test]
    fn test_down_node_never_leader() {
        let mut c = cluster(3);
        for id in ["node-1", "node-2", "node-3"] {
            let outcome = c.fail_node(id);
            for node in &outcome.snapshot.nodes {
                if node.status == crate::state::NodeStatus::Down {
                    assert_ne!(node.role, NodeRole::Leader);
                    assert!(!node.is_leader);
                }
            }
        }
    }

    #[test]
    fn test_vote_on_empty_roster_accepted_leaderless() {
        let mut c = Cluster::new(Vec::new());
        let init = c.initialize();
        assert!(init.log.iter().any(|l| l.contains("No quorum")));

        c.add_candidate("Alice");
        let outcome = c.cast_vote("v1", "Alice");

        assert!(outcome.snapshot.nodes.is_empty());
        assert!(outcome.snapshot.leader_id.is_none());
        assert_eq!(outcome.snapshot.tally["Alice"], 1);
        assert_eq!(outcome.snapshot.request_counter, 1);
        assert!(outcome
            .log
            .iter()
            .any(|l| l.contains("without a leader")));
    }

    #[test]
    fn test_late_candidate_starts_at_zero() {
        let mut c = cluster(3);
        c.add_candidate("Alice");
        c.cast_vote("v1", "Alice");
        let outcome = c.add_candidate("Carol");

        assert_eq!(outcome.snapshot.tally["Carol"], 0);
        assert_eq!(outcome.snapshot.tally["Alice"], 1);
    }
}
