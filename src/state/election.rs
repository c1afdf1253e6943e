//! Leader Election
//!
//! Deterministic single-call election over the live roster. There are no
//! timers or vote rounds here: failure detection is explicit, so an
//! election runs synchronously inside the command that needs it.

use crate::cluster::CommandLog;
use crate::state::{ClusterRoster, NodeState};

/// Result of an election attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElectionOutcome {
    /// A live leader already exists, nothing changed
    Unchanged { leader_id: String, term: u64 },
    /// A new leader was installed
    Elected { leader_id: String, term: u64 },
    /// No live node remains, the cluster stays leaderless
    NoQuorum,
}

/// Run an election if the cluster has no acting leader.
///
/// Idempotent: a live leader makes this a no-op. The winner is chosen by a
/// fixed total order over node ids so repeated calls with the same roster
/// converge on the same node. Each installed leader bumps the cluster term
/// by one past the highest term any node has observed.
pub fn elect_if_needed(roster: &mut ClusterRoster, log: &mut CommandLog) -> ElectionOutcome {
    if let Some(leader) = roster.current_leader() {
        return ElectionOutcome::Unchanged {
            leader_id: leader.id.clone(),
            term: leader.term,
        };
    }

    log.push("[ELECTION] No acting leader, starting leader election.");

    let winner_id = match elect_winner(&roster.up_nodes()) {
        Some(id) => id,
        None => {
            log.push("[ELECTION] No quorum: no live nodes available to elect.");
            tracing::warn!("election found no live nodes, cluster stays leaderless");
            return ElectionOutcome::NoQuorum;
        }
    };

    let term = roster.highest_term() + 1;
    roster
        .set_leader(&winner_id, term)
        .expect("winner was drawn from the roster");

    log.push(format!(
        "[ELECTION] {} elected leader for term {}.",
        winner_id, term
    ));
    tracing::info!(leader = %winner_id, term, "elected new leader");

    ElectionOutcome::Elected {
        leader_id: winner_id,
        term,
    }
}

/// Pick the winner among live nodes: lowest id wins.
///
/// Ids share a fixed prefix, so comparing length before content orders them
/// numerically (node-2 before node-10).
fn elect_winner(up_nodes: &[&NodeState]) -> Option<String> {
    up_nodes
        .iter()
        .min_by(|a, b| {
            a.id.len()
                .cmp(&b.id.len())
                .then_with(|| a.id.cmp(&b.id))
        })
        .map(|n| n.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{NodeRole, NodeStatus};

    fn roster(n: usize) -> ClusterRoster {
        let ids: Vec<String> = (1..=n).map(|i| format!("node-{}", i)).collect();
        ClusterRoster::new(&ids)
    }

    #[test]
    fn test_elects_lowest_id() {
        let mut r = roster(3);
        let mut log = CommandLog::new();

        let outcome = elect_if_needed(&mut r, &mut log);
        assert_eq!(
            outcome,
            ElectionOutcome::Elected {
                leader_id: "node-1".into(),
                term: 1
            }
        );
        assert_eq!(r.current_leader().unwrap().id, "node-1");
    }

    #[test]
    fn test_numeric_aware_order() {
        let ids: Vec<String> = (1..=12).map(|i| format!("node-{}", i)).collect();
        let mut r = ClusterRoster::new(&ids);
        r.fail("node-1").unwrap();

        let mut log = CommandLog::new();
        let outcome = elect_if_needed(&mut r, &mut log);
        // node-2 must beat node-10/11/12 despite lexicographic order
        assert_eq!(
            outcome,
            ElectionOutcome::Elected {
                leader_id: "node-2".into(),
                term: 1
            }
        );
    }

    #[test]
    fn test_noop_with_live_leader() {
        let mut r = roster(3);
        let mut log = CommandLog::new();
        elect_if_needed(&mut r, &mut log);

        let mut log2 = CommandLog::new();
        let outcome = elect_if_needed(&mut r, &mut log2);
        assert!(matches!(outcome, ElectionOutcome::Unchanged { term: 1, .. }));
        assert!(log2.entries().is_empty());
    }

    #[test]
    fn test_term_strictly_increases_on_reelection() {
        let mut r = roster(3);
        let mut log = CommandLog::new();
        elect_if_needed(&mut r, &mut log);

        r.fail("node-1").unwrap();
        let outcome = elect_if_needed(&mut r, &mut log);
        assert_eq!(
            outcome,
            ElectionOutcome::Elected {
                leader_id: "node-2".into(),
                term: 2
            }
        );
    }

    #[test]
    fn test_no_quorum() {
        let mut r = roster(2);
        r.fail("node-1").unwrap();
        r.fail("node-2").unwrap();

        let mut log = CommandLog::new();
        let outcome = elect_if_needed(&mut r, &mut log);
        assert_eq!(outcome, ElectionOutcome::NoQuorum);
        assert!(r.current_leader().is_none());
        assert!(log
            .entries()
            .iter()
            .any(|line| line.contains("No quorum")));
    }

    #[test]
    fn test_at_most_one_leader_after_many_calls() {
        let mut r = roster(4);
        let mut log = CommandLog::new();

        for id in ["node-1", "node-3"] {
            elect_if_needed(&mut r, &mut log);
            r.fail(id).unwrap();
            elect_if_needed(&mut r, &mut log);

            let leaders = r
                .all_nodes()
                .filter(|n| n.role == NodeRole::Leader)
                .count();
            assert!(leaders <= 1);
            // no Down node is ever leader
            assert!(r
                .all_nodes()
                .all(|n| n.status == NodeStatus::Up || n.role != NodeRole::Leader));
        }
    }
}
