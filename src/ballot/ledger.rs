//! Vote Ledger
//!
//! The append-only record of accepted votes. Tallies are always derived
//! from the ledger contents, never kept as separate counters, so the sum
//! of tallies can never diverge from the number of accepted votes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ballot::CandidateRegistry;
use crate::error::{Error, Result};

/// A single accepted vote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ballot {
    /// Identity of the voter
    pub voter_id: String,
    /// Candidate the vote was cast for
    pub candidate: String,
}

/// Append-only ledger of accepted votes for one election session
#[derive(Debug, Default)]
pub struct VoteLedger {
    votes: Vec<Ballot>,
}

impl VoteLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a voter already has a recorded vote
    pub fn has_voted(&self, voter_id: &str) -> bool {
        self.votes.iter().any(|b| b.voter_id == voter_id)
    }

    /// Record a vote. A second vote by the same voter is rejected and the
    /// original vote is retained.
    pub fn record(&mut self, voter_id: &str, candidate: &str) -> Result<()> {
        if self.has_voted(voter_id) {
            return Err(Error::DuplicateVoter(voter_id.to_string()));
        }

        self.votes.push(Ballot {
            voter_id: voter_id.to_string(),
            candidate: candidate.to_string(),
        });

        Ok(())
    }

    /// Derive per-candidate tallies from the ledger. Every registered
    /// candidate appears, zero-voted ones included.
    pub fn tally(&self, registry: &CandidateRegistry) -> BTreeMap<String, u64> {
        let mut counts: BTreeMap<String, u64> = registry
            .names()
            .iter()
            .map(|name| (name.clone(), 0))
            .collect();

        for ballot in &self.votes {
            if let Some(count) = counts.get_mut(&ballot.candidate) {
                *count += 1;
            }
        }

        counts
    }

    /// Number of accepted votes
    pub fn len(&self) -> usize {
        self.votes.len()
    }

    /// Whether no vote has been accepted yet
    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }
}
