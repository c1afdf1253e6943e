//! Ballot Module
//!
//! Candidate registration and the append-only vote ledger.

mod ledger;
mod registry;

pub use ledger::{Ballot, VoteLedger};
pub use registry::CandidateRegistry;
