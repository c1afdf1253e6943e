//! Candidate Registry
//!
//! Append-only mapping of candidate names. Registration is allowed at any
//! time, including after voting has opened; there is no removal.

use crate::error::{Error, Result};

/// Registered candidates in registration order
#[derive(Debug, Default)]
pub struct CandidateRegistry {
    names: Vec<String>,
}

impl CandidateRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a candidate. Names match case-sensitively; a reused name
    /// is rejected, not overwritten.
    pub fn register(&mut self, name: &str) -> Result<()> {
        if self.contains(name) {
            return Err(Error::DuplicateCandidate(name.to_string()));
        }
        self.names.push(name.to_string());
        Ok(())
    }

    /// Check whether a candidate is registered
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Candidate names in registration order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of registered candidates
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no candidate has been registered yet
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
