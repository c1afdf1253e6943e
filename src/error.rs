//! Votary Error Types

use thiserror::Error;

/// Result type alias for votary operations
pub type Result<T> = std::result::Result<T, Error>;

/// Votary error types
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    // Cluster command rejections
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Candidate '{0}' already exists")]
    DuplicateCandidate(String),

    #[error("Candidate '{0}' is not registered")]
    UnknownCandidate(String),

    #[error("Voter '{0}' has already voted")]
    DuplicateVoter(String),

    #[error("Cluster is not initialized")]
    NotInitialized,

    // Network errors
    #[error("Network error: {0}")]
    Network(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this error is a caller-visible rejection that is reported
    /// through the command log rather than failing the request
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::NodeNotFound(_)
                | Error::DuplicateCandidate(_)
                | Error::UnknownCandidate(_)
                | Error::DuplicateVoter(_)
                | Error::NotInitialized
        )
    }
}
