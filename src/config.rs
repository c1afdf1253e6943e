//! Votary Configuration
//!
//! Configuration structures for the votary cluster simulator.

use serde::{Deserialize, Serialize};

/// Main votary configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VotaryConfig {
    /// Cluster configuration
    #[serde(default)]
    pub cluster: ClusterConfig,

    /// API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Cluster configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Number of simulated nodes in the fixed roster
    #[serde(default = "default_node_count")]
    pub node_count: usize,

    /// Prefix used to derive node ids (prefix-1 .. prefix-N)
    #[serde(default = "default_node_prefix")]
    pub node_prefix: String,
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Enable HTTP API
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// HTTP API bind address
    #[serde(default = "default_api_address")]
    pub bind_address: String,

    /// Enable CORS (required when the observer UI is served from another origin)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_node_count() -> usize {
    3
}

fn default_node_prefix() -> String {
    "node".to_string()
}

fn default_true() -> bool {
    true
}

fn default_api_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            node_count: default_node_count(),
            node_prefix: default_node_prefix(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: default_api_address(),
            cors_enabled: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl VotaryConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> crate::Result<Self> {
        let config: VotaryConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.cluster.node_count == 0 {
            return Err(crate::Error::Config(
                "cluster.node_count must be at least 1".into(),
            ));
        }

        if self.cluster.node_prefix.is_empty() {
            return Err(crate::Error::Config(
                "cluster.node_prefix cannot be empty".into(),
            ));
        }

        if self.api.enabled && self.api.bind_address.is_empty() {
            return Err(crate::Error::Config(
                "api.bind_address cannot be empty".into(),
            ));
        }

        Ok(())
    }

    /// Derive the fixed node roster ids (prefix-1 .. prefix-N)
    pub fn node_ids(&self) -> Vec<String> {
        (1..=self.cluster.node_count)
            .map(|i| format!("{}-{}", self.cluster.node_prefix, i))
            .collect()
    }
}
