//! Votary - Simulated Distributed Cluster for Leader Election and Voting
//!
//! Runs the cluster simulator and its HTTP API.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use votary::api::HttpServer;
use votary::cluster::{Cluster, ClusterSnapshot};
use votary::config::{LoggingConfig, VotaryConfig};
use votary::error::{Error, Result};

/// Votary - Simulated Distributed Cluster for Leader Election and Voting
#[derive(Parser)]
#[command(name = "votary")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "votary.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the simulator and serve the HTTP API
    Start,

    /// Query a running simulator for its current state
    Status {
        /// Node address to query
        #[arg(short, long, default_value = "localhost:8080")]
        address: String,
    },

    /// Initialize a new configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "votary.toml")]
        output: PathBuf,

        /// Number of simulated nodes
        #[arg(long, default_value_t = 3)]
        nodes: usize,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start => {
            // Config drives logging for the long-running node; other
            // commands log with defaults.
            let config = match load_config(&cli.config) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Failed to load configuration from {:?}: {}", cli.config, e);
                    return Err(e);
                }
            };
            init_logging(cli.log_level.as_deref(), &config.logging);
            run_start(config).await
        }
        Commands::Status { address } => {
            init_logging(cli.log_level.as_deref(), &LoggingConfig::default());
            run_status(address).await
        }
        Commands::Init { output, nodes } => {
            init_logging(cli.log_level.as_deref(), &LoggingConfig::default());
            run_init(output, nodes)
        }
        Commands::Validate => {
            init_logging(cli.log_level.as_deref(), &LoggingConfig::default());
            run_validate(cli.config)
        }
    }
}

/// Initialize logging from the config section, with the CLI flag taking
/// precedence for the level
fn init_logging(level_override: Option<&str>, config: &LoggingConfig) {
    let level = effective_log_level(level_override, config);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// The log level to run with: CLI flag first, then the config section
fn effective_log_level<'a>(level_override: Option<&'a str>, config: &'a LoggingConfig) -> &'a str {
    level_override.unwrap_or(&config.level)
}

/// Start the simulator node
async fn run_start(config: VotaryConfig) -> Result<()> {
    tracing::info!("Starting votary simulator...");

    tracing::info!(
        "Simulating a {}-node roster ({}-1 .. {}-{})",
        config.cluster.node_count,
        config.cluster.node_prefix,
        config.cluster.node_prefix,
        config.cluster.node_count
    );

    // The cluster starts Uninitialized; the observer drives it through
    // POST /api/initialize.
    let cluster = Cluster::new(config.node_ids());
    let server = HttpServer::new(config.api.clone(), cluster);

    server.start().await
}

/// Query a running simulator over HTTP
async fn run_status(address: String) -> Result<()> {
    let url = format!("http://{}/api/get-state", address);

    let snapshot: ClusterSnapshot = reqwest::get(&url)
        .await
        .map_err(|e| Error::Network(format!("Failed to contact {}: {}", address, e)))?
        .json()
        .await
        .map_err(|e| Error::Network(format!("Invalid response from {}: {}", address, e)))?;

    if !snapshot.initialized {
        println!("Cluster is not initialized.");
        return Ok(());
    }

    match &snapshot.leader_id {
        Some(id) => println!("Leader: {} (term {})", id, snapshot.term),
        None => println!("Leaderless (term {})", snapshot.term),
    }
    for node in &snapshot.nodes {
        println!("  {} {} {}", node.id, node.status, node.role);
    }
    println!("Candidates: {}", snapshot.candidates.join(", "));
    for (candidate, count) in &snapshot.tally {
        println!("  {}: {}", candidate, count);
    }
    println!(
        "Votes: {}  Lamport clock: {}  Requests: {}",
        snapshot.total_votes, snapshot.lamport_clock, snapshot.request_counter
    );

    Ok(())
}

/// Write a default configuration file
fn run_init(output: PathBuf, nodes: usize) -> Result<()> {
    let mut config = VotaryConfig::default();
    config.cluster.node_count = nodes;
    config.validate()?;

    let content = toml::to_string_pretty(&config)
        .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(&output, content)?;

    println!("Wrote configuration to {:?}", output);
    Ok(())
}

/// Validate a configuration file
fn run_validate(config_path: PathBuf) -> Result<()> {
    match VotaryConfig::from_file(&config_path) {
        Ok(config) => {
            println!(
                "Configuration OK: {} nodes, API on {}",
                config.cluster.node_count, config.api.bind_address
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration invalid: {}", e);
            Err(e)
        }
    }
}

/// Load config, falling back to defaults when no file exists.
/// Runs before logging is initialized, so the fallback notice goes to stderr.
fn load_config(path: &PathBuf) -> Result<VotaryConfig> {
    if path.exists() {
        VotaryConfig::from_file(path)
    } else {
        eprintln!("No config file at {:?}, using defaults", path);
        Ok(VotaryConfig::default())
    }
}
