//! HTTP API Server
//!
//! REST boundary over the cluster command core. All mutating routes go
//! through the write half of one RwLock, which is the serialization point
//! for the whole simulation; `get-state` only ever takes the read half.

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

use crate::cluster::{Cluster, ClusterSnapshot, CommandOutcome};
use crate::config::ApiConfig;
use crate::error::{Error, Result};

/// Shared application state
pub struct AppState {
    /// The simulated cluster behind its single serialization point
    pub cluster: RwLock<Cluster>,
}

/// HTTP API server
pub struct HttpServer {
    config: ApiConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    /// Create a new HTTP server owning the given cluster
    pub fn new(config: ApiConfig, cluster: Cluster) -> Self {
        let state = Arc::new(AppState {
            cluster: RwLock::new(cluster),
        });

        Self { config, state }
    }

    /// Get the state for sharing with other components
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Create the router
    pub fn create_router(state: Arc<AppState>, cors_enabled: bool) -> Router {
        let router = Router::new()
            .route("/api/initialize", post(handle_initialize))
            .route("/api/add-candidate", post(handle_add_candidate))
            .route("/api/vote", post(handle_vote))
            .route("/api/fail-node", post(handle_fail_node))
            .route("/api/get-state", get(handle_get_state))
            .with_state(state);

        if cors_enabled {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// Start the HTTP server
    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            tracing::info!("HTTP API disabled");
            return Ok(());
        }

        let app = Self::create_router(Arc::clone(&self.state), self.config.cors_enabled);

        let listener = tokio::net::TcpListener::bind(&self.config.bind_address).await?;
        tracing::info!("HTTP API listening on {}", self.config.bind_address);

        axum::serve(listener, app)
            .await
            .map_err(|e| Error::Network(format!("HTTP server error: {}", e)))?;

        Ok(())
    }
}

// ============ Request/Response Types ============

/// Add-candidate request
#[derive(Debug, Deserialize, Serialize)]
pub struct AddCandidateRequest {
    pub name: String,
}

/// Vote request (field names match the observer UI contract)
#[derive(Debug, Deserialize, Serialize)]
pub struct VoteRequest {
    #[serde(rename = "voterId")]
    pub voter_id: String,
    #[serde(rename = "candidateName")]
    pub candidate_name: String,
}

/// Fail-node request
#[derive(Debug, Deserialize, Serialize)]
pub struct FailNodeRequest {
    pub node_id: String,
}

/// Response for every mutating command: the events it caused plus the
/// resulting snapshot, so a caller never needs a separate read after a write
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub log: Vec<String>,
    pub state: ClusterSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<CommandOutcome> for CommandResponse {
    fn from(outcome: CommandOutcome) -> Self {
        Self {
            log: outcome.log,
            state: outcome.snapshot,
            message: outcome.message,
        }
    }
}

// ============ Handlers ============

async fn handle_initialize(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let outcome = state.cluster.write().await.initialize();
    Json(CommandResponse::from(outcome))
}

async fn handle_add_candidate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddCandidateRequest>,
) -> impl IntoResponse {
    let outcome = state.cluster.write().await.add_candidate(&req.name);
    Json(CommandResponse::from(outcome))
}

async fn handle_vote(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VoteRequest>,
) -> impl IntoResponse {
    let outcome = state
        .cluster
        .write()
        .await
        .cast_vote(&req.voter_id, &req.candidate_name);
    Json(CommandResponse::from(outcome))
}

async fn handle_fail_node(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FailNodeRequest>,
) -> impl IntoResponse {
    let outcome = state.cluster.write().await.fail_node(&req.node_id);
    Json(CommandResponse::from(outcome))
}

async fn handle_get_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.cluster.read().await.snapshot();
    Json(snapshot)
}
