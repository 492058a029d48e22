//! Trusted Root Status Server
//!
//! Read-only HTTP view of the auditor's trusted root so other services can
//! consume a verified checkpoint without running their own auditor.

use axum::{extract::State, response::Json, routing::get, Router};
use std::net::SocketAddr;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::AuditorError;
use crate::merkle::root::LogRoot;

/// Build the status router over a trusted root subscription
pub fn router(trusted: watch::Receiver<LogRoot>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/trusted-root", get(trusted_root))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .into_inner(),
        )
        .with_state(trusted)
}

/// Serve the status router until the process exits
pub async fn serve(addr: SocketAddr, trusted: watch::Receiver<LogRoot>) -> Result<(), AuditorError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Status server listening on {}", addr);

    axum::serve(listener, router(trusted))
        .await
        .map_err(|e| AuditorError::ServerError(e.to_string()))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "log-auditor",
        "timestamp": chrono::Utc::now()
    }))
}

async fn trusted_root(State(trusted): State<watch::Receiver<LogRoot>>) -> Json<LogRoot> {
    let root = trusted.borrow().clone();
    Json(root)
}
