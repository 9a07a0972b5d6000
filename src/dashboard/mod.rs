//! Dashboard — Axum JSON API over the session account.
//!
//! The presentation layer talks to the engine exclusively through these
//! routes. CORS enabled for local development.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::future::Future;
use tower_http::cors::CorsLayer;
use tracing::info;

pub use routes::{AppState, DashboardState};

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("*"))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        // Reads
        .route("/api/summary", get(routes::get_summary))
        .route("/api/holdings", get(routes::get_holdings))
        .route("/api/transactions", get(routes::get_transactions))
        .route("/api/balance-history", get(routes::get_balance_history))
        .route("/api/symbols", get(routes::get_symbols))
        .route("/api/quote", get(routes::get_quote))
        // Mutations
        .route("/api/onboard", post(routes::onboard))
        .route("/api/deposit", post(routes::deposit))
        .route("/api/withdraw", post(routes::withdraw))
        .route("/api/buy", post(routes::buy))
        .route("/api/sell", post(routes::sell))
        .route("/api/reset", post(routes::reset))
        .route("/health", get(routes::health))
        .layer(cors)
        .with_state(state)
}

/// Serve the API until `shutdown` resolves.
pub async fn serve<F>(state: AppState, port: u16, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind dashboard port {port}"))?;
    info!(port, "Dashboard API listening on http://localhost:{port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Dashboard server error")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
