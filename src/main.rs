//! TradeSim — single-user trading simulation ledger
//!
//! Entry point. Loads configuration, initialises structured logging,
//! creates the session account, and serves the JSON API until Ctrl+C.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use tradesim::config::AppConfig;
use tradesim::dashboard::{self, DashboardState};
use tradesim::engine::Account;
use tradesim::market::PriceOracle;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = AppConfig::resolve_path();
    let cfg = AppConfig::load(&config_path)?;

    init_logging();

    let oracle = cfg.price_table()?;
    info!(
        name = %cfg.simulation.name,
        config = %config_path,
        symbols = ?oracle.symbols(),
        "TradeSim starting up"
    );

    if !cfg.dashboard.enabled {
        warn!("Dashboard disabled in config; nothing to serve. Exiting.");
        return Ok(());
    }

    // One account per process: this is the session.
    let state = Arc::new(DashboardState::new(Account::new(), Arc::new(oracle)));

    dashboard::serve(state.clone(), cfg.dashboard.port, shutdown_signal()).await?;

    let account = state.account.read().await;
    info!(
        owner = account.owner_name().unwrap_or("-"),
        balance = format!("{:.2}", account.cash_balance()),
        transactions = account.transactions().len(),
        "TradeSim shut down cleanly."
    );

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C; serving until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received.");
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tradesim=info"));

    if std::env::var("TRADESIM_LOG_JSON").is_ok() {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
