// Jar Ledger - Web Server

use anyhow::{Context, Result};
use jar_ledger::{router, AppState, Config, SqliteIdentityProvider, SqliteStore};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;
    info!(
        target: "jar_ledger",
        "Jar Ledger starting: db={:?}, addr={}, session_cookie={}",
        config.database_path, config.bind_addr, config.session_cookie
    );

    // Open database
    let store = SqliteStore::open(&config.database_path)?;
    let provider = SqliteIdentityProvider::new(store.handle());

    // Create shared state
    let state = AppState::new(Arc::new(store), Arc::new(provider), config.session_cookie.clone());

    let app = router(state).layer(CorsLayer::permissive());

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    info!(target: "jar_ledger", "listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await.context("Server stopped unexpectedly")?;
    Ok(())
}
