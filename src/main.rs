//! Server binary: opens the store, ensures the bootstrap schema, loads the
//! usage counter, and serves the table-access API under /api.

use anytable::{api_routes, common_routes_with_ready, stats, store, AppState, UsageStats};
use axum::{middleware, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("anytable=info".parse()?))
        .init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://.data/main.db".into());
    let pool = store::connect(&database_url).await?;
    store::ensure_schema(&pool).await?;

    let stats_file = std::env::var("STATS_FILE").unwrap_or_else(|_| "stats.json".into());
    let flush_secs: u64 = std::env::var("STATS_FLUSH_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(30);
    let usage = Arc::new(UsageStats::load(stats_file));
    let _flusher = stats::spawn_flusher(usage.clone(), Duration::from_secs(flush_secs));

    let state = AppState {
        pool,
        stats: usage.clone(),
    };
    let app = Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .nest("/api", api_routes(state.clone()))
        .layer(middleware::from_fn_with_state(state, stats::track_usage))
        .layer(TraceLayer::new_for_http());

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(err) = usage.flush() {
        tracing::warn!(%err, "final stats flush failed");
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
    }
}
