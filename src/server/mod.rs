//! Axum server wiring

pub mod handlers;
pub mod state;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::server::state::AppState;
use crate::upstream::UpstreamClient;

/// Build the relay router against the given upstream config and log path.
pub fn build_router(config: &Config, db_path: PathBuf) -> Router {
    let state = Arc::new(AppState {
        upstream: UpstreamClient::new(config),
        db_path,
    });

    Router::new()
        .route("/process-payload", post(handlers::process_payload))
        .route("/health", get(|| async { "OK" }))
        .route("/responses", get(handlers::list_responses))
        .route("/responses/:id", get(handlers::get_response))
        .route("/stats", get(handlers::stats))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn run_server(config: &Config, db_path: PathBuf, host: &str, port: u16) -> Result<()> {
    let app = build_router(config, db_path);

    let addr = format!("{}:{}", host, port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            eprintln!("\n\x1b[31mError:\x1b[0m Port {} is already in use.\n", port);
            eprintln!("Try a different port with:");
            eprintln!("  \x1b[36mchatrelay --port <PORT>\x1b[0m");
            return Err(e.into());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to bind {}", addr));
        }
    };

    println!("Relay listening on http://{}", addr);
    println!("\nEndpoints:");
    println!("  POST /process-payload  - Relay a chat payload and log the reply");
    println!("  GET  /health           - Health check");
    println!("  GET  /responses        - List logged responses (?limit=&offset=)");
    println!("  GET  /responses/:id    - Fetch one logged response");
    println!("  GET  /stats            - Log totals");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
