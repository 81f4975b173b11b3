//! Course Board · Progress Tracker Backend
//!
//! - Axum HTTP + WebSocket API for the course board
//! - Score → die minimum → deferred or immediate roll → token movement
//! - Optional JSON snapshot persistence
//!
//! Important env variables:
//!   PORT              : u16 (default 8000)
//!   BOARD_CONFIG_PATH : path to TOML config (board shape + optional starting course)
//!   SNAPSHOT_PATH     : JSON file to restore from and persist to
//!   LOG_LEVEL         : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT        : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod config;
mod error;
mod score;
mod die;
mod path;
mod pending;
mod engine;
mod seeds;
mod snapshot;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::build_router;
use crate::state::AppState;

const DEFAULT_PORT: u16 = 8000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Course + student stores, the die, optional snapshot.
  let state = Arc::new(AppState::new());

  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "board_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "board_backend", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "board_backend", error = %e, "Failed to listen for shutdown signal");
  }
}
