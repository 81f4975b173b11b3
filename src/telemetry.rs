//! Tracing setup for the board service.
//!
//! `LOG_LEVEL` takes an `EnvFilter` directive string; when unset the service
//! logs at info with engine decisions at debug. `LOG_FORMAT=json` switches to
//! one JSON object per line, anything else prints human-readable lines.
//!
//! Targets emitted by this crate:
//! - `board_backend`: startup (config, snapshot restore, startup course) and
//!   WebSocket connect/disconnect.
//! - `progression`: every completion mode picked, dice rolled and steps taken,
//!   plus rejected requests.
//! - `store`: course and student writes, snapshot reads and writes.
//!
//! `tower_http` adds one span per HTTP request on top of these.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,progression=debug,board_backend=debug,store=info,tower_http=info,axum=info";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}
