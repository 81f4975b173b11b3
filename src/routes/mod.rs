//! Router assembly: HTTP endpoints, WebSocket upgrade, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - course + student API under `/api/...`
/// - CORS (allow any origin/method/headers) – adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // Health
        .route("/healthz", get(http::http_healthz))
        .route("/api/health", get(http::http_health))
        // Course
        .route("/api/course", get(http::http_get_course).post(http::http_post_course))
        .route("/api/board", get(http::http_get_board))
        // Student
        .route(
            "/api/student",
            get(http::http_get_student).post(http::http_post_student).put(http::http_put_student),
        )
        .route("/api/student/reset", post(http::http_post_reset))
        .route("/api/student/move", post(http::http_post_move))
        .route("/api/student/complete-task", post(http::http_post_complete_task))
        .route("/api/student/roll-die", post(http::http_post_roll_die))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
