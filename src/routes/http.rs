//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{extract::State, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::domain::Student;
use crate::error::ProgressionError;
use crate::logic;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

pub async fn http_healthz() -> &'static str { "ok" }

#[instrument(level = "info", skip(state))]
pub async fn http_get_course(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ProgressionError> {
  Ok(Json(logic::get_course(&state).await?))
}

#[instrument(level = "info", skip(state, body), fields(tasks = body.tasks.len(), has_path = body.path_vector.is_some()))]
pub async fn http_post_course(
  State(state): State<Arc<AppState>>,
  Json(body): Json<CourseIn>,
) -> Result<impl IntoResponse, ProgressionError> {
  let course = logic::save_course(&state, body).await?;
  info!(target: "store", id = %course.id, cells = course.path_len(), "HTTP course saved");
  Ok(Json(course))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_board(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(logic::board(&state).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_student(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ProgressionError> {
  Ok(Json(logic::get_student(&state).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_student(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(state.ensure_student().await)
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_put_student(
  State(state): State<Arc<AppState>>,
  Json(body): Json<Student>,
) -> impl IntoResponse {
  Json(state.save_student(body).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_reset(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let student = state.reset_student().await;
  info!(target: "store", "HTTP student reset");
  Json(student)
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_move(
  State(state): State<Arc<AppState>>,
  body: Option<Json<MoveIn>>,
) -> Result<impl IntoResponse, ProgressionError> {
  let body = body.map(|Json(b)| b).unwrap_or_default();
  let out = logic::move_student(&state, &body).await?;
  info!(target: "progression", position = out.outcome.position, reward = out.outcome.reward_gained, "HTTP move applied");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(task_index = %body.task_index, defer_roll = ?body.defer_roll))]
pub async fn http_post_complete_task(
  State(state): State<Arc<AppState>>,
  Json(body): Json<CompleteTaskIn>,
) -> Result<impl IntoResponse, ProgressionError> {
  let out = logic::complete_task(&state, &body).await?;
  info!(target: "progression", status = ?out.outcome.status, position = out.outcome.position, "HTTP complete-task handled");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_roll_die(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ProgressionError> {
  let out = logic::roll_die(&state).await?;
  info!(target: "progression", die = ?out.outcome.die, position = out.outcome.position, "HTTP roll-die resolved");
  Ok(Json(out))
}
