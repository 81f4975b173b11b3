//! Errors surfaced by progression operations and their HTTP mapping.
//!
//! An already-completed task is deliberately absent here: it is an
//! informational outcome, not a failure.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use thiserror::Error;

use crate::protocol::ErrorOut;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProgressionError {
  #[error("task index {index} is out of range (course has {task_count} tasks)")]
  InvalidTaskIndex { index: i64, task_count: usize },

  #[error("taskIndex must be a whole number, got {0}")]
  MalformedTaskIndex(String),

  #[error("a die roll is already pending for task {task_index}; roll it first")]
  PendingRollConflict { task_index: usize },

  #[error("no pending die roll")]
  NoPendingRoll,

  #[error("no course has been saved yet")]
  NoCourse,

  #[error("no student profile exists")]
  NoStudent,

  #[error("invalid course: {0}")]
  InvalidCourse(String),
}

impl ProgressionError {
  pub fn status(&self) -> StatusCode {
    match self {
      ProgressionError::InvalidTaskIndex { .. }
      | ProgressionError::MalformedTaskIndex(_)
      | ProgressionError::InvalidCourse(_) => StatusCode::BAD_REQUEST,
      ProgressionError::PendingRollConflict { .. } | ProgressionError::NoPendingRoll => {
        StatusCode::CONFLICT
      }
      ProgressionError::NoCourse | ProgressionError::NoStudent => StatusCode::NOT_FOUND,
    }
  }
}

impl IntoResponse for ProgressionError {
  fn into_response(self) -> Response {
    let status = self.status();
    (status, Json(ErrorOut { error: self.to_string() })).into_response()
  }
}
