//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Numeric request fields stay as raw JSON values; coercion happens in `score`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Course, PathCell, PendingCompletion, Student};
use crate::engine::{CompletionInput, Outcome};
use crate::error::ProgressionError;
use crate::score::{parse_optional_non_negative_number, parse_optional_step};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
  Ping,
  GetState,
  CompleteTask(CompleteTaskIn),
  RollDie,
  Move(MoveIn),
  Reset,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
  Pong,
  State { board: BoardOut },
  Progress(ProgressOut),
  Student { student: Student },
  Error { message: String },
}

//
// HTTP request/response DTOs
//

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteTaskIn {
  #[serde(default)]
  pub task_index: Value,
  #[serde(default)]
  pub advance_by: Option<Value>,
  #[serde(default)]
  pub score_obtained: Option<Value>,
  #[serde(default)]
  pub score_percent: Option<Value>,
  #[serde(default)]
  pub defer_roll: Option<bool>,
}

impl CompleteTaskIn {
  /// Whole-number index: a JSON integer, an integral float, or a numeric string.
  pub fn task_index(&self) -> Result<i64, ProgressionError> {
    let whole = match &self.task_index {
      Value::Number(n) => n.as_i64().or_else(|| {
        n.as_f64()
          .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
          .map(|f| f as i64)
      }),
      Value::String(s) => s.trim().parse::<i64>().ok(),
      _ => None,
    };
    whole.ok_or_else(|| ProgressionError::MalformedTaskIndex(self.task_index.to_string()))
  }

  /// Coerce loose fields; malformed numbers become absent.
  pub fn to_input(&self) -> CompletionInput {
    CompletionInput {
      advance_by: parse_optional_step(self.advance_by.as_ref()),
      score_obtained: parse_optional_non_negative_number(self.score_obtained.as_ref()),
      score_percent: parse_optional_non_negative_number(self.score_percent.as_ref()),
      defer_roll: self.defer_roll.unwrap_or(false),
    }
  }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveIn {
  #[serde(default)]
  pub advance_by: Option<Value>,
}

/// Course as submitted by the authoring workflow.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseIn {
  #[serde(default)]
  pub professor: String,
  #[serde(default, alias = "course_name")]
  pub course_name: String,
  #[serde(default)]
  pub term: String,
  #[serde(default)]
  pub tasks: Vec<TaskIn>,
  #[serde(default, alias = "path_vector")]
  pub path_vector: Option<Vec<PathCellIn>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskIn {
  #[serde(default)]
  pub title: String,
  #[serde(rename = "type", default)]
  pub kind: Option<String>,
  #[serde(default, alias = "due_date")]
  pub due_date: Option<String>,
  #[serde(default)]
  pub points: Option<Value>,
  #[serde(default)]
  pub description: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PathCellIn {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub reward: Option<Value>,
}

/// Result of a progression operation plus the student it left behind.
#[derive(Debug, Serialize)]
pub struct ProgressOut {
  #[serde(flatten)]
  pub outcome: Outcome,
  pub student: Student,
}

/// Everything the board screen needs in one call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardOut {
  pub course_name: String,
  pub term: String,
  pub path_vector: Vec<PathCell>,
  pub task_count: usize,
  pub student: Option<Student>,
  pub pending: Option<PendingCompletion>,
}

impl BoardOut {
  pub fn new(course: Option<&Course>, student: Option<Student>) -> Self {
    let pending = student
      .as_ref()
      .and_then(|s| s.pending_completion.get().cloned());
    Self {
      course_name: course.map(|c| c.course_name.clone()).unwrap_or_default(),
      term: course.map(|c| c.term.clone()).unwrap_or_default(),
      path_vector: course.map(|c| c.path_vector.clone()).unwrap_or_default(),
      task_count: course.map(|c| c.tasks.len()).unwrap_or(0),
      student,
      pending,
    }
  }
}

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
  pub error: String,
}
