//! Domain models: course (tasks + path), the singleton student, and the
//! historical/pending completion records that hang off the student.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pending::PendingSlot;

/// Kind of assessment a syllabus task represents.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
  Quiz,
  Midterm,
  Final,
  #[default]
  Assignment,
  Project,
  Participation,
}

impl TaskType {
  /// Case-insensitive mapping; anything unknown becomes `Assignment`.
  pub fn parse_lenient(raw: &str) -> Self {
    match raw.trim().to_lowercase().as_str() {
      "quiz" => TaskType::Quiz,
      "midterm" => TaskType::Midterm,
      "final" => TaskType::Final,
      "project" => TaskType::Project,
      "participation" => TaskType::Participation,
      _ => TaskType::Assignment,
    }
  }
}

impl fmt::Display for TaskType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      TaskType::Quiz => "quiz",
      TaskType::Midterm => "midterm",
      TaskType::Final => "final",
      TaskType::Assignment => "assignment",
      TaskType::Project => "project",
      TaskType::Participation => "participation",
    };
    f.write_str(s)
  }
}

/// One deliverable from the syllabus.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
  pub title: String,
  #[serde(rename = "type", default)]
  pub kind: TaskType,
  /// `YYYY-MM-DD` or empty.
  #[serde(default)]
  pub due_date: String,
  /// Maximum points; `None` means the task is graded by percentage.
  #[serde(default)]
  pub points: Option<f64>,
  #[serde(default)]
  pub description: String,
}

/// A reward-bearing square on the loop-shaped board.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathCell {
  pub name: String,
  #[serde(default)]
  pub reward: u64,
}

/// The single global course. Replaced wholesale by the authoring workflow.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
  pub id: String,
  #[serde(default)]
  pub professor: String,
  #[serde(default)]
  pub course_name: String,
  #[serde(default)]
  pub term: String,
  #[serde(default)]
  pub tasks: Vec<Task>,
  #[serde(default)]
  pub path_vector: Vec<PathCell>,
  pub updated_at: DateTime<Utc>,
}

impl Course {
  pub fn path_len(&self) -> usize {
    self.path_vector.len()
  }
}

/// Title/points/score captured when a task is scored, so later course edits
/// never rewrite history.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
  pub task_index: usize,
  pub title: String,
  #[serde(default)]
  pub points: Option<f64>,
  #[serde(default)]
  pub score_obtained: Option<f64>,
  #[serde(default)]
  pub score_percent: Option<f64>,
}

impl TaskSnapshot {
  pub fn capture(task_index: usize, task: &Task, score_obtained: Option<f64>, score_percent: Option<f64>) -> Self {
    Self {
      task_index,
      title: task.title.clone(),
      points: task.points,
      score_obtained,
      score_percent,
    }
  }
}

/// Immutable record appended when a task's movement resolves.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompletedTask {
  #[serde(flatten)]
  pub snapshot: TaskSnapshot,
  pub reward_gained: u64,
  pub position_after: usize,
  /// Step applied without a die (explicit advance or default step).
  #[serde(default)]
  pub advance_by_used: Option<i64>,
  #[serde(default)]
  pub die_min_used: Option<u8>,
  #[serde(default)]
  pub die_roll_used: Option<u8>,
  pub completed_at: DateTime<Utc>,
}

/// A scored task waiting for its die to be rolled.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingCompletion {
  #[serde(flatten)]
  pub snapshot: TaskSnapshot,
  pub die_min: u8,
  pub created_at: DateTime<Utc>,
}

/// The singleton student profile.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Student {
  pub current_position: usize,
  pub total_reward: u64,
  #[serde(default)]
  pub completed_tasks: Vec<CompletedTask>,
  #[serde(default)]
  pub pending_completion: PendingSlot,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Student {
  pub fn new() -> Self {
    let now = Utc::now();
    Self {
      current_position: 0,
      total_reward: 0,
      completed_tasks: Vec::new(),
      pending_completion: PendingSlot::default(),
      created_at: now,
      updated_at: now,
    }
  }

  pub fn has_completed(&self, task_index: usize) -> bool {
    self.completed_tasks.iter().any(|c| c.snapshot.task_index == task_index)
  }

  /// Back to a pristine profile; creation time is kept.
  pub fn reset(&mut self) {
    self.current_position = 0;
    self.total_reward = 0;
    self.completed_tasks.clear();
    self.pending_completion.clear();
    self.updated_at = Utc::now();
  }
}

impl Default for Student {
  fn default() -> Self {
    Self::new()
  }
}
