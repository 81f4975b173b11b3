//! Progression engine: turns a task completion into board movement.
//!
//! Request shape is classified once into a `CompletionRequest`, then handled
//! by an exhaustive match:
//!   - `Advance`        explicit step, no scoring
//!   - `DeferredRoll`   score known, die stored for later
//!   - `ImmediateRoll`  score known, die rolled now
//!   - `DefaultStep`    nothing usable, move one cell
//!
//! Every operation validates before it mutates, so a returned error leaves
//! the student untouched.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::die::{minimum_face, DieRoller};
use crate::domain::{CompletedTask, Course, PendingCompletion, Student, TaskSnapshot};
use crate::error::ProgressionError;
use crate::path::{advance, Advance};
use crate::score::normalize;

pub const DEFAULT_STEP: i64 = 1;

/// Completion input after coercion; any field may be absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompletionInput {
  pub advance_by: Option<i64>,
  pub score_obtained: Option<f64>,
  pub score_percent: Option<f64>,
  pub defer_roll: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CompletionRequest {
  Advance { step: i64 },
  DeferredRoll { percent: f64 },
  ImmediateRoll { percent: f64 },
  DefaultStep,
}

impl CompletionRequest {
  /// `task_points` is the maximum used to turn a raw score into a percentage.
  pub fn classify(input: &CompletionInput, task_points: Option<f64>) -> Self {
    if let Some(step) = input.advance_by {
      return CompletionRequest::Advance { step };
    }
    match normalize(input.score_obtained, task_points, input.score_percent) {
      Some(percent) if input.defer_roll => CompletionRequest::DeferredRoll { percent },
      Some(percent) => CompletionRequest::ImmediateRoll { percent },
      None => CompletionRequest::DefaultStep,
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
  Moved,
  RollPending,
  AlreadyCompleted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DieUse {
  pub min: u8,
  pub roll: u8,
}

/// What an operation did, reported uniformly for every mode.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
  pub status: OutcomeStatus,
  pub reward_gained: u64,
  pub position: usize,
  pub total_reward: u64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub step: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub die: Option<DieUse>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pending: Option<PendingCompletion>,
}

impl Outcome {
  fn unchanged(status: OutcomeStatus, student: &Student) -> Self {
    Self {
      status,
      reward_gained: 0,
      position: student.current_position,
      total_reward: student.total_reward,
      step: None,
      die: None,
      pending: None,
    }
  }

  fn moved(student: &Student, moved: Advance, step: i64, die: Option<DieUse>) -> Self {
    Self {
      status: OutcomeStatus::Moved,
      reward_gained: moved.reward_gained,
      position: student.current_position,
      total_reward: student.total_reward,
      step: Some(step),
      die,
      pending: None,
    }
  }
}

/// Move the token and bank the reward.
fn apply_step(course: &Course, student: &mut Student, step: i64) -> Advance {
  let moved = advance(student.current_position, &course.path_vector, step);
  student.current_position = moved.new_position;
  student.total_reward = student.total_reward.saturating_add(moved.reward_gained);
  student.updated_at = Utc::now();
  moved
}

fn record_completion(
  student: &mut Student,
  snapshot: TaskSnapshot,
  moved: Advance,
  advance_by_used: Option<i64>,
  die: Option<DieUse>,
) {
  student.completed_tasks.push(CompletedTask {
    snapshot,
    reward_gained: moved.reward_gained,
    position_after: moved.new_position,
    advance_by_used,
    die_min_used: die.map(|d| d.min),
    die_roll_used: die.map(|d| d.roll),
    completed_at: Utc::now(),
  });
}

/// Complete `task_index` for the student.
#[instrument(level = "debug", target = "progression", skip(course, student, input, die))]
pub fn complete_task(
  task_index: i64,
  course: &Course,
  student: &mut Student,
  input: &CompletionInput,
  die: &mut dyn DieRoller,
) -> Result<Outcome, ProgressionError> {
  let invalid = || ProgressionError::InvalidTaskIndex { index: task_index, task_count: course.tasks.len() };
  let idx = usize::try_from(task_index).map_err(|_| invalid())?;
  let task = course.tasks.get(idx).ok_or_else(invalid)?;

  // A task waiting on its die counts as taken.
  if student.has_completed(idx) || student.pending_completion.is_pending_for(idx) {
    info!(target: "progression", task_index = idx, "Task already completed; state unchanged");
    return Ok(Outcome::unchanged(OutcomeStatus::AlreadyCompleted, student));
  }

  if input.defer_roll {
    if let Some(existing) = student.pending_completion.get() {
      return Err(ProgressionError::PendingRollConflict { task_index: existing.snapshot.task_index });
    }
  }

  let request = CompletionRequest::classify(input, task.points);
  debug!(target: "progression", task_index = idx, ?request, "Completion request classified");

  match request {
    CompletionRequest::Advance { step } => {
      let percent = normalize(input.score_obtained, task.points, input.score_percent);
      let snapshot = TaskSnapshot::capture(idx, task, input.score_obtained, percent);
      let moved = apply_step(course, student, step);
      record_completion(student, snapshot, moved, Some(step), None);
      info!(target: "progression", task_index = idx, step, position = moved.new_position, reward = moved.reward_gained, "Task completed with explicit advance");
      Ok(Outcome::moved(student, moved, step, None))
    }
    CompletionRequest::DeferredRoll { percent } => {
      let die_min = minimum_face(Some(percent));
      let snapshot = TaskSnapshot::capture(idx, task, input.score_obtained, Some(percent));
      let pending = student.pending_completion.create(snapshot, die_min)?.clone();
      student.updated_at = Utc::now();
      info!(target: "progression", task_index = idx, percent, die_min, "Die roll deferred");
      let mut out = Outcome::unchanged(OutcomeStatus::RollPending, student);
      out.pending = Some(pending);
      Ok(out)
    }
    CompletionRequest::ImmediateRoll { percent } => {
      let die_min = minimum_face(Some(percent));
      let roll = die.roll(die_min);
      let used = DieUse { min: die_min, roll };
      let snapshot = TaskSnapshot::capture(idx, task, input.score_obtained, Some(percent));
      let moved = apply_step(course, student, i64::from(roll));
      record_completion(student, snapshot, moved, None, Some(used));
      info!(target: "progression", task_index = idx, percent, die_min, roll, position = moved.new_position, reward = moved.reward_gained, "Task completed with immediate roll");
      Ok(Outcome::moved(student, moved, i64::from(roll), Some(used)))
    }
    CompletionRequest::DefaultStep => {
      let snapshot = TaskSnapshot::capture(idx, task, input.score_obtained, None);
      let moved = apply_step(course, student, DEFAULT_STEP);
      record_completion(student, snapshot, moved, Some(DEFAULT_STEP), None);
      info!(target: "progression", task_index = idx, position = moved.new_position, reward = moved.reward_gained, "Task completed with default step");
      Ok(Outcome::moved(student, moved, DEFAULT_STEP, None))
    }
  }
}

/// Roll the stored die and apply the movement it earns.
#[instrument(level = "debug", target = "progression", skip_all)]
pub fn resolve_pending_roll(
  course: &Course,
  student: &mut Student,
  die: &mut dyn DieRoller,
) -> Result<Outcome, ProgressionError> {
  let pending = student.pending_completion.resolve()?;
  let roll = die.roll(pending.die_min);
  let used = DieUse { min: pending.die_min, roll };
  let moved = apply_step(course, student, i64::from(roll));
  let task_index = pending.snapshot.task_index;
  record_completion(student, pending.snapshot, moved, None, Some(used));
  info!(target: "progression", task_index, die_min = used.min, roll, position = moved.new_position, reward = moved.reward_gained, "Pending roll resolved");
  Ok(Outcome::moved(student, moved, i64::from(roll), Some(used)))
}

/// Free movement with no scoring and no completion record.
#[instrument(level = "debug", target = "progression", skip(course, student))]
pub fn move_by(course: &Course, student: &mut Student, step: i64) -> Outcome {
  let moved = apply_step(course, student, step);
  info!(target: "progression", step, position = moved.new_position, reward = moved.reward_gained, "Student moved");
  Outcome::moved(student, moved, step, None)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::die::FixedDie;
  use crate::domain::{PathCell, Task, TaskType};

  /// 4 tasks, 3 cells per task, reward = 10 + cell index.
  fn course() -> Course {
    let tasks = (0..4)
      .map(|i| Task {
        title: format!("Task {i}"),
        kind: TaskType::Quiz,
        due_date: String::new(),
        points: if i == 3 { None } else { Some(20.0) },
        description: String::new(),
      })
      .collect();
    let path_vector = (0..12).map(|i| PathCell { name: format!("cell {i}"), reward: 10 + i }).collect();
    Course {
      id: "c1".into(),
      professor: String::new(),
      course_name: "Test".into(),
      term: String::new(),
      tasks,
      path_vector,
      updated_at: Utc::now(),
    }
  }

  fn scored(obtained: f64, defer: bool) -> CompletionInput {
    CompletionInput { score_obtained: Some(obtained), defer_roll: defer, ..Default::default() }
  }

  #[test]
  fn classify_picks_mode_by_shape() {
    let adv = CompletionInput { advance_by: Some(-2), score_obtained: Some(20.0), defer_roll: true, ..Default::default() };
    assert_eq!(CompletionRequest::classify(&adv, Some(20.0)), CompletionRequest::Advance { step: -2 });
    assert_eq!(CompletionRequest::classify(&scored(18.0, true), Some(20.0)), CompletionRequest::DeferredRoll { percent: 90.0 });
    assert_eq!(CompletionRequest::classify(&scored(18.0, false), Some(20.0)), CompletionRequest::ImmediateRoll { percent: 90.0 });
    // No maximum: raw score alone says nothing.
    assert_eq!(CompletionRequest::classify(&scored(18.0, true), None), CompletionRequest::DefaultStep);
    assert_eq!(CompletionRequest::classify(&CompletionInput::default(), Some(20.0)), CompletionRequest::DefaultStep);
  }

  #[test]
  fn deferred_roll_then_resolve() {
    let course = course();
    let mut student = Student::new();
    let mut die = FixedDie(5);

    let out = complete_task(0, &course, &mut student, &scored(18.0, true), &mut die).unwrap();
    assert_eq!(out.status, OutcomeStatus::RollPending);
    // 90% sits in the 85..95 band.
    assert_eq!(out.pending.as_ref().map(|p| p.die_min), Some(4));
    assert_eq!(student.current_position, 0);
    assert_eq!(student.total_reward, 0);
    assert!(student.completed_tasks.is_empty());

    let out = resolve_pending_roll(&course, &mut student, &mut die).unwrap();
    assert_eq!(out.die, Some(DieUse { min: 4, roll: 5 }));
    assert_eq!(out.position, 5);
    assert_eq!(out.reward_gained, 15);
    assert_eq!(student.total_reward, 15);
    assert!(student.pending_completion.get().is_none());
    assert_eq!(student.completed_tasks.len(), 1);
    let rec = &student.completed_tasks[0];
    assert_eq!(rec.die_min_used, Some(4));
    assert_eq!(rec.die_roll_used, Some(5));
    assert_eq!(rec.snapshot.score_percent, Some(90.0));
    assert_eq!(rec.position_after, 5);
  }

  #[test]
  fn immediate_roll_moves_and_records_die() {
    let course = course();
    let mut student = Student::new();
    let input = CompletionInput { score_percent: Some(100.0), ..Default::default() };
    let out = complete_task(3, &course, &mut student, &input, &mut FixedDie(1)).unwrap();
    assert_eq!(out.die, Some(DieUse { min: 6, roll: 6 }));
    assert_eq!(student.current_position, 6);
    assert_eq!(student.total_reward, 16);
    assert_eq!(student.completed_tasks[0].die_roll_used, Some(6));
  }

  #[test]
  fn explicit_advance_ignores_scoring_and_wraps() {
    let course = course();
    let mut student = Student::new();
    let input = CompletionInput { advance_by: Some(-1), ..Default::default() };
    let out = complete_task(1, &course, &mut student, &input, &mut FixedDie(6)).unwrap();
    assert_eq!(out.position, 11);
    assert_eq!(out.reward_gained, 21);
    assert!(out.die.is_none());
    let rec = &student.completed_tasks[0];
    assert_eq!(rec.advance_by_used, Some(-1));
    assert_eq!(rec.die_min_used, None);
    assert_eq!(rec.snapshot.score_obtained, None);
  }

  #[test]
  fn default_step_moves_one() {
    let course = course();
    let mut student = Student::new();
    let input = CompletionInput { defer_roll: true, ..Default::default() };
    let out = complete_task(2, &course, &mut student, &input, &mut FixedDie(6)).unwrap();
    assert_eq!(out.step, Some(1));
    assert_eq!(student.current_position, 1);
    assert_eq!(student.total_reward, 11);
    assert!(student.pending_completion.get().is_none());
  }

  #[test]
  fn invalid_index_is_rejected_before_anything_changes() {
    let course = course();
    let mut student = Student::new();
    let before = student.clone();
    for idx in [-1, 4, 99] {
      let err = complete_task(idx, &course, &mut student, &scored(10.0, false), &mut FixedDie(3)).unwrap_err();
      assert_eq!(err, ProgressionError::InvalidTaskIndex { index: idx, task_count: 4 });
    }
    assert_eq!(student, before);
  }

  #[test]
  fn completing_twice_is_a_no_op() {
    let course = course();
    let mut student = Student::new();
    let mut die = FixedDie(4);
    complete_task(0, &course, &mut student, &scored(18.0, false), &mut die).unwrap();
    let before = student.clone();

    let out = complete_task(0, &course, &mut student, &scored(20.0, false), &mut die).unwrap();
    assert_eq!(out.status, OutcomeStatus::AlreadyCompleted);
    assert_eq!(out.reward_gained, 0);
    assert_eq!(student, before);
  }

  #[test]
  fn second_deferred_roll_conflicts() {
    let course = course();
    let mut student = Student::new();
    let mut die = FixedDie(2);
    complete_task(0, &course, &mut student, &scored(18.0, true), &mut die).unwrap();

    let err = complete_task(1, &course, &mut student, &scored(10.0, true), &mut die).unwrap_err();
    assert_eq!(err, ProgressionError::PendingRollConflict { task_index: 0 });

    // Re-submitting the pending task itself is just "already completed".
    let out = complete_task(0, &course, &mut student, &scored(10.0, true), &mut die).unwrap();
    assert_eq!(out.status, OutcomeStatus::AlreadyCompleted);
  }

  #[test]
  fn explicit_advance_allowed_while_roll_pending() {
    let course = course();
    let mut student = Student::new();
    let mut die = FixedDie(2);
    complete_task(0, &course, &mut student, &scored(18.0, true), &mut die).unwrap();

    let input = CompletionInput { advance_by: Some(2), ..Default::default() };
    let out = complete_task(1, &course, &mut student, &input, &mut die).unwrap();
    assert_eq!(out.status, OutcomeStatus::Moved);
    assert!(student.pending_completion.is_pending_for(0));
    assert_eq!(student.completed_tasks.len(), 1);
  }

  #[test]
  fn resolve_without_pending_fails() {
    let course = course();
    let mut student = Student::new();
    let err = resolve_pending_roll(&course, &mut student, &mut FixedDie(3)).unwrap_err();
    assert_eq!(err, ProgressionError::NoPendingRoll);
  }

  #[test]
  fn move_by_accumulates_without_records() {
    let course = course();
    let mut student = Student::new();
    move_by(&course, &mut student, 3);
    let out = move_by(&course, &mut student, -5);
    assert_eq!(out.position, 10);
    assert_eq!(student.total_reward, 13 + 20);
    assert!(student.completed_tasks.is_empty());
  }

  #[test]
  fn empty_path_completes_without_moving() {
    let mut course = course();
    course.path_vector.clear();
    let mut student = Student::new();
    let out = complete_task(0, &course, &mut student, &scored(18.0, false), &mut FixedDie(6)).unwrap();
    assert_eq!(out.position, 0);
    assert_eq!(out.reward_gained, 0);
    assert_eq!(student.completed_tasks.len(), 1);
  }
}
