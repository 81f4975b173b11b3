//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Course authoring (normalize tasks, build the board when none is given)
//!   - Task completion, pending die rolls and free moves
//!   - Board summary for the frontend

use rand::Rng;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::BoardSettings;
use crate::domain::{Course, PathCell, Student, Task, TaskType};
use crate::engine::{self, DEFAULT_STEP};
use crate::error::ProgressionError;
use crate::path::build_path_vector;
use crate::protocol::{BoardOut, CompleteTaskIn, CourseIn, MoveIn, ProgressOut};
use crate::score::{parse_optional_non_negative_number, parse_optional_step};
use crate::state::AppState;
use crate::util::{normalize_date, trunc_for_log};

/// Turn an authoring payload into a stored course.
///
/// Points that are missing or malformed are replaced by a random integer in
/// `[points_min, points_max]`; a missing path is generated from the tasks.
pub fn build_course<R: Rng>(input: CourseIn, settings: &BoardSettings, rng: &mut R) -> Result<Course, ProgressionError> {
  let course_name = input.course_name.trim().to_string();
  if course_name.is_empty() {
    return Err(ProgressionError::InvalidCourse("courseName is required".into()));
  }
  let (points_lo, points_hi) = if settings.points_min <= settings.points_max {
    (settings.points_min, settings.points_max)
  } else {
    (settings.points_max, settings.points_min)
  };

  let tasks: Vec<Task> = input
    .tasks
    .into_iter()
    .map(|t| {
      let points = parse_optional_non_negative_number(t.points.as_ref())
        .map(f64::trunc)
        .unwrap_or_else(|| f64::from(rng.gen_range(points_lo..=points_hi)));
      Task {
        title: t.title.trim().to_string(),
        kind: t.kind.as_deref().map(TaskType::parse_lenient).unwrap_or_default(),
        due_date: normalize_date(t.due_date.as_deref().unwrap_or_default()),
        points: Some(points),
        description: t.description,
      }
    })
    .collect();

  let path_vector = match input.path_vector {
    Some(cells) => cells
      .into_iter()
      .map(|c| PathCell {
        name: c.name,
        reward: parse_optional_non_negative_number(c.reward.as_ref())
          .map(|r| r.trunc() as u64)
          .unwrap_or(0),
      })
      .collect(),
    None => build_path_vector(&tasks, settings.path_shape(), rng),
  };

  Ok(Course {
    id: Uuid::new_v4().to_string(),
    professor: input.professor.trim().to_string(),
    course_name,
    term: input.term.trim().to_string(),
    tasks,
    path_vector,
    updated_at: chrono::Utc::now(),
  })
}

#[instrument(level = "info", skip(state, input), fields(course_name = %trunc_for_log(&input.course_name, 60), tasks = input.tasks.len()))]
pub async fn save_course(state: &AppState, input: CourseIn) -> Result<Course, ProgressionError> {
  let course = build_course(input, &state.settings, &mut rand::thread_rng())?;
  if let Some(student) = state.get_student().await {
    if student.current_position >= course.path_len().max(1) {
      warn!(target: "store", position = student.current_position, cells = course.path_len(), "Student position lies beyond the new board; it folds on the next move");
    }
  }
  Ok(state.save_course(course).await)
}

#[instrument(level = "info", skip(state, body), fields(task_index = %body.task_index))]
pub async fn complete_task(state: &AppState, body: &CompleteTaskIn) -> Result<ProgressOut, ProgressionError> {
  let task_index = body.task_index()?;
  let input = body.to_input();
  let (outcome, student) = state
    .mutate_student(|course, student, die| engine::complete_task(task_index, course, student, &input, die))
    .await?;
  info!(target: "progression", task_index, status = ?outcome.status, reward = outcome.reward_gained, position = outcome.position, "Task completion handled");
  Ok(ProgressOut { outcome, student })
}

#[instrument(level = "info", skip(state))]
pub async fn roll_die(state: &AppState) -> Result<ProgressOut, ProgressionError> {
  let (outcome, student) = state
    .mutate_student(|course, student, die| engine::resolve_pending_roll(course, student, die))
    .await?;
  Ok(ProgressOut { outcome, student })
}

#[instrument(level = "info", skip(state, body))]
pub async fn move_student(state: &AppState, body: &MoveIn) -> Result<ProgressOut, ProgressionError> {
  let step = parse_optional_step(body.advance_by.as_ref()).unwrap_or(DEFAULT_STEP);
  let (outcome, student) = state
    .mutate_student(|course, student, _| Ok(engine::move_by(course, student, step)))
    .await?;
  Ok(ProgressOut { outcome, student })
}

pub async fn get_student(state: &AppState) -> Result<Student, ProgressionError> {
  state.get_student().await.ok_or(ProgressionError::NoStudent)
}

pub async fn get_course(state: &AppState) -> Result<Course, ProgressionError> {
  state.get_course().await.ok_or(ProgressionError::NoCourse)
}

pub async fn board(state: &AppState) -> BoardOut {
  let student = state.get_student().await;
  let course = state.get_course().await;
  BoardOut::new(course.as_ref(), student)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::die::FixedDie;
  use crate::engine::OutcomeStatus;
  use crate::protocol::{PathCellIn, TaskIn};
  use rand::{rngs::StdRng, SeedableRng};
  use serde_json::json;

  fn four_task_course() -> CourseIn {
    let tasks = (0..4)
      .map(|i| TaskIn {
        title: format!("Task {i}"),
        kind: Some("Quiz".into()),
        due_date: Some(format!("09/{:02}/2025", i + 1)),
        points: Some(json!(20)),
        description: String::new(),
      })
      .collect();
    CourseIn {
      professor: "prof@example.edu".into(),
      course_name: "CSE 250".into(),
      term: "Fall 2025".into(),
      tasks,
      path_vector: Some((0..12).map(|i| PathCellIn { name: format!("cell {i}"), reward: Some(json!(i * 2)) }).collect()),
    }
  }

  async fn state_for(input: CourseIn, die: u8) -> AppState {
    let settings = BoardSettings::default();
    let course = build_course(input, &settings, &mut StdRng::seed_from_u64(1)).unwrap();
    AppState::with_parts(settings, Some(course), None, Box::new(FixedDie(die)), None)
  }

  #[test]
  fn build_course_normalizes_tasks() {
    let input = CourseIn {
      course_name: "  Algorithms ".into(),
      tasks: vec![
        TaskIn { title: " Essay ".into(), kind: Some("Exam 1".into()), due_date: Some("October 3, 2025".into()), points: Some(json!("42.7 pts")), description: "d".into() },
        TaskIn { title: "Lab".into(), kind: None, due_date: None, points: Some(json!(-3)), description: String::new() },
      ],
      ..Default::default()
    };
    let course = build_course(input, &BoardSettings::default(), &mut StdRng::seed_from_u64(9)).unwrap();
    assert_eq!(course.course_name, "Algorithms");
    assert_eq!(course.tasks[0].title, "Essay");
    assert_eq!(course.tasks[0].kind, TaskType::Assignment);
    assert_eq!(course.tasks[0].due_date, "2025-10-03");
    assert_eq!(course.tasks[0].points, Some(42.0));
    let invented = course.tasks[1].points.unwrap();
    assert!((5.0..=30.0).contains(&invented) && invented.fract() == 0.0);
    assert_eq!(course.path_vector.len(), 6);
    assert!(!course.id.is_empty());
  }

  #[test]
  fn build_course_keeps_given_path_and_requires_name() {
    let course = build_course(four_task_course(), &BoardSettings::default(), &mut StdRng::seed_from_u64(2)).unwrap();
    assert_eq!(course.path_len(), 12);
    assert_eq!(course.path_vector[5].reward, 10);
    assert_eq!(course.tasks[1].due_date, "2025-09-02");

    let err = build_course(CourseIn::default(), &BoardSettings::default(), &mut StdRng::seed_from_u64(2)).unwrap_err();
    assert!(matches!(err, ProgressionError::InvalidCourse(_)));
  }

  #[tokio::test]
  async fn deferred_completion_then_roll_end_to_end() {
    let state = state_for(four_task_course(), 5).await;
    state.ensure_student().await;

    let body: CompleteTaskIn = serde_json::from_value(json!({"taskIndex": 0, "scoreObtained": 18, "deferRoll": true})).unwrap();
    let out = complete_task(&state, &body).await.unwrap();
    assert_eq!(out.outcome.status, OutcomeStatus::RollPending);
    assert_eq!(out.student.current_position, 0);
    assert!(out.student.pending_completion.get().is_some());

    let rolled = roll_die(&state).await.unwrap();
    assert_eq!(rolled.outcome.position, 5);
    assert_eq!(rolled.outcome.reward_gained, 10);
    assert_eq!(rolled.student.total_reward, 10);
    assert!(rolled.student.pending_completion.get().is_none());
    assert_eq!(rolled.student.completed_tasks.len(), 1);
    assert_eq!(rolled.student.completed_tasks[0].die_roll_used, Some(5));

    assert_eq!(roll_die(&state).await.unwrap_err(), ProgressionError::NoPendingRoll);
  }

  #[tokio::test]
  async fn recorded_task_details_survive_course_replacement() {
    let state = state_for(four_task_course(), 5).await;
    let body: CompleteTaskIn = serde_json::from_value(json!({"taskIndex": 0, "scoreObtained": 18, "deferRoll": true})).unwrap();
    complete_task(&state, &body).await.unwrap();

    let replacement = CourseIn {
      course_name: "CSE 251".into(),
      tasks: (0..2)
        .map(|i| TaskIn { title: format!("New {i}"), points: Some(json!(50)), ..Default::default() })
        .collect(),
      path_vector: Some((0..8).map(|i| PathCellIn { name: format!("n{i}"), reward: Some(json!(100 + i)) }).collect()),
      ..Default::default()
    };
    save_course(&state, replacement).await.unwrap();

    let pending = board(&state).await.pending.unwrap();
    assert_eq!(pending.snapshot.title, "Task 0");
    assert_eq!(pending.snapshot.points, Some(20.0));

    let rolled = roll_die(&state).await.unwrap();
    let record = &rolled.student.completed_tasks[0];
    assert_eq!(record.snapshot.title, "Task 0");
    assert_eq!(record.snapshot.points, Some(20.0));
    assert_eq!(record.snapshot.score_percent, Some(90.0));
    assert_eq!(record.die_min_used, Some(4));
    assert_eq!(record.die_roll_used, Some(5));
    assert_eq!(rolled.outcome.position, 5);
    assert_eq!(rolled.outcome.reward_gained, 105);
  }

  #[tokio::test]
  async fn move_defaults_to_one_step() {
    let state = state_for(four_task_course(), 1).await;
    let out = move_student(&state, &MoveIn::default()).await.unwrap();
    assert_eq!(out.outcome.position, 1);
    let out = move_student(&state, &MoveIn { advance_by: Some(json!(-3)) }).await.unwrap();
    assert_eq!(out.outcome.position, 10);
    assert_eq!(out.student.total_reward, 2 + 20);
  }

  #[tokio::test]
  async fn board_reports_pending_roll() {
    let state = state_for(four_task_course(), 1).await;
    let body: CompleteTaskIn = serde_json::from_value(json!({"taskIndex": 2, "scorePercent": 72, "deferRoll": true})).unwrap();
    complete_task(&state, &body).await.unwrap();
    let b = board(&state).await;
    assert_eq!(b.task_count, 4);
    assert_eq!(b.pending.map(|p| p.die_min), Some(3));
  }
}
