//! Built-in demo course so the board is playable without config or authoring.

use serde_json::json;

use crate::protocol::{CourseIn, TaskIn};

fn task(title: &str, kind: &str, due: &str, points: Option<u32>, description: &str) -> TaskIn {
  TaskIn {
    title: title.into(),
    kind: Some(kind.into()),
    due_date: Some(due.into()),
    points: points.map(|p| json!(p)),
    description: description.into(),
  }
}

pub fn demo_course() -> CourseIn {
  CourseIn {
    professor: String::new(),
    course_name: "Demo Course".into(),
    term: "Any Term".into(),
    tasks: vec![
      task("Quiz 1", "quiz", "2025-09-12", Some(20), "Short quiz on week 1-2 material."),
      task("Assignment 1", "assignment", "2025-09-26", Some(50), "First programming assignment."),
      task("Midterm", "midterm", "2025-10-17", Some(100), "In-class midterm exam."),
      task("Participation", "participation", "", None, "Weekly in-class participation."),
    ],
    path_vector: None,
  }
}
