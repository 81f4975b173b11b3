//! Loading board configuration (board shape + optional starting course) from TOML.
//!
//! Example:
//!
//! ```toml
//! [board]
//! path_ratio = 3
//! reward_min = 1
//! reward_max = 20
//!
//! [course]
//! course_name = "CSE 250 - Data Structures"
//! term = "Fall 2025"
//!
//! [[course.tasks]]
//! title = "Quiz 1"
//! type = "quiz"
//! points = 20
//! ```

use serde::Deserialize;
use tracing::{error, info};

use crate::path::PathShape;
use crate::protocol::CourseIn;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct BoardConfig {
  #[serde(default)]
  pub board: BoardSettings,
  #[serde(default)]
  pub course: Option<CourseIn>,
}

/// Tunables for course authoring. The die-minimum table is not configurable.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BoardSettings {
  /// Board cells generated per task.
  pub path_ratio: usize,
  pub reward_min: u64,
  pub reward_max: u64,
  /// Range for points invented when a task arrives without a usable maximum.
  pub points_min: u32,
  pub points_max: u32,
}

impl Default for BoardSettings {
  fn default() -> Self {
    Self {
      path_ratio: 3,
      reward_min: 1,
      reward_max: 20,
      points_min: 5,
      points_max: 30,
    }
  }
}

impl BoardSettings {
  pub fn path_shape(&self) -> PathShape {
    PathShape {
      cells_per_task: self.path_ratio,
      reward_min: self.reward_min,
      reward_max: self.reward_max,
    }
  }
}

pub fn parse_board_config(s: &str) -> Result<BoardConfig, toml::de::Error> {
  toml::from_str::<BoardConfig>(s)
}

/// Attempt to load `BoardConfig` from BOARD_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_board_config_from_env() -> Option<BoardConfig> {
  let path = std::env::var("BOARD_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_board_config(&s) {
      Ok(cfg) => {
        info!(target: "board_backend", %path, "Loaded board config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "board_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "board_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_config_uses_defaults() {
    let cfg = parse_board_config("").unwrap();
    assert_eq!(cfg.board.path_ratio, 3);
    assert_eq!(cfg.board.reward_max, 20);
    assert!(cfg.course.is_none());
  }

  #[test]
  fn parses_board_and_course() {
    let cfg = parse_board_config(
      r#"
        [board]
        path_ratio = 2
        reward_max = 9

        [course]
        course_name = "CSE 250"
        term = "Fall 2025"

        [[course.tasks]]
        title = "Quiz 1"
        type = "quiz"
        points = 20

        [[course.tasks]]
        title = "Final"
        type = "final"
      "#,
    )
    .unwrap();
    assert_eq!(cfg.board.path_ratio, 2);
    assert_eq!(cfg.board.reward_min, 1);
    assert_eq!(cfg.board.reward_max, 9);
    let course = cfg.course.unwrap();
    assert_eq!(course.course_name, "CSE 250");
    assert_eq!(course.tasks.len(), 2);
    assert_eq!(course.tasks[0].kind.as_deref(), Some("quiz"));
    assert!(course.tasks[1].points.is_none());
  }

  #[test]
  fn bad_toml_is_an_error() {
    assert!(parse_board_config("[board\npath_ratio = ").is_err());
  }
}
