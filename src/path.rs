//! Token movement around the circular board, and building a board for a new course.

use rand::Rng;
use serde::Serialize;

use crate::domain::{PathCell, Task};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Advance {
  pub new_position: usize,
  pub reward_gained: u64,
}

/// Move `step` cells (may be negative or larger than the path) from `current_position`.
///
/// An empty path leaves the token where it is and pays nothing. The result is
/// always in `[0, len)` thanks to Euclidean remainder.
pub fn advance(current_position: usize, cells: &[PathCell], step: i64) -> Advance {
  if cells.is_empty() {
    return Advance { new_position: current_position, reward_gained: 0 };
  }
  let len = cells.len() as i64;
  // Reduce both operands first so the sum cannot overflow.
  let from = (current_position as u64 % len as u64) as i64;
  let new_position = (from + step % len).rem_euclid(len) as usize;
  let reward_gained = cells.get(new_position).map(|c| c.reward).unwrap_or(0);
  Advance { new_position, reward_gained }
}

/// Board rewards and shape used when a course arrives without its own path.
#[derive(Clone, Copy, Debug)]
pub struct PathShape {
  pub cells_per_task: usize,
  pub reward_min: u64,
  pub reward_max: u64,
}

/// `tasks.len() * cells_per_task` cells, each named after its task and
/// carrying a random reward in `[reward_min, reward_max]`.
pub fn build_path_vector<R: Rng>(tasks: &[Task], shape: PathShape, rng: &mut R) -> Vec<PathCell> {
  let per_task = shape.cells_per_task.max(1);
  let (lo, hi) = if shape.reward_min <= shape.reward_max {
    (shape.reward_min, shape.reward_max)
  } else {
    (shape.reward_max, shape.reward_min)
  };

  let mut cells = Vec::with_capacity(tasks.len() * per_task);
  for (i, task) in tasks.iter().enumerate() {
    let title = task.title.trim();
    let base = if title.is_empty() { format!("{} {}", task.kind, i + 1) } else { title.to_string() };
    for k in 0..per_task {
      let name = if per_task == 1 { base.clone() } else { format!("{base} · {}", k + 1) };
      cells.push(PathCell { name, reward: rng.gen_range(lo..=hi) });
    }
  }
  cells
}
