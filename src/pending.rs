//! The at-most-one outstanding die roll.
//!
//! `PendingSlot` keeps its `Option` private: the only ways in and out are
//! `create` (fails on an occupied slot) and `resolve` (fails on an empty one).

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::die::clamp_face;
use crate::domain::{PendingCompletion, TaskSnapshot};
use crate::error::ProgressionError;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct PendingSlot(Option<PendingCompletion>);

impl PendingSlot {
  pub fn get(&self) -> Option<&PendingCompletion> {
    self.0.as_ref()
  }

  pub fn is_pending_for(&self, task_index: usize) -> bool {
    self.0.as_ref().is_some_and(|p| p.snapshot.task_index == task_index)
  }

  /// Fails with the existing pending task's index if the slot is taken.
  pub fn create(&mut self, snapshot: TaskSnapshot, die_min: u8) -> Result<&PendingCompletion, ProgressionError> {
    if let Some(existing) = &self.0 {
      return Err(ProgressionError::PendingRollConflict { task_index: existing.snapshot.task_index });
    }
    Ok(&*self.0.insert(PendingCompletion {
      snapshot,
      die_min: clamp_face(die_min),
      created_at: Utc::now(),
    }))
  }

  /// Hands back the pending completion and empties the slot.
  pub fn resolve(&mut self) -> Result<PendingCompletion, ProgressionError> {
    self.0.take().ok_or(ProgressionError::NoPendingRoll)
  }

  /// Only for a full student reset.
  pub(crate) fn clear(&mut self) {
    self.0 = None;
  }
}
