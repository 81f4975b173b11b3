//! Die minimum policy and the die itself.

use rand::{rngs::StdRng, Rng, SeedableRng};

pub const MAX_FACE: u8 = 6;

/// `(percent >=, minimum face)`, checked top-down.
const MIN_FACE_TABLE: [(f64, u8); 5] = [(100.0, 6), (95.0, 5), (85.0, 4), (70.0, 3), (50.0, 2)];

/// Lowest face a roll may produce for a score percentage.
pub fn minimum_face(percent: Option<f64>) -> u8 {
  let Some(p) = percent.filter(|p| p.is_finite()) else {
    return 1;
  };
  MIN_FACE_TABLE
    .iter()
    .find(|(threshold, _)| p >= *threshold)
    .map(|(_, face)| *face)
    .unwrap_or(1)
}

pub fn clamp_face(face: u8) -> u8 {
  face.clamp(1, MAX_FACE)
}

/// Source of die rolls. The engine only sees this seam so tests can pin a face.
pub trait DieRoller {
  /// Uniform draw from `[clamp(min_face), 6]`.
  fn roll(&mut self, min_face: u8) -> u8;
}

/// `gen_range` over an integer range is unbiased (widening multiply with rejection).
pub struct RandomDie<R = StdRng> {
  rng: R,
}

impl RandomDie<StdRng> {
  pub fn from_entropy() -> Self {
    Self::with_rng(StdRng::from_entropy())
  }
}

impl<R: Rng> RandomDie<R> {
  pub fn with_rng(rng: R) -> Self {
    Self { rng }
  }
}

impl<R: Rng> DieRoller for RandomDie<R> {
  fn roll(&mut self, min_face: u8) -> u8 {
    self.rng.gen_range(clamp_face(min_face)..=MAX_FACE)
  }
}

/// Always lands on the same face (still respecting the floor).
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedDie(pub u8);

#[cfg(test)]
impl DieRoller for FixedDie {
  fn roll(&mut self, min_face: u8) -> u8 {
    clamp_face(self.0).max(clamp_face(min_face))
  }
}
