//! Optional JSON snapshot of the course and student (SNAPSHOT_PATH).
//!
//! Loaded once at startup, rewritten after each mutation. Failures are logged
//! and never interrupt a request: the in-memory state stays authoritative.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::domain::{Course, Student};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
  #[serde(default)]
  pub course: Option<Course>,
  #[serde(default)]
  pub student: Option<Student>,
}

#[derive(Clone, Debug)]
pub struct SnapshotFile {
  path: PathBuf,
}

impl SnapshotFile {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn from_env() -> Option<Self> {
    std::env::var("SNAPSHOT_PATH").ok().filter(|p| !p.trim().is_empty()).map(Self::new)
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Missing file is a fresh start, not an error.
  pub fn load(&self) -> Option<Snapshot> {
    let path = self.path.display().to_string();
    match std::fs::read_to_string(&self.path) {
      Ok(s) => match serde_json::from_str::<Snapshot>(&s) {
        Ok(snap) => {
          info!(target: "store", %path, has_course = snap.course.is_some(), has_student = snap.student.is_some(), "Loaded state snapshot");
          Some(snap)
        }
        Err(e) => {
          error!(target: "store", %path, error = %e, "Failed to parse state snapshot; starting empty");
          None
        }
      },
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        warn!(target: "store", %path, "No state snapshot yet");
        None
      }
      Err(e) => {
        error!(target: "store", %path, error = %e, "Failed to read state snapshot");
        None
      }
    }
  }

  /// Write to a sibling temp file, then rename over the target.
  pub async fn write(&self, snap: &Snapshot) {
    let path = self.path.display().to_string();
    let body = match serde_json::to_vec_pretty(snap) {
      Ok(b) => b,
      Err(e) => {
        error!(target: "store", %path, error = %e, "Failed to serialize state snapshot");
        return;
      }
    };
    let tmp = self.path.with_extension("json.tmp");
    if let Err(e) = tokio::fs::write(&tmp, &body).await {
      error!(target: "store", %path, error = %e, "Failed to write state snapshot");
      return;
    }
    if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
      error!(target: "store", %path, error = %e, "Failed to move state snapshot into place");
      return;
    }
    debug!(target: "store", %path, bytes = body.len(), "State snapshot written");
  }
}
