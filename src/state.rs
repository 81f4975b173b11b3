//! Application state: the course store, the student store, and the die.
//!
//! This module owns:
//!   - the single global course (replaced wholesale on save)
//!   - the singleton student and the die, behind ONE mutex so every
//!     read-modify-write on the student is serialized
//!   - the optional snapshot file
//!
//! Lock order is always student, then course. Snapshots are written while
//! the student lock is held.

use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument, warn};

use crate::config::{load_board_config_from_env, BoardSettings};
use crate::die::{DieRoller, RandomDie};
use crate::domain::{Course, Student};
use crate::error::ProgressionError;
use crate::logic::build_course;
use crate::seeds::demo_course;
use crate::snapshot::{Snapshot, SnapshotFile};

struct StudentCell {
  student: Option<Student>,
  die: Box<dyn DieRoller + Send>,
}

pub struct AppState {
  pub settings: BoardSettings,
  course: RwLock<Option<Course>>,
  student: Mutex<StudentCell>,
  snapshot: Option<SnapshotFile>,
}

impl AppState {
  /// Build state from env: load config and snapshot, fall back to the demo course.
  #[instrument(level = "info", skip_all)]
  pub fn new() -> Self {
    let cfg = load_board_config_from_env().unwrap_or_default();
    let snapshot = SnapshotFile::from_env();
    let restored = snapshot.as_ref().and_then(|s| s.load()).unwrap_or_default();

    let course = match restored.course {
      Some(c) => {
        info!(target: "board_backend", id = %c.id, tasks = c.tasks.len(), cells = c.path_len(), "Course restored from snapshot");
        Some(c)
      }
      None => {
        let (input, origin) = match cfg.course.clone() {
          Some(c) => (c, "config"),
          None => (demo_course(), "demo_seed"),
        };
        match build_course(input, &cfg.board, &mut rand::thread_rng()) {
          Ok(c) => {
            info!(target: "board_backend", id = %c.id, tasks = c.tasks.len(), cells = c.path_len(), %origin, "Startup course built");
            Some(c)
          }
          Err(e) => {
            warn!(target: "board_backend", error = %e, %origin, "Startup course rejected; board starts empty");
            None
          }
        }
      }
    };

    if let Some(s) = &snapshot {
      info!(target: "board_backend", path = %s.path().display(), "Snapshot persistence enabled");
    }

    Self::with_parts(cfg.board, course, restored.student, Box::new(RandomDie::from_entropy()), snapshot)
  }

  pub fn with_parts(
    settings: BoardSettings,
    course: Option<Course>,
    student: Option<Student>,
    die: Box<dyn DieRoller + Send>,
    snapshot: Option<SnapshotFile>,
  ) -> Self {
    Self {
      settings,
      course: RwLock::new(course),
      student: Mutex::new(StudentCell { student, die }),
      snapshot,
    }
  }

  pub async fn get_course(&self) -> Option<Course> {
    self.course.read().await.clone()
  }

  /// Replace the course wholesale. The student's history is left alone.
  /// Saves are serialized on the student lock, so the snapshot always
  /// records the course that won in memory.
  #[instrument(level = "info", skip(self, course), fields(id = %course.id))]
  pub async fn save_course(&self, course: Course) -> Course {
    let cell = self.student.lock().await;
    *self.course.write().await = Some(course.clone());
    info!(target: "store", id = %course.id, tasks = course.tasks.len(), cells = course.path_len(), "Course saved");
    self.persist(self.get_course().await, cell.student.clone()).await;
    course
  }

  pub async fn get_student(&self) -> Option<Student> {
    self.student.lock().await.student.clone()
  }

  /// Create the singleton student if absent; idempotent.
  #[instrument(level = "debug", skip(self))]
  pub async fn ensure_student(&self) -> Student {
    let mut cell = self.student.lock().await;
    if let Some(s) = &cell.student {
      return s.clone();
    }
    let s = Student::new();
    cell.student = Some(s.clone());
    info!(target: "store", "Student created");
    self.persist(self.get_course().await, Some(s.clone())).await;
    s
  }

  /// Replace the stored profile wholesale.
  #[instrument(level = "debug", skip_all)]
  pub async fn save_student(&self, mut student: Student) -> Student {
    let mut cell = self.student.lock().await;
    student.updated_at = chrono::Utc::now();
    cell.student = Some(student.clone());
    info!(target: "store", position = student.current_position, reward = student.total_reward, "Student saved");
    self.persist(self.get_course().await, Some(student.clone())).await;
    student
  }

  /// Zero position, reward, history and pending roll (creating the student if needed).
  #[instrument(level = "info", skip(self))]
  pub async fn reset_student(&self) -> Student {
    let mut cell = self.student.lock().await;
    let student = cell.student.get_or_insert_with(Student::new);
    student.reset();
    let out = student.clone();
    info!(target: "store", "Student reset");
    self.persist(self.get_course().await, Some(out.clone())).await;
    out
  }

  /// Run `f` against the current course and a working copy of the student
  /// (created if absent). The copy replaces the stored student only when `f`
  /// succeeds; the whole call holds the student lock.
  pub async fn mutate_student<T, F>(&self, f: F) -> Result<(T, Student), ProgressionError>
  where
    F: FnOnce(&Course, &mut Student, &mut dyn DieRoller) -> Result<T, ProgressionError>,
  {
    let mut cell = self.student.lock().await;
    let course_guard = self.course.read().await;
    let course = course_guard.as_ref().ok_or(ProgressionError::NoCourse)?;

    let mut working = cell.student.clone().unwrap_or_default();
    let out = f(course, &mut working, cell.die.as_mut())?;
    cell.student = Some(working.clone());

    let course_copy = self.snapshot.as_ref().map(|_| course.clone());
    drop(course_guard);
    if let Some(course) = course_copy {
      self.persist(Some(course), Some(working.clone())).await;
    }
    Ok((out, working))
  }

  async fn persist(&self, course: Option<Course>, student: Option<Student>) {
    if let Some(file) = &self.snapshot {
      file.write(&Snapshot { course, student }).await;
    }
  }
}
