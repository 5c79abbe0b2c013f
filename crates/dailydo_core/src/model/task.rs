//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record stored in both lists.
//! - Name the two lists a task can live in.
//!
//! # Invariants
//! - `id` is stable for the task lifetime and survives moves between lists.
//! - `text` is trimmed and never empty.
//! - `date` is the creation instant and is never rewritten.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier for a task.
pub type TaskId = Uuid;

/// The two task lists of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    /// Cleared at every local calendar-day rollover.
    Daily,
    /// Kept until explicitly deleted.
    General,
}

impl ListKind {
    pub const ALL: [ListKind; 2] = [ListKind::Daily, ListKind::General];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::General => "general",
        }
    }
}

impl Display for ListKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" | "d" => Ok(Self::Daily),
            "general" | "g" => Ok(Self::General),
            other => Err(format!("unknown list `{other}`; expected daily|general")),
        }
    }
}

/// Validation failures for task construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Text is empty after trimming.
    EmptyText,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "task text must not be blank"),
        }
    }
}

impl Error for TaskValidationError {}

/// One to-do item.
///
/// Serialized as `{id, text, completed, date}`. Records written before ids
/// existed carry only `{text, completed, date}`; those get a fresh id on
/// decode so every in-memory task is addressable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default = "Uuid::new_v4")]
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    /// Creation instant, ISO-8601 on the wire.
    pub date: DateTime<Utc>,
}

impl Task {
    /// Creates an incomplete task from user input.
    ///
    /// # Errors
    /// - `TaskValidationError::EmptyText` when `text` is blank after trim.
    pub fn new(text: &str, created_at: DateTime<Utc>) -> Result<Self, TaskValidationError> {
        Self::with_id(Uuid::new_v4(), text, created_at)
    }

    /// Creates a task with a caller-provided id.
    pub fn with_id(
        id: TaskId,
        text: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Self, TaskValidationError> {
        let text = normalize_text(text).ok_or(TaskValidationError::EmptyText)?;
        Ok(Self {
            id,
            text,
            completed: false,
            date: created_at,
        })
    }

    /// Flips the completion flag.
    pub fn toggle(&mut self) {
        self.completed = !self.completed;
    }
}

/// Trims user input, returning `None` when nothing is left.
pub fn normalize_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
