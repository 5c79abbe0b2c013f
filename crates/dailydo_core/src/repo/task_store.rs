//! Typed persistence for the board over a `KeyValueStore`.
//!
//! # Responsibility
//! - Map task lists, the reset marker and the theme to their store keys.
//! - Decode leniently: absent or malformed values read as the default.
//!
//! # Invariants
//! - Key names match the legacy web-storage keys, so existing data imports
//!   unchanged.
//! - Decode never fails; encode failures and store failures propagate.
//! - Records stored without an `id` are given one on load and reported, so
//!   the caller can write the list back before handing ids out.

use super::kv_repo::{KeyValueStore, StoreResult};
use crate::model::task::{ListKind, Task, TaskId};
use crate::model::theme::Theme;
use chrono::{DateTime, NaiveDate, Utc};
use log::warn;
use serde::Deserialize;
use uuid::Uuid;

pub const THEME_KEY: &str = "theme";
pub const DAILY_TASKS_KEY: &str = "dailyTasks";
pub const GENERAL_TASKS_KEY: &str = "generalTasks";
pub const LAST_RESET_DATE_KEY: &str = "lastResetDate";

const RESET_MARKER_FORMAT: &str = "%Y-%m-%d";

/// Store key holding the tasks of `kind`.
pub fn tasks_key(kind: ListKind) -> &'static str {
    match kind {
        ListKind::Daily => DAILY_TASKS_KEY,
        ListKind::General => GENERAL_TASKS_KEY,
    }
}

/// A decoded list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedTasks {
    pub tasks: Vec<Task>,
    /// Records that had no `id` and were given a fresh one.
    pub assigned_ids: usize,
}

/// Wire shape of a task as it may exist in older data.
#[derive(Deserialize)]
struct StoredTask {
    #[serde(default)]
    id: Option<TaskId>,
    text: String,
    #[serde(default)]
    completed: bool,
    date: DateTime<Utc>,
}

/// Typed view over a string store.
pub struct TaskStore<S: KeyValueStore> {
    kv: S,
}

impl<S: KeyValueStore> TaskStore<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }

    /// Loads one list. Missing key or undecodable JSON yields an empty list.
    pub fn load_tasks(&self, kind: ListKind) -> StoreResult<Vec<Task>> {
        Ok(self.load_tasks_checked(kind)?.tasks)
    }

    /// `load_tasks`, also counting records that had to be given an id.
    ///
    /// Assigned ids are random, so they only stay stable once the list is
    /// saved back.
    pub fn load_tasks_checked(&self, kind: ListKind) -> StoreResult<LoadedTasks> {
        let key = tasks_key(kind);
        let Some(raw) = self.kv.get(key)? else {
            return Ok(LoadedTasks::default());
        };
        let stored = match serde_json::from_str::<Option<Vec<StoredTask>>>(&raw) {
            Ok(stored) => stored.unwrap_or_default(),
            Err(err) => {
                warn!(
                    "event=store_decode module=store status=fallback key={key} bytes={} error={err}",
                    raw.len()
                );
                return Ok(LoadedTasks::default());
            }
        };

        let mut assigned_ids = 0;
        let tasks = stored
            .into_iter()
            .map(|record| Task {
                id: record.id.unwrap_or_else(|| {
                    assigned_ids += 1;
                    Uuid::new_v4()
                }),
                text: record.text,
                completed: record.completed,
                date: record.date,
            })
            .collect();
        Ok(LoadedTasks {
            tasks,
            assigned_ids,
        })
    }

    pub fn save_tasks(&self, kind: ListKind, tasks: &[Task]) -> StoreResult<()> {
        let encoded = serde_json::to_string(tasks)?;
        self.kv.set(tasks_key(kind), &encoded)
    }

    /// Loads the reset marker. Unparseable values read as absent, which
    /// forces a reset on the next check.
    pub fn load_reset_marker(&self) -> StoreResult<Option<NaiveDate>> {
        let Some(raw) = self.kv.get(LAST_RESET_DATE_KEY)? else {
            return Ok(None);
        };
        match NaiveDate::parse_from_str(raw.trim(), RESET_MARKER_FORMAT) {
            Ok(date) => Ok(Some(date)),
            Err(err) => {
                warn!(
                    "event=store_decode module=store status=fallback key={LAST_RESET_DATE_KEY} error={err}"
                );
                Ok(None)
            }
        }
    }

    pub fn save_reset_marker(&self, date: NaiveDate) -> StoreResult<()> {
        self.kv.set(
            LAST_RESET_DATE_KEY,
            &date.format(RESET_MARKER_FORMAT).to_string(),
        )
    }

    pub fn load_theme(&self) -> StoreResult<Theme> {
        Ok(self
            .kv
            .get(THEME_KEY)?
            .as_deref()
            .and_then(Theme::parse)
            .unwrap_or_default())
    }

    pub fn save_theme(&self, theme: Theme) -> StoreResult<()> {
        self.kv.set(THEME_KEY, theme.as_str())
    }
}
