//! Core domain logic for dailydo: two task lists, one of which empties itself
//! at every local midnight.
//! This crate is the single source of truth for board invariants; the CLI and
//! FFI crates only translate input and render state.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod reorder;
pub mod repo;
pub mod scheduler;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, ConfigError, ConfigOverrides};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::task::{ListKind, Task, TaskId, TaskValidationError};
pub use model::task_list::TaskList;
pub use model::theme::Theme;
pub use reorder::{compute_drop_index, MoveOutcome, RenderedRow};
pub use repo::kv_repo::{KeyValueStore, SqliteKvStore, StoreError, StoreResult};
pub use repo::task_store::{LoadedTasks, TaskStore};
pub use scheduler::{duration_until_next_midnight, run_reset_schedule, ResetSchedule};
pub use service::board::{BoardError, BoardResult, DragSession, ResetTrigger, TaskBoard};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
