//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose board use cases to Dart via FRB.
//! - Translate core errors into response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Tasks are addressed by their stable id string, never by position, so a
//!   stale UI snapshot cannot hit the wrong task.
//! - Board calls are serialized in-process; each one loads, mutates and
//!   writes back under one lock.
//! - Every call opens the board first, so a day change is applied before
//!   the requested action.
//! - The database path resolves like the CLI's (`AppConfig`), so both
//!   front ends share one board by default.

use dailydo_core::db::open_db;
use dailydo_core::{
    compute_drop_index, core_version as core_version_inner, init_logging as init_logging_inner,
    ping as ping_inner, AppConfig, ConfigOverrides, ListKind, RenderedRow, SqliteKvStore,
    SystemClock, Task, TaskBoard, TaskId,
};
use log::warn;
use std::sync::{Mutex, OnceLock};
use uuid::Uuid;

static BOARD_CONFIG: OnceLock<AppConfig> = OnceLock::new();
static BOARD_LOCK: Mutex<()> = Mutex::new(());

type Board = TaskBoard<SqliteKvStore, SystemClock>;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One task row for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardTaskItem {
    /// Stable task id (UUID string).
    pub task_id: String,
    pub text: String,
    pub completed: bool,
    /// Creation time, epoch milliseconds (UTC).
    pub created_at_ms: i64,
}

/// Full board state envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    pub ok: bool,
    pub message: String,
    /// `dark|light`.
    pub theme: String,
    pub daily: Vec<BoardTaskItem>,
    pub general: Vec<BoardTaskItem>,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Affected task id, when there is one.
    pub task_id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl BoardActionResponse {
    fn success(message: impl Into<String>, task_id: Option<TaskId>) -> Self {
        Self {
            ok: true,
            task_id: task_id.map(|id| id.to_string()),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            task_id: None,
            message: message.into(),
        }
    }
}

/// Vertical bounds of a rendered row in the drop target list.
#[derive(Debug, Clone, PartialEq)]
pub struct DropRow {
    pub task_id: String,
    pub top: f64,
    pub height: f64,
}

/// Theme response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeResponse {
    pub ok: bool,
    pub theme: String,
    pub message: String,
}

/// Loads both lists and the theme.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; `ok=false` with empty lists on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn board_snapshot() -> BoardSnapshot {
    match with_board(|board| Ok(snapshot_of(board))) {
        Ok(snapshot) => snapshot,
        Err(message) => BoardSnapshot {
            ok: false,
            message,
            theme: String::new(),
            daily: Vec::new(),
            general: Vec::new(),
        },
    }
}

/// Appends a task to `list` (`daily|general`).
///
/// Blank text succeeds without creating anything (`task_id=None`).
#[flutter_rust_bridge::frb(sync)]
pub fn board_add_task(list: String, text: String) -> BoardActionResponse {
    action(|board| {
        let kind = parse_list(&list)?;
        match board.add_task(kind, &text).map_err(|err| err.to_string())? {
            Some(id) => Ok(BoardActionResponse::success("task added", Some(id))),
            None => Ok(BoardActionResponse::success("blank text ignored", None)),
        }
    })
}

/// Flips completion of `task_id` in `list`.
#[flutter_rust_bridge::frb(sync)]
pub fn board_toggle_task(list: String, task_id: String) -> BoardActionResponse {
    action(|board| {
        let kind = parse_list(&list)?;
        let id = parse_task_id(&task_id)?;
        let completed = board
            .toggle_task(kind, id)
            .map_err(|err| err.to_string())?;
        let message = if completed { "completed" } else { "reopened" };
        Ok(BoardActionResponse::success(message, Some(id)))
    })
}

/// Deletes `task_id` from `list`.
#[flutter_rust_bridge::frb(sync)]
pub fn board_delete_task(list: String, task_id: String) -> BoardActionResponse {
    action(|board| {
        let kind = parse_list(&list)?;
        let id = parse_task_id(&task_id)?;
        board
            .delete_task(kind, id)
            .map_err(|err| err.to_string())?;
        Ok(BoardActionResponse::success("task deleted", Some(id)))
    })
}

/// Moves `task_id`, wherever it is, to `target_index` of `target_list`.
///
/// `target_index` is counted without the moved task and clamps to the end.
#[flutter_rust_bridge::frb(sync)]
pub fn board_move_task(
    task_id: String,
    target_list: String,
    target_index: u32,
) -> BoardActionResponse {
    action(|board| {
        let target = parse_list(&target_list)?;
        let id = parse_task_id(&task_id)?;
        let outcome = board
            .move_task_by_id(id, target, target_index as usize)
            .map_err(|err| err.to_string())?;
        Ok(BoardActionResponse::success(
            format!("moved to {target} at {}", outcome.index),
            Some(outcome.task_id),
        ))
    })
}

/// Completes a drag of `task_id` released at `pointer_y` over `target_list`.
///
/// `rows` are the target list's rendered rows in display order; the dragged
/// task's own row may be included and is ignored.
#[flutter_rust_bridge::frb(sync)]
pub fn board_drop_task(
    task_id: String,
    target_list: String,
    rows: Vec<DropRow>,
    pointer_y: f64,
) -> BoardActionResponse {
    action(|board| {
        let target = parse_list(&target_list)?;
        let id = parse_task_id(&task_id)?;
        let rows = rows
            .iter()
            .map(|row| {
                Ok(RenderedRow {
                    task_id: parse_task_id(&row.task_id)?,
                    top: row.top,
                    height: row.height,
                })
            })
            .collect::<Result<Vec<_>, String>>()?;
        let target_index = compute_drop_index(&rows, Some(id), pointer_y);
        let outcome = board
            .move_task_by_id(id, target, target_index)
            .map_err(|err| err.to_string())?;
        Ok(BoardActionResponse::success(
            format!("dropped into {target} at {}", outcome.index),
            Some(outcome.task_id),
        ))
    })
}

/// Flips between dark and light theme.
#[flutter_rust_bridge::frb(sync)]
pub fn theme_toggle() -> ThemeResponse {
    match with_board(|board| board.toggle_theme().map_err(|err| err.to_string())) {
        Ok(theme) => ThemeResponse {
            ok: true,
            theme: theme.to_string(),
            message: String::new(),
        },
        Err(message) => ThemeResponse {
            ok: false,
            theme: String::new(),
            message,
        },
    }
}

fn action(f: impl FnOnce(&mut Board) -> Result<BoardActionResponse, String>) -> BoardActionResponse {
    with_board(f).unwrap_or_else(BoardActionResponse::failure)
}

fn with_board<T>(f: impl FnOnce(&mut Board) -> Result<T, String>) -> Result<T, String> {
    let _guard = BOARD_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let config = board_config();
    config
        .ensure_dirs()
        .map_err(|err| format!("board directory setup failed: {err}"))?;
    let conn = open_db(&config.db_path).map_err(|err| format!("board DB open failed: {err}"))?;
    let kv = SqliteKvStore::try_new(conn).map_err(|err| format!("board store init failed: {err}"))?;
    let mut board =
        TaskBoard::open(kv, SystemClock).map_err(|err| format!("board load failed: {err}"))?;
    f(&mut board).map_err(|message| {
        warn!("event=ffi_call module=ffi status=error message={message}");
        message
    })
}

fn board_config() -> &'static AppConfig {
    BOARD_CONFIG.get_or_init(|| board_config_from(|key| std::env::var(key).ok()))
}

/// FFI callers pass no overrides; environment and platform defaults apply.
fn board_config_from<F>(env: F) -> AppConfig
where
    F: Fn(&str) -> Option<String>,
{
    AppConfig::resolve_with(ConfigOverrides::default(), env)
}

fn parse_list(raw: &str) -> Result<ListKind, String> {
    raw.parse()
}

fn parse_task_id(raw: &str) -> Result<TaskId, String> {
    Uuid::parse_str(raw.trim()).map_err(|err| format!("invalid task_id `{raw}`: {err}"))
}

fn snapshot_of(board: &Board) -> BoardSnapshot {
    BoardSnapshot {
        ok: true,
        message: String::new(),
        theme: board.theme().to_string(),
        daily: board.daily().iter().map(to_item).collect(),
        general: board.general().iter().map(to_item).collect(),
    }
}

fn to_item(task: &Task) -> BoardTaskItem {
    BoardTaskItem {
        task_id: task.id.to_string(),
        text: task.text.clone(),
        completed: task.completed,
        created_at_ms: task.date.timestamp_millis(),
    }
}
