//! Board controller: both task lists, their persistence and the daily reset.
//!
//! # Responsibility
//! - Own all mutable app state (lists, reset marker, theme, drag session).
//! - Write every mutation through to the store before returning.
//! - Keep the daily list valid for the current local day.
//!
//! # Invariants
//! - After `open` and before any mutation, `last_reset == clock.today()`.
//!   Every mutating call re-checks this first, so a day change is detected
//!   even when no timer fired across it.
//! - Tasks are addressed by `TaskId`; positional entry points resolve the
//!   index once, with a range check, and then work by id.
//! - Move target indices use post-removal indexing (see `reorder`).
//! - The stored reset marker is authoritative. Several boards may share one
//!   store, and only the first to see a new day clears the daily list.
//! - Ids assigned to id-less records at load are written back before
//!   `open` returns.

use crate::clock::Clock;
use crate::model::task::{normalize_text, ListKind, Task, TaskId, TaskValidationError};
use crate::model::task_list::TaskList;
use crate::model::theme::Theme;
use crate::reorder::{compute_drop_index, move_across, move_within, MoveOutcome, RenderedRow};
use crate::repo::kv_repo::{KeyValueStore, StoreError};
use crate::repo::task_store::TaskStore;
use chrono::NaiveDate;
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type BoardResult<T> = Result<T, BoardError>;

/// Errors from board operations.
#[derive(Debug)]
pub enum BoardError {
    /// Store read/write failure.
    Store(StoreError),
    /// Task input failed validation.
    Validation(TaskValidationError),
    /// A positional index did not address a task.
    IndexOutOfRange {
        list: ListKind,
        index: usize,
        len: usize,
    },
    /// No task with this id is in the addressed list.
    TaskNotFound(TaskId),
    /// A drop arrived without a drag in progress.
    NoActiveDrag,
}

impl Display for BoardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::IndexOutOfRange { list, index, len } => write!(
                f,
                "index {index} is out of range for {list} list of length {len}"
            ),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::NoActiveDrag => write!(f, "no drag in progress"),
        }
    }
}

impl Error for BoardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for BoardError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<TaskValidationError> for BoardError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

/// What caused a reset check. Only used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetTrigger {
    Startup,
    Action,
    Poll,
    Midnight,
    Manual,
}

impl ResetTrigger {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Action => "action",
            Self::Poll => "poll",
            Self::Midnight => "midnight",
            Self::Manual => "manual",
        }
    }
}

/// A drag captured at drag start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    pub source: ListKind,
    pub task_id: TaskId,
    /// Position at drag start; informational, the move resolves by id.
    pub source_index: usize,
}

/// The application state for one store.
pub struct TaskBoard<S: KeyValueStore, C: Clock> {
    store: TaskStore<S>,
    clock: C,
    daily: TaskList,
    general: TaskList,
    last_reset: NaiveDate,
    theme: Theme,
    drag: Option<DragSession>,
}

impl<S: KeyValueStore, C: Clock> TaskBoard<S, C> {
    /// Loads the board from `kv`.
    ///
    /// General tasks always load. Daily tasks load only when the stored
    /// reset marker equals today's local date; otherwise they are discarded
    /// and the cleared list and new marker are written back.
    pub fn open(kv: S, clock: C) -> BoardResult<Self> {
        let store = TaskStore::new(kv);
        let general = load_list(&store, ListKind::General)?;
        let theme = store.load_theme()?;
        let today = clock.today();
        let daily = load_daily_tasks(&store, today)?;

        info!(
            "event=board_open module=board status=ok daily={} general={} theme={}",
            daily.len(),
            general.len(),
            theme
        );

        Ok(Self {
            store,
            clock,
            daily,
            general,
            last_reset: today,
            theme,
            drag: None,
        })
    }

    pub fn tasks(&self, kind: ListKind) -> &TaskList {
        match kind {
            ListKind::Daily => &self.daily,
            ListKind::General => &self.general,
        }
    }

    pub fn daily(&self) -> &TaskList {
        &self.daily
    }

    pub fn general(&self) -> &TaskList {
        &self.general
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Local date the daily list was last cleared.
    pub fn last_reset(&self) -> NaiveDate {
        self.last_reset
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn store(&self) -> &TaskStore<S> {
        &self.store
    }

    pub fn drag_session(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    /// Clears the daily list when the local date moved past the marker.
    ///
    /// Returns `true` when the board moved to a new day. If another board on
    /// the same store already reset today, the daily list is reloaded from
    /// the store instead of cleared. Calling it again on the same day is a
    /// no-op.
    pub fn check_for_reset(&mut self) -> BoardResult<bool> {
        self.check_for_reset_with(ResetTrigger::Manual)
    }

    /// `check_for_reset` with an explicit trigger for diagnostics.
    pub fn check_for_reset_with(&mut self, trigger: ResetTrigger) -> BoardResult<bool> {
        let today = self.clock.today();
        if today == self.last_reset {
            return Ok(false);
        }

        if self.store.load_reset_marker()? == Some(today) {
            self.daily = load_list(&self.store, ListKind::Daily)?;
            let previous = std::mem::replace(&mut self.last_reset, today);
            self.cancel_daily_drag();
            info!(
                "event=daily_reset module=board status=skipped reason=already_reset trigger={} previous={} today={} daily={}",
                trigger.as_str(),
                previous,
                today,
                self.daily.len()
            );
            return Ok(true);
        }

        let cleared = self.daily.len();
        self.daily.clear();
        self.store.save_tasks(ListKind::Daily, self.daily.as_slice())?;
        self.store.save_reset_marker(today)?;
        let previous = std::mem::replace(&mut self.last_reset, today);
        self.cancel_daily_drag();

        info!(
            "event=daily_reset module=board status=ok trigger={} previous={} today={} cleared={}",
            trigger.as_str(),
            previous,
            today,
            cleared
        );
        Ok(true)
    }

    /// Appends a task to `kind`. Blank text is a silent no-op (`Ok(None)`).
    pub fn add_task(&mut self, kind: ListKind, text: &str) -> BoardResult<Option<TaskId>> {
        self.ensure_current_day()?;

        let Some(text) = normalize_text(text) else {
            debug!("event=task_add module=board status=skipped reason=blank list={kind}");
            return Ok(None);
        };
        let task = Task::new(&text, self.clock.now())?;
        let id = task.id;
        self.list_mut(kind).push(task);
        self.persist(kind)?;

        debug!("event=task_add module=board status=ok list={kind} task_id={id}");
        Ok(Some(id))
    }

    /// Flips completion of task `id` in `kind`. Returns the new state.
    pub fn toggle_task(&mut self, kind: ListKind, id: TaskId) -> BoardResult<bool> {
        self.ensure_current_day()?;

        let completed = self
            .list_mut(kind)
            .toggle(id)
            .ok_or(BoardError::TaskNotFound(id))?;
        self.persist(kind)?;

        debug!("event=task_toggle module=board status=ok list={kind} task_id={id} completed={completed}");
        Ok(completed)
    }

    /// Deletes task `id` from `kind` and returns it.
    pub fn delete_task(&mut self, kind: ListKind, id: TaskId) -> BoardResult<Task> {
        self.ensure_current_day()?;

        let removed = self
            .list_mut(kind)
            .remove(id)
            .ok_or(BoardError::TaskNotFound(id))?;
        if self.drag.is_some_and(|drag| drag.task_id == id) {
            self.drag = None;
        }
        self.persist(kind)?;

        debug!("event=task_delete module=board status=ok list={kind} task_id={id}");
        Ok(removed)
    }

    /// Resolves a render-time index to a task id.
    pub fn task_id_at(&self, kind: ListKind, index: usize) -> BoardResult<TaskId> {
        let list = self.tasks(kind);
        list.get(index)
            .map(|task| task.id)
            .ok_or(BoardError::IndexOutOfRange {
                list: kind,
                index,
                len: list.len(),
            })
    }

    /// `toggle_task` addressed by render-time index.
    pub fn toggle_at(&mut self, kind: ListKind, index: usize) -> BoardResult<bool> {
        self.ensure_current_day()?;
        let id = self.task_id_at(kind, index)?;
        self.toggle_task(kind, id)
    }

    /// `delete_task` addressed by render-time index.
    pub fn delete_at(&mut self, kind: ListKind, index: usize) -> BoardResult<Task> {
        self.ensure_current_day()?;
        let id = self.task_id_at(kind, index)?;
        self.delete_task(kind, id)
    }

    /// Moves the task at `source_index` of `source` to `target_index` of
    /// `target`, counted without the moved task. Targets past the end clamp
    /// to the end. Both touched lists are persisted.
    pub fn move_task(
        &mut self,
        source: ListKind,
        source_index: usize,
        target: ListKind,
        target_index: usize,
    ) -> BoardResult<MoveOutcome> {
        self.ensure_current_day()?;

        let source_len = self.tasks(source).len();
        let out_of_range = BoardError::IndexOutOfRange {
            list: source,
            index: source_index,
            len: source_len,
        };

        let moved = if source == target {
            move_within(self.list_mut(source), source_index, target_index)
        } else {
            let (from, to) = self.lists_mut_pair(source);
            move_across(from, source_index, to, target_index)
        };
        let outcome = moved.ok_or(out_of_range)?;

        // A failed second write may duplicate the task, never drop it.
        if source != target {
            self.persist(target)?;
        }
        self.persist(source)?;

        debug!(
            "event=task_move module=board status=ok from={source} to={target} task_id={} index={}",
            outcome.task_id, outcome.index
        );
        Ok(outcome)
    }

    /// Moves task `id` (wherever it is) into `target` at `target_index`.
    pub fn move_task_by_id(
        &mut self,
        id: TaskId,
        target: ListKind,
        target_index: usize,
    ) -> BoardResult<MoveOutcome> {
        self.ensure_current_day()?;
        let (source, source_index) = self.locate(id).ok_or(BoardError::TaskNotFound(id))?;
        self.move_task(source, source_index, target, target_index)
    }

    /// Starts dragging the task at `index` of `kind`.
    pub fn begin_drag(&mut self, kind: ListKind, index: usize) -> BoardResult<DragSession> {
        self.ensure_current_day()?;
        let task_id = self.task_id_at(kind, index)?;
        let session = DragSession {
            source: kind,
            task_id,
            source_index: index,
        };
        self.drag = Some(session);
        Ok(session)
    }

    /// Ends a drag without moving anything.
    pub fn cancel_drag(&mut self) -> Option<DragSession> {
        self.drag.take()
    }

    /// Drops the dragged task over `target` at `pointer_y`.
    ///
    /// `rows` are the rendered rows of `target` in display order; the
    /// dragged task's own row, if present, is ignored.
    pub fn drop_dragged(
        &mut self,
        target: ListKind,
        rows: &[RenderedRow],
        pointer_y: f64,
    ) -> BoardResult<MoveOutcome> {
        let session = self.drag.take().ok_or(BoardError::NoActiveDrag)?;
        self.ensure_current_day()?;

        let source_index = self
            .tasks(session.source)
            .position(session.task_id)
            .ok_or(BoardError::TaskNotFound(session.task_id))?;
        let target_index = compute_drop_index(rows, Some(session.task_id), pointer_y);
        self.move_task(session.source, source_index, target, target_index)
    }

    /// Flips the theme and persists it.
    pub fn toggle_theme(&mut self) -> BoardResult<Theme> {
        self.set_theme(self.theme.toggled())
    }

    pub fn set_theme(&mut self, theme: Theme) -> BoardResult<Theme> {
        self.store.save_theme(theme)?;
        self.theme = theme;
        debug!("event=theme_set module=board status=ok theme={theme}");
        Ok(theme)
    }

    fn ensure_current_day(&mut self) -> BoardResult<()> {
        self.check_for_reset_with(ResetTrigger::Action).map(|_| ())
    }

    fn cancel_daily_drag(&mut self) {
        if self.drag.is_some_and(|drag| drag.source == ListKind::Daily) {
            self.drag = None;
        }
    }

    fn locate(&self, id: TaskId) -> Option<(ListKind, usize)> {
        ListKind::ALL
            .into_iter()
            .find_map(|kind| self.tasks(kind).position(id).map(|index| (kind, index)))
    }

    fn list_mut(&mut self, kind: ListKind) -> &mut TaskList {
        match kind {
            ListKind::Daily => &mut self.daily,
            ListKind::General => &mut self.general,
        }
    }

    /// `(source, other)` as disjoint mutable borrows.
    fn lists_mut_pair(&mut self, source: ListKind) -> (&mut TaskList, &mut TaskList) {
        match source {
            ListKind::Daily => (&mut self.daily, &mut self.general),
            ListKind::General => (&mut self.general, &mut self.daily),
        }
    }

    fn persist(&self, kind: ListKind) -> BoardResult<()> {
        self.store.save_tasks(kind, self.tasks(kind).as_slice())?;
        Ok(())
    }
}

fn load_daily_tasks<S: KeyValueStore>(store: &TaskStore<S>, today: NaiveDate) -> BoardResult<TaskList> {
    let marker = store.load_reset_marker()?;
    if marker == Some(today) {
        return load_list(store, ListKind::Daily);
    }

    store.save_tasks(ListKind::Daily, &[])?;
    store.save_reset_marker(today)?;
    info!(
        "event=daily_reset module=board status=ok trigger={} previous={} today={}",
        ResetTrigger::Startup.as_str(),
        marker.map_or_else(|| "none".to_string(), |date| date.to_string()),
        today
    );
    Ok(TaskList::new())
}

/// Loads `kind`, writing it straight back when ids had to be assigned.
fn load_list<S: KeyValueStore>(store: &TaskStore<S>, kind: ListKind) -> BoardResult<TaskList> {
    let loaded = store.load_tasks_checked(kind)?;
    if loaded.assigned_ids > 0 {
        store.save_tasks(kind, &loaded.tasks)?;
        info!(
            "event=store_assign_ids module=board status=ok list={kind} assigned={}",
            loaded.assigned_ids
        );
    }
    Ok(TaskList::from_tasks(loaded.tasks))
}
