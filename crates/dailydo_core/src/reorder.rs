//! Drag-and-drop reorder arithmetic.
//!
//! # Responsibility
//! - Turn a pointer position over a rendered list into an insertion point.
//! - Move a task between two lists, or within one, at that point.
//!
//! # Invariants
//! - Insertion points count rows *without* the dragged task. `move_task`
//!   interprets target indices the same way (post-removal), so a drop index
//!   can be passed through unchanged for same-list and cross-list moves.
//! - Out-of-range targets are clamped; out-of-range sources are rejected.

use crate::model::task::{Task, TaskId};
use crate::model::task_list::TaskList;

/// Vertical bounds of one rendered row, in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedRow {
    pub task_id: TaskId,
    pub top: f64,
    pub height: f64,
}

impl RenderedRow {
    pub fn midpoint(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Insertion point for a drop at `pointer_y` over `rows`.
///
/// Among rows other than `dragged`, picks the one whose midpoint is the
/// smallest value strictly greater than `pointer_y` and returns its index
/// among those rows. When the pointer is below every midpoint (or the list
/// is empty), returns the number of non-dragged rows. Equal midpoints
/// resolve to the first in iteration order.
pub fn compute_drop_index(rows: &[RenderedRow], dragged: Option<TaskId>, pointer_y: f64) -> usize {
    let mut best: Option<(usize, f64)> = None;
    let mut remaining = 0;

    for row in rows.iter().filter(|row| Some(row.task_id) != dragged) {
        let midpoint = row.midpoint();
        if midpoint > pointer_y && best.map_or(true, |(_, current)| midpoint < current) {
            best = Some((remaining, midpoint));
        }
        remaining += 1;
    }

    best.map_or(remaining, |(index, _)| index)
}

/// Where a moved task ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub task_id: TaskId,
    pub index: usize,
}

/// Moves the task at `source_index` within one list to `target_index`
/// (post-removal indexing).
pub fn move_within(list: &mut TaskList, source_index: usize, target_index: usize) -> Option<MoveOutcome> {
    let task = list.take_at(source_index)?;
    Some(place(list, target_index, task))
}

/// Moves the task at `source_index` of `source` into `target` at
/// `target_index`. Ownership transfers; the task keeps its id.
pub fn move_across(
    source: &mut TaskList,
    source_index: usize,
    target: &mut TaskList,
    target_index: usize,
) -> Option<MoveOutcome> {
    let task = source.take_at(source_index)?;
    Some(place(target, target_index, task))
}

fn place(list: &mut TaskList, target_index: usize, task: Task) -> MoveOutcome {
    let task_id = task.id;
    let index = list.insert_clamped(target_index, task);
    MoveOutcome { task_id, index }
}
