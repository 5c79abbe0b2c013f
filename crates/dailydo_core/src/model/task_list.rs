//! Ordered task collection.
//!
//! # Invariants
//! - Vector order is display order and persistence order.
//! - Ids are unique within a list; positions are dense.
//! - Positional accessors are range-checked and never panic.

use super::task::{Task, TaskId};

/// An ordered list of tasks owned by one board slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    pub fn find(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn push(&mut self, task: Task) {
        self.tasks.push(task);
    }

    /// Flips completion of the task with `id`. Returns the new state.
    pub fn toggle(&mut self, id: TaskId) -> Option<bool> {
        let task = self.tasks.iter_mut().find(|task| task.id == id)?;
        task.toggle();
        Some(task.completed)
    }

    /// Removes and returns the task with `id`; later tasks shift down by one.
    pub fn remove(&mut self, id: TaskId) -> Option<Task> {
        let index = self.position(id)?;
        Some(self.tasks.remove(index))
    }

    /// Removes and returns the task at `index`.
    pub fn take_at(&mut self, index: usize) -> Option<Task> {
        (index < self.tasks.len()).then(|| self.tasks.remove(index))
    }

    /// Inserts at `index`, clamped to the current length. Returns the
    /// position actually used.
    pub fn insert_clamped(&mut self, index: usize, task: Task) -> usize {
        let index = index.min(self.tasks.len());
        self.tasks.insert(index, task);
        index
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn into_vec(self) -> Vec<Task> {
        self.tasks
    }
}

impl<'a> IntoIterator for &'a TaskList {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}
