//! Domain model for the two task lists.
//!
//! # Responsibility
//! - Define canonical data structures used by board logic.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`; list position is only
//!   display order.

pub mod task;
pub mod task_list;
pub mod theme;
