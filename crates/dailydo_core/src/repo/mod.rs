//! Persistence boundary: the key-value store and the typed task store on
//! top of it.
//!
//! # Invariants
//! - Every board mutation is written through `TaskStore` before it returns.
//! - Store APIs return transport errors; decode problems are absorbed.

pub mod kv_repo;
pub mod task_store;
