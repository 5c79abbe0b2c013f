//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate model mutations and store writes into board operations.
//! - Keep CLI/FFI layers decoupled from storage details.

pub mod board;
