//! To-do panel: task items, filtered views and recurring tasks.
//!
//! The whole collection lives under one store key (default `todos`) and is
//! rewritten after every change. Completing a repeating task appends its
//! next occurrence; [`TodoManager::init`] also appends occurrences that were
//! missed while the dashboard was closed.

mod manager;
mod model;
pub mod recurrence;

pub use manager::TodoManager;
pub use model::{
    normalize_repeat, DueStatus, ReconcileReport, RepeatInterval, TodoEdit, TodoFilter, TodoItem,
    TodoStats, ToggleOutcome,
};
