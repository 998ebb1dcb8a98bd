//! tabboard - new-tab dashboard engine
//!
//! This library provides the data layer behind a new-tab dashboard: a to-do
//! list with recurring tasks, persisted to a local key-value store.
//!
//! # Core Concepts
//!
//! - **Todos**: tasks with optional due dates, shown under today / upcoming /
//!   completed tabs split on local midnight
//! - **Recurrence**: completing a daily, weekly, monthly or custom-interval
//!   task appends its next occurrence
//! - **Reconciliation**: on startup, occurrences missed while the dashboard
//!   was closed are regenerated
//! - **Store**: whole-value JSON entries under string keys
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `clock`: Time source and local day boundaries
//! - `config`: Configuration loading from `tabboard.toml`
//! - `error`: Error types and result aliases
//! - `lock`: File locking and atomic writes for the store file
//! - `output`: Human and JSON output for CLI commands
//! - `storage`: Key-value store trait and implementations
//! - `todo`: Task model, recurrence rules and the to-do engine

pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod lock;
pub mod output;
pub mod storage;
pub mod todo;

pub use error::{Error, Result};
