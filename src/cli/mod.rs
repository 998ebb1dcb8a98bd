//! Command-line interface for tabboard
//!
//! This module defines the CLI structure using clap derive macros. The CLI
//! plays the role of the dashboard front end: every invocation opens the
//! store, runs the startup reconciliation, then performs one action.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::clock::{Clock, FixedClock, SystemClock};
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputMode;
use crate::storage::FileStore;
use crate::todo::TodoManager;

mod todo;

/// tabboard - new-tab dashboard engine
///
/// Manages the dashboard's to-do list, including recurring tasks, in a
/// local key-value store.
#[derive(Parser, Debug)]
#[command(name = "tabboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Store file (defaults to the platform data directory)
    #[arg(long, global = true, env = "TABBOARD_STORE")]
    pub store: Option<PathBuf>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "TABBOARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Pin the current time (RFC 3339); its offset is used as the local zone
    #[arg(long, global = true, env = "TABBOARD_NOW", hide = true)]
    pub now: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// To-do list management
    #[command(subcommand)]
    Todo(TodoCommands),
}

/// To-do subcommands
#[derive(Subcommand, Debug)]
pub enum TodoCommands {
    /// Add a task
    Add {
        /// Task text
        text: String,

        /// Due date: RFC 3339, "YYYY-MM-DD HH:MM" or "YYYY-MM-DD" (local time)
        #[arg(long)]
        due: Option<String>,

        /// Repeat rule: none, daily, weekly, monthly, custom
        #[arg(long, default_value = "none")]
        repeat: String,

        /// Days between occurrences (with --repeat custom)
        #[arg(long)]
        every: Option<u32>,
    },

    /// Toggle completion of a task
    #[command(alias = "done")]
    Toggle {
        /// Task ID
        id: String,
    },

    /// Delete a task
    Rm {
        /// Task ID
        id: String,
    },

    /// Edit a task
    Edit {
        /// Task ID
        id: String,

        /// New text
        #[arg(long)]
        text: Option<String>,

        /// New due date
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,

        /// Remove the due date
        #[arg(long)]
        clear_due: bool,

        /// New repeat rule
        #[arg(long)]
        repeat: Option<String>,

        /// Days between occurrences (with --repeat custom)
        #[arg(long, requires = "repeat")]
        every: Option<u32>,
    },

    /// List tasks in a filter tab
    Ls {
        /// Filter: today, upcoming, completed (default from config)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Show task counters
    Stats,

    /// Remove completed tasks older than N days
    Clear {
        /// Age threshold in days (default from config)
        #[arg(long)]
        days: Option<u32>,
    },
}

/// Engine plus output settings for one CLI invocation
pub(crate) struct Session<C: Clock> {
    pub manager: TodoManager<FileStore, C>,
    pub output: OutputMode,
    pub reconciled: usize,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let config = match self.config.clone().or_else(Config::default_path) {
            Some(path) => Config::load_or_default(&path)?,
            None => Config::default(),
        };
        let store_path = match &self.store {
            Some(path) => path.clone(),
            None => config.store_path()?,
        };
        let store = FileStore::new(store_path).with_lock_timeout(config.storage.lock_timeout_ms);
        let output = OutputMode::from_flags(self.json, self.quiet);

        match self.now.as_deref() {
            Some(now) => {
                let clock = FixedClock::parse(now)?;
                run_command(self.command, store, clock, config, output)
            }
            None => run_command(self.command, store, SystemClock, config, output),
        }
    }
}

fn run_command<C: Clock>(
    command: Commands,
    store: FileStore,
    clock: C,
    config: Config,
    output: OutputMode,
) -> Result<()> {
    let mut manager = TodoManager::new(store, clock, config.todos);
    let report = manager.init()?;
    let mut session = Session {
        manager,
        output,
        reconciled: report.generated.len(),
    };

    match command {
        Commands::Todo(cmd) => match cmd {
            TodoCommands::Add {
                text,
                due,
                repeat,
                every,
            } => todo::run_add(
                &mut session,
                todo::AddOptions {
                    text,
                    due,
                    repeat,
                    every,
                },
            ),
            TodoCommands::Toggle { id } => todo::run_toggle(&mut session, &id),
            TodoCommands::Rm { id } => todo::run_rm(&mut session, &id),
            TodoCommands::Edit {
                id,
                text,
                due,
                clear_due,
                repeat,
                every,
            } => todo::run_edit(
                &mut session,
                todo::EditOptions {
                    id,
                    text,
                    due,
                    clear_due,
                    repeat,
                    every,
                },
            ),
            TodoCommands::Ls { filter } => todo::run_ls(&mut session, filter.as_deref()),
            TodoCommands::Stats => todo::run_stats(&session),
            TodoCommands::Clear { days } => todo::run_clear(&mut session, days),
        },
    }
}
