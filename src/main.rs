//! tabboard - new-tab dashboard CLI
//!
//! Drives the dashboard's to-do engine from the command line: add, complete,
//! edit and list tasks, including recurring ones.

use clap::Parser;
use tabboard::cli::Cli;
use tabboard::output::{emit_error, infer_command_name_from_args, OutputMode};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    // Tracing is opt-in via RUST_LOG; an unusable filter leaves it off.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() || raw.len() > 4096 {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let command = infer_command_name_from_args();
    let cli = Cli::parse();
    let mode = OutputMode::from_flags(cli.json, cli.quiet);
    if let Err(err) = cli.run() {
        let _ = emit_error(&command, &err, mode);
        std::process::exit(err.exit_code());
    }
}
