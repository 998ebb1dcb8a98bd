//! Rendering of command results.
//!
//! Every command builds a [`Report`] for people and hands a serializable
//! payload for `--json`; [`emit_success`] picks one based on the
//! [`OutputMode`]. JSON results share one envelope shape:
//!
//! ```text
//! {"schema_version": "tabboard.v1", "command": "todo add", "status": "success",
//!  "data": {...}, "warnings": [...], "next_steps": [...]}
//! ```

use serde::Serialize;

use crate::error::{Error, JsonError, Result};

pub const SCHEMA_VERSION: &str = "tabboard.v1";

/// How results are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
    /// Human mode with successful reports suppressed
    Quiet,
}

impl OutputMode {
    /// `--json` wins over `--quiet`
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        match (json, quiet) {
            (true, _) => OutputMode::Json,
            (false, true) => OutputMode::Quiet,
            (false, false) => OutputMode::Human,
        }
    }

    pub fn is_json(self) -> bool {
        self == OutputMode::Json
    }
}

/// Human-readable result of one command
#[derive(Debug, Clone, Default)]
pub struct Report {
    title: String,
    fields: Vec<(String, String)>,
    rows: Vec<String>,
    warnings: Vec<String>,
    hints: Vec<String>,
}

impl Report {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Labelled value shown under the title
    pub fn push_field(&mut self, label: impl Into<String>, value: impl ToString) {
        self.fields.push((label.into(), value.to_string()));
    }

    /// Free-form line, e.g. one task of a listing
    pub fn push_row(&mut self, row: impl Into<String>) {
        self.rows.push(row.into());
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Suggested follow-up command
    pub fn push_hint(&mut self, hint: impl Into<String>) {
        self.hints.push(hint.into());
    }

    pub fn render(&self) -> String {
        let mut out = self.title.clone();

        let width = self
            .fields
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(0);
        for (label, value) in &self.fields {
            out.push_str(&format!("\n  {label:<width$}  {value}"));
        }

        if !self.rows.is_empty() {
            out.push('\n');
            for row in &self.rows {
                out.push_str(&format!("\n  {row}"));
            }
        }

        if !self.warnings.is_empty() || !self.hints.is_empty() {
            out.push('\n');
        }
        for warning in &self.warnings {
            out.push_str(&format!("\nwarning: {warning}"));
        }
        for hint in &self.hints {
            out.push_str(&format!("\nhint: {hint}"));
        }
        out
    }
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum Status {
    Success,
    Error,
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonError>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    warnings: &'a [String],
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    next_steps: &'a [String],
}

impl<T: Serialize> Envelope<'_, T> {
    fn print(&self) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }
}

/// Write a successful result: `data` in JSON mode, `report` otherwise
pub fn emit_success<T: Serialize>(
    mode: OutputMode,
    command: &str,
    data: &T,
    report: &Report,
) -> Result<()> {
    match mode {
        OutputMode::Json => Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: Status::Success,
            data: Some(data),
            error: None,
            warnings: &report.warnings,
            next_steps: &report.hints,
        }
        .print(),
        OutputMode::Quiet => Ok(()),
        OutputMode::Human => {
            println!("{}", report.render());
            Ok(())
        }
    }
}

/// Report a failed command. JSON goes to stdout, text to stderr.
pub fn emit_error(command: &str, err: &Error, mode: OutputMode) -> Result<()> {
    let hints = error_hints(err);
    if mode.is_json() {
        return Envelope::<()> {
            schema_version: SCHEMA_VERSION,
            command,
            status: Status::Error,
            data: None,
            error: Some(JsonError::from(err)),
            warnings: &[],
            next_steps: &hints,
        }
        .print();
    }

    eprintln!("error: {err}");
    for hint in &hints {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

/// `todo add`-style command name read from the raw arguments, for error
/// envelopes produced before or during clap parsing
pub fn infer_command_name_from_args() -> String {
    command_name(std::env::args().skip(1))
}

fn command_name(args: impl IntoIterator<Item = String>) -> String {
    let mut words = args.into_iter().filter(|arg| !arg.starts_with('-'));
    match (words.next(), words.next()) {
        (Some(group), Some(sub)) if group == "todo" => format!("{group} {sub}"),
        (Some(group), _) => group,
        (None, _) => "tabboard".to_string(),
    }
}

fn error_hints(err: &Error) -> Vec<String> {
    let hint = match err {
        Error::InvalidConfig(_) | Error::TomlParse(_) => "fix tabboard.toml then retry",
        Error::LockFailed(_) => "retry once other tabboard processes finish",
        Error::Storage(_) | Error::Json(_) => "check the store file passed with --store",
        _ => return Vec::new(),
    };
    vec![hint.to_string()]
}
