//! tabboard todo command implementations.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use super::Session;
use crate::clock::{resolve_local, Clock, DayWindow};
use crate::error::{Error, Result};
use crate::output::{emit_success, Report};
use crate::todo::{DueStatus, RepeatInterval, TodoEdit, TodoFilter, TodoItem, TodoStats};

const LOCAL_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

pub struct AddOptions {
    pub text: String,
    pub due: Option<String>,
    pub repeat: String,
    pub every: Option<u32>,
}

pub struct EditOptions {
    pub id: String,
    pub text: Option<String>,
    pub due: Option<String>,
    pub clear_due: bool,
    pub repeat: Option<String>,
    pub every: Option<u32>,
}

#[derive(Serialize)]
struct LookupOutput {
    id: String,
    found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    task: Option<TodoItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next: Option<TodoItem>,
}

#[derive(Serialize)]
struct TodoRow<'a> {
    #[serde(flatten)]
    task: &'a TodoItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_status: Option<DueStatus>,
}

#[derive(Serialize)]
struct ListOutput<'a> {
    filter: TodoFilter,
    day_start: DateTime<Utc>,
    day_end: DateTime<Utc>,
    todos: Vec<TodoRow<'a>>,
}

#[derive(Serialize)]
struct ClearOutput {
    removed: usize,
    days: u32,
}

pub fn run_add<C: Clock>(session: &mut Session<C>, options: AddOptions) -> Result<()> {
    if options.text.trim().is_empty() {
        return Err(Error::InvalidArgument("text cannot be empty".to_string()));
    }
    let tz = session.manager.clock().now().timezone();
    let due = options
        .due
        .as_deref()
        .map(|raw| parse_when("due", raw, &tz))
        .transpose()?;
    let repeat: RepeatInterval = options.repeat.parse()?;
    if options.every.is_some() && repeat != RepeatInterval::Custom {
        return Err(Error::InvalidArgument(
            "--every only applies to --repeat custom".to_string(),
        ));
    }

    let Some(task) = session.manager.add_task(&options.text, due, repeat, options.every)? else {
        return Err(Error::InvalidArgument("text cannot be empty".to_string()));
    };

    let window = session.manager.day_window();
    let mut report = Report::new("Todo added");
    push_reconciled(&mut report, session.reconciled);
    push_task_summary(&mut report, &task, &window, &tz);
    if task.is_repeating() && task.due_date.is_none() {
        report.push_warning("repeating task has no due date; no occurrences will be generated");
    }

    emit_success(session.output, "todo add", &task, &report)
}

pub fn run_toggle<C: Clock>(session: &mut Session<C>, id: &str) -> Result<()> {
    let tz = session.manager.clock().now().timezone();
    let window = session.manager.day_window();
    let outcome = session.manager.toggle_complete(id)?;

    let mut report;
    let output = match outcome {
        Some(outcome) => {
            report = Report::new(if outcome.task.completed {
                "Todo completed"
            } else {
                "Todo reopened"
            });
            push_reconciled(&mut report, session.reconciled);
            push_task_summary(&mut report, &outcome.task, &window, &tz);
            if let Some(next) = &outcome.next {
                let due = next
                    .due_date
                    .map(|due| format_local(due, &tz))
                    .unwrap_or_default();
                report.push_field("Next", format!("{} due {due}", next.id));
            }
            LookupOutput {
                id: id.to_string(),
                found: true,
                task: Some(outcome.task),
                next: outcome.next,
            }
        }
        None => {
            report = not_found(id);
            push_reconciled(&mut report, session.reconciled);
            LookupOutput {
                id: id.to_string(),
                found: false,
                task: None,
                next: None,
            }
        }
    };

    emit_success(session.output, "todo toggle", &output, &report)
}

pub fn run_rm<C: Clock>(session: &mut Session<C>, id: &str) -> Result<()> {
    let removed = session.manager.delete_task(id)?;

    let mut report = match &removed {
        Some(task) => {
            let mut report = Report::new("Todo deleted");
            report.push_field("ID", task.id.clone());
            report.push_field("Text", task.text.clone());
            report
        }
        None => not_found(id),
    };
    push_reconciled(&mut report, session.reconciled);

    let output = LookupOutput {
        id: id.to_string(),
        found: removed.is_some(),
        task: removed,
        next: None,
    };
    emit_success(session.output, "todo rm", &output, &report)
}

pub fn run_edit<C: Clock>(session: &mut Session<C>, options: EditOptions) -> Result<()> {
    let tz = session.manager.clock().now().timezone();
    let due_date = if options.clear_due {
        Some(None)
    } else {
        options
            .due
            .as_deref()
            .map(|raw| parse_when("due", raw, &tz).map(Some))
            .transpose()?
    };
    let repeat = match options.repeat.as_deref() {
        Some(raw) => Some((raw.parse::<RepeatInterval>()?, options.every)),
        None => None,
    };
    let edit = TodoEdit {
        text: options.text,
        due_date,
        repeat,
    };
    if edit.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to change; pass --text, --due, --clear-due or --repeat".to_string(),
        ));
    }

    let window = session.manager.day_window();
    let updated = session.manager.edit_task(&options.id, edit)?;
    let mut report = match &updated {
        Some(task) => {
            let mut report = Report::new("Todo updated");
            push_task_summary(&mut report, task, &window, &tz);
            report
        }
        None => not_found(&options.id),
    };
    push_reconciled(&mut report, session.reconciled);

    let output = LookupOutput {
        id: options.id,
        found: updated.is_some(),
        task: updated,
        next: None,
    };
    emit_success(session.output, "todo edit", &output, &report)
}

pub fn run_ls<C: Clock>(session: &mut Session<C>, filter: Option<&str>) -> Result<()> {
    if let Some(raw) = filter {
        session.manager.set_filter(raw.parse()?);
    }
    let filter = session.manager.current_filter();
    let tz = session.manager.clock().now().timezone();
    let window = session.manager.day_window();
    let view = session.manager.current_view();

    let mut report = Report::new(format!("Todos ({filter}): {}", view.len()));
    push_reconciled(&mut report, session.reconciled);
    for task in &view {
        report.push_row(format_row(task, &window, &tz));
    }
    if view.is_empty() && filter == TodoFilter::Today {
        report.push_hint("tabboard todo add \"...\"");
    }

    let output = ListOutput {
        filter,
        day_start: window.start,
        day_end: window.end,
        todos: view
            .iter()
            .map(|&task| TodoRow {
                task,
                due_status: task.due_status(&window),
            })
            .collect(),
    };
    emit_success(session.output, "todo ls", &output, &report)
}

pub fn run_stats<C: Clock>(session: &Session<C>) -> Result<()> {
    let stats: TodoStats = session.manager.stats();

    let mut report = Report::new("Todo stats");
    push_reconciled(&mut report, session.reconciled);
    report.push_field("Total", stats.total);
    report.push_field("Today", stats.today);
    report.push_field("Upcoming", stats.upcoming);
    report.push_field("Overdue", stats.overdue);
    report.push_field("Completed", stats.completed);

    emit_success(session.output, "todo stats", &stats, &report)
}

pub fn run_clear<C: Clock>(session: &mut Session<C>, days: Option<u32>) -> Result<()> {
    let days = days.unwrap_or(session.manager.config().clear_after_days);
    let removed = session.manager.clear_completed_older_than(days)?;

    let mut report = if removed == 0 {
        Report::new(format!("No completed todos older than {days} days"))
    } else {
        let mut report = Report::new("Completed todos cleared");
        report.push_field("Removed", removed);
        report
    };
    push_reconciled(&mut report, session.reconciled);

    emit_success(
        session.output,
        "todo clear",
        &ClearOutput { removed, days },
        &report,
    )
}

/// Parse a user-supplied instant. Anything without an explicit offset is
/// read as local time in `tz`; a bare date means local midnight.
pub fn parse_when<Tz: TimeZone>(label: &str, raw: &str, tz: &Tz) -> Result<DateTime<Utc>> {
    let value = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    let naive = LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| {
            Error::InvalidArgument(format!(
                "invalid {label} '{raw}' (expected RFC 3339, YYYY-MM-DD HH:MM or YYYY-MM-DD)"
            ))
        })?;
    Ok(resolve_local(tz, naive).with_timezone(&Utc))
}

fn format_local<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> String {
    instant
        .with_timezone(tz)
        .naive_local()
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

fn format_row<Tz: TimeZone>(task: &TodoItem, window: &DayWindow, tz: &Tz) -> String {
    let mut line = format!(
        "[{}] {} ({})",
        if task.completed { "x" } else { " " },
        task.text,
        task.id
    );
    if let Some(due) = task.due_date {
        line.push_str(&format!(" due {}", format_local(due, tz)));
        if !task.completed && DueStatus::classify(due, window) == DueStatus::Overdue {
            line.push_str(" overdue");
        }
    }
    if let Some(label) = task.repeat_label() {
        line.push_str(&format!(" repeats {label}"));
    }
    line
}

fn push_task_summary<Tz: TimeZone>(
    report: &mut Report,
    task: &TodoItem,
    window: &DayWindow,
    tz: &Tz,
) {
    report.push_field("ID", task.id.clone());
    report.push_field("Text", task.text.clone());
    if let Some(due) = task.due_date {
        let status = DueStatus::classify(due, window).as_str();
        report.push_field("Due", format!("{} ({status})", format_local(due, tz)));
    }
    if let Some(label) = task.repeat_label() {
        report.push_field("Repeats", label);
    }
}

fn push_reconciled(report: &mut Report, count: usize) {
    if count > 0 {
        report.push_field("Regenerated", format!("{count} missed occurrence(s)"));
    }
}

fn not_found(id: &str) -> Report {
    let mut report = Report::new("Nothing changed");
    report.push_warning(format!("no todo with id {id}"));
    report.push_hint("tabboard todo ls");
    report
}
