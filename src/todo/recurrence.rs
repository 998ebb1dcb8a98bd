//! Next-occurrence arithmetic for repeating tasks.
//!
//! Daily, weekly and custom rules add whole 24h blocks to the due instant.
//! Monthly keeps the local wall-clock time and day-of-month and moves one
//! calendar month forward; a day-of-month the target month lacks rolls over
//! into the following month (Jan 31 -> Mar 3, or Mar 2 in a leap year).

use std::num::NonZeroU32;

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, TimeZone, Utc};

use crate::clock::{resolve_local, DAY_MS};
use crate::todo::model::{RepeatInterval, TodoItem};

/// Due date of the occurrence after one due at `due`.
///
/// `tz` is the user's zone; only the monthly rule looks at it. Returns
/// `None` for `RepeatInterval::None`, for a custom rule without a day
/// count, and if the result falls outside chrono's range.
pub fn next_due<Tz: TimeZone>(
    due: DateTime<Utc>,
    interval: RepeatInterval,
    custom_days: Option<NonZeroU32>,
    tz: &Tz,
) -> Option<DateTime<Utc>> {
    match interval {
        RepeatInterval::None => None,
        RepeatInterval::Daily => add_days(due, 1),
        RepeatInterval::Weekly => add_days(due, 7),
        RepeatInterval::Monthly => add_one_month(due, tz),
        RepeatInterval::Custom => add_days(due, i64::from(custom_days?.get())),
    }
}

fn add_days(due: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    due.checked_add_signed(Duration::milliseconds(days.checked_mul(DAY_MS)?))
}

/// One calendar month later in `tz`, with day-of-month overflow rolling
/// forward.
pub fn add_one_month<Tz: TimeZone>(due: DateTime<Utc>, tz: &Tz) -> Option<DateTime<Utc>> {
    let local = due.with_timezone(tz).naive_local();
    let (year, month) = if local.month() == 12 {
        (local.year().checked_add(1)?, 1)
    } else {
        (local.year(), local.month() + 1)
    };

    let date = NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_days(Days::new(u64::from(local.day() - 1)))?;
    let moved = resolve_local(tz, date.and_time(local.time()));
    Some(moved.with_timezone(&Utc))
}

/// Build the successor of `parent`, or `None` if it has no due date or no
/// further occurrence.
///
/// The caller supplies the id and the creation instant.
pub fn next_occurrence<Tz: TimeZone>(
    parent: &TodoItem,
    id: String,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Option<TodoItem> {
    let due = parent.due_date?;
    let next_due = next_due(due, parent.repeat_interval, parent.custom_repeat_days, tz)?;

    Some(TodoItem {
        id,
        text: parent.text.clone(),
        completed: false,
        created_at: now,
        updated_at: now,
        due_date: Some(next_due),
        repeat_interval: parent.repeat_interval,
        custom_repeat_days: parent.custom_repeat_days,
        last_completed_date: None,
    })
}
