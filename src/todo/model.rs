//! Task items and the value types that describe views over them.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::clock::DayWindow;
use crate::error::{Error, Result};

/// Recurrence rule of a task
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RepeatInterval {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Custom,
}

impl RepeatInterval {
    pub const ALL: [RepeatInterval; 5] = [
        RepeatInterval::None,
        RepeatInterval::Daily,
        RepeatInterval::Weekly,
        RepeatInterval::Monthly,
        RepeatInterval::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RepeatInterval::None => "none",
            RepeatInterval::Daily => "daily",
            RepeatInterval::Weekly => "weekly",
            RepeatInterval::Monthly => "monthly",
            RepeatInterval::Custom => "custom",
        }
    }

    pub fn repeats(self) -> bool {
        self != RepeatInterval::None
    }
}

impl fmt::Display for RepeatInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepeatInterval {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|interval| interval.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "unknown repeat interval '{value}' (expected none|daily|weekly|monthly|custom)"
                ))
            })
    }
}

/// Check the custom-days invariant and normalise the pair.
///
/// `Custom` needs a positive day count; every other interval drops it.
pub fn normalize_repeat(
    interval: RepeatInterval,
    custom_days: Option<u32>,
) -> Result<Option<NonZeroU32>> {
    match interval {
        RepeatInterval::Custom => custom_days
            .and_then(NonZeroU32::new)
            .map(Some)
            .ok_or_else(|| {
                Error::InvalidArgument(
                    "custom repeat requires a positive number of days".to_string(),
                )
            }),
        _ => Ok(None),
    }
}

/// One occurrence of a (possibly repeating) task.
///
/// Serialized with the dashboard's camelCase field names and integer
/// millisecond timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: String,
    pub text: String,
    pub completed: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub repeat_interval: RepeatInterval,
    #[serde(
        default,
        deserialize_with = "lenient_repeat_days",
        skip_serializing_if = "Option::is_none"
    )]
    pub custom_repeat_days: Option<NonZeroU32>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_completed_date: Option<DateTime<Utc>>,
}

/// Stored day counts that are not positive integers read as absent
fn lenient_repeat_days<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<NonZeroU32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(serde_json::Value::as_u64)
        .and_then(|days| u32::try_from(days).ok())
        .and_then(NonZeroU32::new))
}

impl TodoItem {
    pub fn is_repeating(&self) -> bool {
        self.repeat_interval.repeats()
    }

    /// Badge category of the due date, if any
    pub fn due_status(&self, window: &DayWindow) -> Option<DueStatus> {
        self.due_date.map(|due| DueStatus::classify(due, window))
    }

    /// Human label of the recurrence rule, e.g. `every 3 days`
    pub fn repeat_label(&self) -> Option<String> {
        match self.repeat_interval {
            RepeatInterval::None => None,
            RepeatInterval::Custom => Some(match self.custom_repeat_days {
                Some(days) if days.get() == 1 => "every day".to_string(),
                Some(days) => format!("every {days} days"),
                None => "custom".to_string(),
            }),
            other => Some(other.to_string()),
        }
    }
}

/// The three filter tabs of the to-do panel
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TodoFilter {
    #[default]
    Today,
    Upcoming,
    Completed,
}

impl TodoFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            TodoFilter::Today => "today",
            TodoFilter::Upcoming => "upcoming",
            TodoFilter::Completed => "completed",
        }
    }
}

impl fmt::Display for TodoFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TodoFilter {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(TodoFilter::Today),
            "upcoming" => Ok(TodoFilter::Upcoming),
            "completed" | "done" => Ok(TodoFilter::Completed),
            _ => Err(Error::InvalidArgument(format!(
                "unknown filter '{value}' (expected today|upcoming|completed)"
            ))),
        }
    }
}

/// Where a due date falls relative to today
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    Overdue,
    Today,
    Upcoming,
}

impl DueStatus {
    pub fn classify(due: DateTime<Utc>, window: &DayWindow) -> Self {
        if due < window.start {
            DueStatus::Overdue
        } else if due < window.end {
            DueStatus::Today
        } else {
            DueStatus::Upcoming
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DueStatus::Overdue => "overdue",
            DueStatus::Today => "today",
            DueStatus::Upcoming => "upcoming",
        }
    }
}

/// Counters shown in the to-do panel header
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct TodoStats {
    pub total: usize,
    pub completed: usize,
    pub today: usize,
    pub upcoming: usize,
    pub overdue: usize,
}

/// Field changes for [`crate::todo::TodoManager::edit_task`]; `None` leaves a
/// field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoEdit {
    pub text: Option<String>,
    /// `Some(None)` clears the due date
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub repeat: Option<(RepeatInterval, Option<u32>)>,
}

impl TodoEdit {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.due_date.is_none() && self.repeat.is_none()
    }
}

/// Result of toggling a task
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub task: TodoItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<TodoItem>,
}

/// Result of the startup reconciliation pass
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ReconcileReport {
    pub generated: Vec<TodoItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_dashboard_record() {
        let value = json!({
            "id": "todo-1700000000000-abc123xyz",
            "text": "Water plants",
            "completed": true,
            "createdAt": 1_700_000_000_000i64,
            "updatedAt": 1_700_000_500_000i64,
            "dueDate": 1_700_086_400_000i64,
            "repeatInterval": "custom",
            "customRepeatDays": 3,
            "lastCompletedDate": 1_700_000_500_000i64
        });

        let item: TodoItem = serde_json::from_value(value).unwrap();
        assert_eq!(item.repeat_interval, RepeatInterval::Custom);
        assert_eq!(item.custom_repeat_days.map(NonZeroU32::get), Some(3));
        assert_eq!(item.due_date.unwrap().timestamp_millis(), 1_700_086_400_000);
        assert_eq!(item.repeat_label().as_deref(), Some("every 3 days"));
    }

    #[test]
    fn missing_optional_fields_default() {
        let value = json!({
            "id": "todo-1",
            "text": "Buy milk",
            "completed": false,
            "createdAt": 1,
            "updatedAt": 1
        });

        let item: TodoItem = serde_json::from_value(value).unwrap();
        assert_eq!(item.repeat_interval, RepeatInterval::None);
        assert!(item.due_date.is_none());
        assert!(item.repeat_label().is_none());

        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["repeatInterval"], "none");
        assert!(back.get("dueDate").is_none());
        assert!(back.get("customRepeatDays").is_none());
    }

    #[test]
    fn unusable_custom_days_read_as_absent() {
        for days in [json!(0), json!(-2), json!("3"), json!(2.5), json!(null)] {
            let value = json!({
                "id": "todo-1",
                "text": "Stretch",
                "completed": false,
                "createdAt": 1,
                "updatedAt": 1,
                "repeatInterval": "custom",
                "customRepeatDays": days
            });

            let item: TodoItem = serde_json::from_value(value).unwrap();
            assert!(item.custom_repeat_days.is_none(), "{days}");
            assert_eq!(item.repeat_label().as_deref(), Some("custom"));
        }
    }

    #[test]
    fn custom_repeat_requires_positive_days() {
        assert!(normalize_repeat(RepeatInterval::Custom, None).is_err());
        assert!(normalize_repeat(RepeatInterval::Custom, Some(0)).is_err());
        assert_eq!(
            normalize_repeat(RepeatInterval::Custom, Some(10)).unwrap(),
            NonZeroU32::new(10)
        );
        assert_eq!(normalize_repeat(RepeatInterval::Weekly, Some(10)).unwrap(), None);
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("Monthly".parse::<RepeatInterval>().unwrap(), RepeatInterval::Monthly);
        assert_eq!(" upcoming ".parse::<TodoFilter>().unwrap(), TodoFilter::Upcoming);
        assert!("fortnightly".parse::<RepeatInterval>().is_err());
        assert!("later".parse::<TodoFilter>().is_err());
    }
}
