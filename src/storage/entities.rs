use std::fmt::Display;

use anyhow::Result;
use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    calendar::{
        recurrence::{Frequency, Recurrence, WeekdaySelection},
        resolver::Schedulable,
    },
    utils::time::record_to_date,
};

/// The struct used for storing a task on disk. Dates are kept as the strings clients wrote, so a
/// single malformed record can be loaded and reported without losing the rest.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TaskEntity {
    pub id: Uuid,
    pub title: String,
    /// Anchor date, `YYYY-MM-DD`.
    pub date: String,
    /// Local clock time, `HH:MM`. Empty for tasks without a time.
    #[serde(default)]
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrencePattern>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub description: String,
    /// Planned duration in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

impl TaskEntity {
    pub fn is_recurring(&self) -> bool {
        self.recurrence
            .as_ref()
            .is_some_and(|v| v.kind != RecurrenceKind::None)
    }
}

impl Schedulable for TaskEntity {
    fn label(&self) -> String {
        format!("{} ({})", self.title, self.id)
    }

    fn anchor_date(&self) -> Result<NaiveDate> {
        record_to_date(&self.date)
    }

    fn recurrence(&self) -> Result<Option<Recurrence>> {
        match &self.recurrence {
            Some(pattern) => pattern.to_recurrence(),
            None => Ok(None),
        }
    }
}

/// Recurrence exactly as clients store it.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RecurrencePattern {
    #[serde(rename = "type")]
    pub kind: RecurrenceKind,
    #[serde(default = "default_interval")]
    pub interval: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// Payload of `custom` recurrences. Kept so it survives a save, never interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<serde_json::Value>,
}

fn default_interval() -> i64 {
    1
}

impl RecurrencePattern {
    pub fn new(kind: RecurrenceKind, interval: i64) -> Self {
        Self {
            kind,
            interval,
            days_of_week: None,
            end_date: None,
            custom: None,
        }
    }

    /// Converts the stored pattern into a rule. `none` yields no rule at all. Intervals below 1
    /// become 1, an unreadable end date is an error.
    pub fn to_recurrence(&self) -> Result<Option<Recurrence>> {
        let frequency = match self.kind {
            RecurrenceKind::None => return Ok(None),
            RecurrenceKind::Daily => Frequency::Daily,
            RecurrenceKind::Weekly => Frequency::Weekly(WeekdaySelection::from_indices(
                self.days_of_week.as_deref(),
            )),
            RecurrenceKind::Monthly => Frequency::Monthly,
            RecurrenceKind::Custom => Frequency::Custom,
            RecurrenceKind::Unknown => Frequency::Unknown,
        };
        let end_date = self.end_date.as_deref().map(record_to_date).transpose()?;
        Ok(Some(Recurrence::new(frequency, self.interval, end_date)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceKind {
    None,
    Daily,
    Weekly,
    Monthly,
    Custom,
    /// Any type written by a newer or broken client.
    #[serde(other)]
    Unknown,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}
