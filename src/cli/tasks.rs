use anyhow::{bail, Result};
use chrono::NaiveTime;
use clap::{Parser, ValueEnum};
use tracing::debug;
use uuid::Uuid;

use crate::{
    storage::{
        entities::{Priority, RecurrenceKind, RecurrencePattern, TaskEntity},
        task_storage::{NewTask, TaskStorage, TaskStore, TaskUpdate},
    },
    utils::time::{date_to_record, parse_clock_time},
};

use super::{dates::parse_user_date, CliContext};

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum RepeatOption {
    Daily,
    Weekly,
    Monthly,
    Custom,
}

impl From<RepeatOption> for RecurrenceKind {
    fn from(value: RepeatOption) -> Self {
        match value {
            RepeatOption::Daily => Self::Daily,
            RepeatOption::Weekly => Self::Weekly,
            RepeatOption::Monthly => Self::Monthly,
            RepeatOption::Custom => Self::Custom,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum WeekdayOption {
    Sun,
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl WeekdayOption {
    fn index(self) -> i64 {
        self as i64
    }
}

#[derive(Debug, Clone, clap::Args, Default)]
pub struct RecurrenceArgs {
    #[arg(long, help = "Make the task repeat")]
    repeat: Option<RepeatOption>,
    #[arg(
        long,
        help = "Repeat every N days, weeks or months depending on --repeat. Defaults to 1"
    )]
    every: Option<i64>,
    #[arg(
        long,
        value_delimiter = ',',
        help = "Weekdays of a weekly task, for example --on mon,wed,fri. Defaults to the weekday of the task date"
    )]
    on: Vec<WeekdayOption>,
    #[arg(
        long,
        help = "Last day the task repeats on, inclusive. Accepts the same formats as --date"
    )]
    until: Option<String>,
}

impl RecurrenceArgs {
    fn is_empty(&self) -> bool {
        self.repeat.is_none() && self.every.is_none() && self.on.is_empty() && self.until.is_none()
    }

    /// Applies the arguments on top of `base`. Without a base `--repeat` is required.
    fn into_pattern(
        self,
        base: Option<RecurrencePattern>,
        context: &CliContext,
    ) -> Result<RecurrencePattern> {
        let mut pattern = match (self.repeat, base) {
            (Some(repeat), _) => RecurrencePattern::new(repeat.into(), 1),
            (None, Some(base)) => base,
            (None, None) => bail!("Task doesn't repeat yet, --repeat is required"),
        };
        if let Some(every) = self.every {
            pattern.interval = every;
        }
        if !self.on.is_empty() {
            pattern.days_of_week = Some(self.on.iter().map(|v| v.index()).collect());
        }
        if let Some(until) = self.until {
            let until = parse_user_date(&until, context.clock, context.date_style, "--until")?;
            pattern.end_date = Some(date_to_record(until));
        }
        Ok(pattern)
    }
}

#[derive(Debug, Parser)]
pub struct AddCommand {
    title: String,
    #[arg(
        long,
        short,
        help = "Day of the task or of its first repetition. Examples are \"today\", \"next friday\", \"15/03/2025\", \"2025-03-15\". Defaults to today"
    )]
    date: Option<String>,
    #[arg(long, short, help = "Time of day, HH:MM")]
    time: Option<String>,
    #[command(flatten)]
    recurrence: RecurrenceArgs,
    #[arg(long, short, default_value_t = Priority::Medium)]
    priority: Priority,
    #[arg(long, short, default_value = "")]
    category: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, help = "Planned duration in minutes")]
    duration: Option<u32>,
}

#[derive(Debug, Parser)]
pub struct EditCommand {
    id: Uuid,
    #[arg(long)]
    title: Option<String>,
    #[arg(long, short, help = "New day of the task. Moves the whole series for repeating tasks")]
    date: Option<String>,
    #[arg(long, short, help = "Time of day, HH:MM. Empty string removes the time")]
    time: Option<String>,
    #[command(flatten)]
    recurrence: RecurrenceArgs,
    #[arg(long, conflicts_with_all = ["repeat", "every", "on", "until"], help = "Stop repeating the task")]
    no_repeat: bool,
    #[arg(long, short)]
    priority: Option<Priority>,
    #[arg(long, short)]
    category: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long, help = "Planned duration in minutes")]
    duration: Option<u32>,
}

fn parse_time_arg(value: Option<&str>) -> Result<Option<NaiveTime>> {
    match value {
        Some(value) => parse_clock_time(value),
        None => Ok(None),
    }
}

pub async fn process_add_command<S: TaskStorage>(
    command: AddCommand,
    store: &TaskStore<S>,
    context: &CliContext<'_>,
) -> Result<TaskEntity> {
    let date = match command.date.as_deref() {
        Some(date) => parse_user_date(date, context.clock, context.date_style, "--date")?,
        None => context.clock.now().date_naive(),
    };
    let recurrence = if command.recurrence.is_empty() {
        None
    } else {
        Some(command.recurrence.into_pattern(None, context)?)
    };
    let new_task = NewTask {
        title: command.title,
        date,
        time: parse_time_arg(command.time.as_deref())?,
        recurrence,
        priority: command.priority,
        category: command.category,
        description: command.description,
        duration: command.duration,
    };
    debug!("Creating task {new_task:?}");
    store.create(new_task).await
}

pub async fn process_edit_command<S: TaskStorage>(
    command: EditCommand,
    store: &TaskStore<S>,
    context: &CliContext<'_>,
) -> Result<TaskEntity> {
    let recurrence = if command.no_repeat {
        Some(None)
    } else if command.recurrence.is_empty() {
        None
    } else {
        let current = store.get(command.id).await?.recurrence;
        Some(Some(command.recurrence.into_pattern(current, context)?))
    };
    let date = command
        .date
        .as_deref()
        .map(|v| parse_user_date(v, context.clock, context.date_style, "--date"))
        .transpose()?;
    let time = command
        .time
        .as_deref()
        .map(|v| parse_time_arg(Some(v)))
        .transpose()?;

    let update = TaskUpdate {
        title: command.title,
        date,
        time,
        recurrence,
        priority: command.priority,
        category: command.category,
        description: command.description,
        duration: command.duration.map(Some),
    };
    debug!("Updating task {} with {update:?}", command.id);
    store.update(command.id, update).await
}
