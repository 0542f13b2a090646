use anyhow::{anyhow, Result};
use chrono::{Days, NaiveDate};
use clap::Parser;

use crate::{
    calendar::{
        date_math::week_start,
        resolver::{tasks_between, tasks_on_date},
    },
    storage::{
        entities::TaskEntity,
        task_storage::{TaskStorage, TaskStore},
    },
};

use super::{
    dates::parse_user_date_or_today,
    output::{format_task_line, render_month, sort_by_time, Paint},
    CliContext,
};

#[derive(Debug, Parser)]
pub struct ViewCommand {
    #[arg(
        help = "Any day inside the shown period. Examples are \"today\", \"next friday\", \"15/03/2025\". Defaults to today"
    )]
    date: Option<String>,
}

#[derive(Debug, Parser)]
pub struct MonthCommand {
    #[command(flatten)]
    view: ViewCommand,
    #[arg(long, help = "Don't color the calendar")]
    no_color: bool,
}

const DAY_FORMAT: &str = "%a %d %b %Y";

/// Tasks of a single day ordered by time, one per line, under a heading with the date.
pub fn day_agenda(tasks: &[TaskEntity], date: NaiveDate) -> String {
    let mut active = tasks_on_date(tasks, date);
    agenda_section(date, &mut active)
}

/// Seven agenda sections starting from the Sunday of the week containing `date`.
pub fn week_agenda(tasks: &[TaskEntity], date: NaiveDate) -> Result<String> {
    let start = week_start(date)?;
    let end = start
        .checked_add_days(Days::new(6))
        .ok_or_else(|| anyhow!("Week of {date} ends after the latest supported date"))?;
    Ok(tasks_between(tasks, start, end)
        .into_iter()
        .map(|(day, mut active)| agenda_section(day, &mut active))
        .collect::<Vec<_>>()
        .join("\n"))
}

fn agenda_section(date: NaiveDate, active: &mut [&TaskEntity]) -> String {
    let mut section = format!("{}\n", date.format(DAY_FORMAT));
    if active.is_empty() {
        section.push_str("  nothing planned\n");
        return section;
    }
    sort_by_time(active);
    for task in active.iter() {
        section.push_str("  ");
        section.push_str(&format_task_line(task));
        section.push('\n');
    }
    section
}

pub async fn process_day_command<S: TaskStorage>(
    command: ViewCommand,
    store: &TaskStore<S>,
    context: &CliContext<'_>,
) -> Result<()> {
    let date = command.resolve(context)?;
    print!("{}", day_agenda(&store.list().await?, date));
    Ok(())
}

pub async fn process_week_command<S: TaskStorage>(
    command: ViewCommand,
    store: &TaskStore<S>,
    context: &CliContext<'_>,
) -> Result<()> {
    let date = command.resolve(context)?;
    print!("{}", week_agenda(&store.list().await?, date)?);
    Ok(())
}

pub async fn process_month_command<S: TaskStorage>(
    command: MonthCommand,
    store: &TaskStore<S>,
    context: &CliContext<'_>,
) -> Result<()> {
    let date = command.view.resolve(context)?;
    let today = context.clock.now().date_naive();
    let paint = if command.no_color {
        Paint::Plain
    } else {
        Paint::Colored
    };
    print!("{}", render_month(date, &store.list().await?, today, paint)?);
    Ok(())
}

impl ViewCommand {
    fn resolve(&self, context: &CliContext) -> Result<NaiveDate> {
        parse_user_date_or_today(
            self.date.as_deref(),
            context.clock,
            context.date_style,
            "date",
        )
    }
}
