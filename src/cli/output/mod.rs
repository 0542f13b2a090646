pub mod analysis;

use ansi_term::{Colour, Style};
use anyhow::Result;
use chrono::{Datelike, NaiveDate};

use crate::{
    calendar::{
        date_math::generate_month_grid,
        resolver::{is_weekend, OccurrenceCache},
    },
    storage::entities::TaskEntity,
};

const WEEKDAY_HEADER: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];

/// Whether printed text gets terminal colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    Colored,
    Plain,
}

impl Paint {
    fn apply(self, style: Style, text: String) -> String {
        match self {
            Paint::Colored if style != Style::new() => style.paint(text).to_string(),
            Paint::Colored | Paint::Plain => text,
        }
    }
}

/// One task as a tab separated line: time, status, title, category, priority and id.
pub fn format_task_line(task: &TaskEntity) -> String {
    let time = if task.time.is_empty() {
        "--:--"
    } else {
        &task.time
    };
    let status = if task.completed { "[x]" } else { "[ ]" };
    let repeat = if task.is_recurring() { " (repeats)" } else { "" };
    let mut line = format!("{time}\t{status} {}{repeat}", task.title);
    if !task.category.is_empty() {
        line.push_str(&format!("\t#{}", task.category));
    }
    line.push_str(&format!("\t{}\t{}", task.priority, task.id));
    line
}

/// Orders the tasks of one day by time. Tasks without a time come first, ties keep the
/// resolver's order.
pub fn sort_by_time(tasks: &mut [&TaskEntity]) {
    tasks.sort_by(|a, b| a.time.cmp(&b.time));
}

/// Draws the month containing `date` as a week aligned grid. Every cell shows the day of month
/// and how many tasks occur on it.
pub fn render_month(
    date: NaiveDate,
    tasks: &[TaskEntity],
    today: NaiveDate,
    paint: Paint,
) -> Result<String> {
    let mut cache = OccurrenceCache::new();
    let mut result = format!("{}\n", date.format("%B %Y"));
    let header = WEEKDAY_HEADER
        .iter()
        .map(|v| format!("{v:<4}"))
        .collect::<Vec<_>>();
    result.push_str(header.join(" ").trim_end());
    result.push('\n');

    for week in generate_month_grid(date)?.chunks(7) {
        let row = week
            .iter()
            .map(|day| {
                let count = cache.tasks_on_date(tasks, *day).len();
                let cell = format!("{:>2}{:<2}", day.day(), count_marker(count));
                paint.apply(cell_style(*day, date, today), cell)
            })
            .collect::<Vec<_>>();
        result.push_str(row.join(" ").trim_end());
        result.push('\n');
    }
    Ok(result)
}

fn count_marker(count: usize) -> String {
    match count {
        0 => String::new(),
        1..=9 => format!("*{count}"),
        _ => "*+".to_string(),
    }
}

fn cell_style(day: NaiveDate, month: NaiveDate, today: NaiveDate) -> Style {
    let mut style = Style::new();
    if day.month() != month.month() || day.year() != month.year() {
        style = style.dimmed();
    } else if is_weekend(&day) {
        style = style.fg(Colour::Red);
    }
    if day == today {
        style = style.bold().underline();
    }
    style
}
