use anyhow::{anyhow, Result};
use chrono::{Days, NaiveDate};
use clap::{CommandFactory, Parser};

use crate::{
    storage::{
        entities::TaskEntity,
        task_storage::{TaskStorage, TaskStore},
    },
    utils::percentage::{count_percentage, Percentage},
};

use super::{
    dates::parse_user_date,
    output::analysis::{analyze_categories, daily_load},
    Args, CliContext,
};

const DEFAULT_RANGE_DAYS: u64 = 7;

#[derive(Debug, Parser)]
pub struct StatsCommand {
    #[arg(
        long = "start",
        short,
        help = "First day of the range. Examples are \"yesterday\", \"last monday\", \"15/03/2025\". Defaults to 6 days before the end"
    )]
    start_date: Option<String>,
    #[arg(
        long = "end",
        short,
        help = "Last day of the range, inclusive. Defaults to today"
    )]
    end_date: Option<String>,
    #[arg(short = 'p', long = "percentage", help = "Hide categories below the specified share of all occurrences", default_value_t = Percentage::zero())]
    min_percentage: Percentage,
    #[arg(long, help = "Also print how many tasks and planned minutes every day has")]
    daily: bool,
}

/// Provides sensible defaults for the range of `stats` command.
fn parse_range(command: &StatsCommand, context: &CliContext) -> Result<(NaiveDate, NaiveDate)> {
    let end = match command.end_date.as_deref() {
        Some(v) => parse_user_date(v, context.clock, context.date_style, "--end")?,
        None => context.clock.now().date_naive(),
    };
    let start = match command.start_date.as_deref() {
        Some(v) => parse_user_date(v, context.clock, context.date_style, "--start")?,
        None => default_start(end)?,
    };
    if start > end {
        return Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Start of the range {start} is after its end {end}"),
            )
            .into());
    }
    Ok((start, end))
}

fn default_start(end: NaiveDate) -> Result<NaiveDate> {
    end.checked_sub_days(Days::new(DEFAULT_RANGE_DAYS - 1))
        .ok_or_else(|| anyhow!("Range ending on {end} starts before the earliest supported date"))
}

/// Category breakdown followed by an optional per day load table, tab separated.
pub fn format_stats(
    tasks: &[TaskEntity],
    start: NaiveDate,
    end: NaiveDate,
    min_percentage: Percentage,
    daily: bool,
) -> String {
    let (usages, total) = analyze_categories(tasks, start, end, min_percentage);
    let mut result = format!("{start} - {end}\t{total} occurrences\n");
    for usage in usages {
        result.push_str(&format!(
            "{}\t{}\t{}\tdone {}\n",
            count_percentage(usage.scheduled, total),
            usage.scheduled,
            usage.category,
            usage.completion(),
        ));
    }
    if daily {
        result.push('\n');
        for (day, load) in daily_load(tasks, start, end) {
            result.push_str(&format!(
                "{}\t{}\t{}\n",
                day.format("%a %d %b"),
                load.tasks,
                format_minutes(load.planned_minutes)
            ));
        }
    }
    result
}

fn format_minutes(minutes: u32) -> String {
    if minutes >= 60 {
        format!("{}h{}m", minutes / 60, minutes % 60)
    } else {
        format!("{minutes}m")
    }
}

pub async fn process_stats_command<S: TaskStorage>(
    command: StatsCommand,
    store: &TaskStore<S>,
    context: &CliContext<'_>,
) -> Result<()> {
    let (start, end) = parse_range(&command, context)?;
    let tasks = store.list().await?;
    print!(
        "{}",
        format_stats(&tasks, start, end, command.min_percentage, command.daily)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Local, NaiveDate, TimeZone};
    use clap::Parser;
    use uuid::Uuid;

    use crate::{
        cli::{dates::DateStyle, CliContext},
        storage::entities::{Priority, RecurrenceKind, RecurrencePattern, TaskEntity},
        utils::{clock::MockClock, percentage::Percentage},
    };

    use super::{default_start, format_minutes, format_stats, parse_range, StatsCommand};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn clock() -> MockClock {
        let mut clock = MockClock::new();
        clock
            .expect_now()
            .returning(|| Local.with_ymd_and_hms(2024, 3, 13, 8, 0, 0).unwrap());
        clock
    }

    #[test]
    fn test_default_range_is_last_week() {
        let clock = clock();
        let context = CliContext {
            clock: &clock,
            date_style: DateStyle::Uk,
        };
        let command = StatsCommand::parse_from(["stats"]);
        assert_eq!(
            parse_range(&command, &context).unwrap(),
            (date(2024, 3, 7), date(2024, 3, 13))
        );

        let command = StatsCommand::parse_from(["stats", "--start", "01/03/2024", "--end", "2024-03-02"]);
        assert_eq!(
            parse_range(&command, &context).unwrap(),
            (date(2024, 3, 1), date(2024, 3, 2))
        );
    }

    #[test]
    fn test_reversed_range() {
        let clock = clock();
        let context = CliContext {
            clock: &clock,
            date_style: DateStyle::Uk,
        };
        let command = StatsCommand::parse_from(["stats", "--start", "2024-03-10", "--end", "2024-03-01"]);
        assert!(parse_range(&command, &context).is_err());
    }

    #[test]
    fn test_default_start_before_supported_range() {
        assert!(default_start(NaiveDate::MIN).is_err());
        assert_eq!(default_start(date(2024, 3, 13)).unwrap(), date(2024, 3, 7));
    }

    #[test]
    fn test_format_stats() {
        let mut daily = TaskEntity {
            id: Uuid::nil(),
            title: "Read".into(),
            date: "2024-03-01".into(),
            time: String::new(),
            recurrence: Some(RecurrencePattern::new(RecurrenceKind::Daily, 1)),
            priority: Priority::High,
            category: "study".into(),
            completed: false,
            description: String::new(),
            duration: Some(30),
        };
        let mut once = daily.clone();
        once.recurrence = None;
        once.date = "2024-03-02".into();
        once.category = "chores".into();
        once.completed = true;
        once.duration = Some(45);
        daily.title = "Read more".into();

        let stats = format_stats(
            &[daily, once],
            date(2024, 3, 1),
            date(2024, 3, 3),
            Percentage::zero(),
            true,
        );
        assert_eq!(
            stats,
            "2024-03-01 - 2024-03-03\t4 occurrences\n\
             75%\t3\tstudy\tdone 0%\n\
             25%\t1\tchores\tdone 100%\n\
             \n\
             Fri 01 Mar\t1\t30m\n\
             Sat 02 Mar\t2\t1h15m\n\
             Sun 03 Mar\t1\t30m\n"
        );
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(0), "0m");
        assert_eq!(format_minutes(59), "59m");
        assert_eq!(format_minutes(125), "2h5m");
    }
}
