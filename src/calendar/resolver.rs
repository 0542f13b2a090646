use std::collections::HashMap;

use anyhow::Result;
use chrono::{Datelike, NaiveDate, Weekday};
use tracing::{instrument, warn};

use super::recurrence::{occurs_on, Recurrence};

/// Anything the calendar can place on dates. Implemented by stored task records so the resolver
/// never has to know how tasks are persisted.
pub trait Schedulable {
    /// Name used in logs when the record can't be placed.
    fn label(&self) -> String;

    fn anchor_date(&self) -> Result<NaiveDate>;

    /// `None` means the task happens once, on its anchor date.
    fn recurrence(&self) -> Result<Option<Recurrence>>;
}

/// Parsed scheduling data of a single record, or `None` if the record is malformed.
fn schedule_of<T: Schedulable>(task: &T) -> Option<(NaiveDate, Option<Recurrence>)> {
    let parsed = task
        .anchor_date()
        .and_then(|anchor| Ok((anchor, task.recurrence()?)));
    match parsed {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Skipping task {} with invalid schedule: {e}", task.label());
            None
        }
    }
}

/// Returns tasks active on `date`, in the same relative order as `tasks`.
///
/// Tasks whose dates or recurrence can't be read are left out instead of failing the whole query.
#[instrument(skip(tasks), fields(tasks = tasks.len()))]
pub fn tasks_on_date<T: Schedulable>(tasks: &[T], date: NaiveDate) -> Vec<&T> {
    tasks
        .iter()
        .filter(|task| {
            schedule_of(*task)
                .is_some_and(|(anchor, recurrence)| occurs_on(anchor, recurrence.as_ref(), date))
        })
        .collect()
}

/// Groups tasks by every date from `start` to `end`, both inclusive. Each record is parsed once.
#[instrument(skip(tasks), fields(tasks = tasks.len()))]
pub fn tasks_between<T: Schedulable>(
    tasks: &[T],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<(NaiveDate, Vec<&T>)> {
    let schedules = tasks
        .iter()
        .filter_map(|task| schedule_of(task).map(|schedule| (task, schedule)))
        .collect::<Vec<_>>();

    start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|day| {
            let active = schedules
                .iter()
                .filter(|(_, (anchor, recurrence))| occurs_on(*anchor, recurrence.as_ref(), day))
                .map(|(task, _)| *task)
                .collect();
            (day, active)
        })
        .collect()
}

pub fn is_weekend(date: &impl Datelike) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Memoizes occurrence decisions. Results are identical to [occurs_on], the cache only saves
/// work when the same grid is resolved repeatedly.
#[derive(Debug, Default)]
pub struct OccurrenceCache {
    entries: HashMap<(NaiveDate, Option<Recurrence>, NaiveDate), bool>,
}

impl OccurrenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn occurs_on(
        &mut self,
        anchor: NaiveDate,
        recurrence: Option<&Recurrence>,
        target: NaiveDate,
    ) -> bool {
        *self
            .entries
            .entry((anchor, recurrence.copied(), target))
            .or_insert_with(|| occurs_on(anchor, recurrence, target))
    }

    pub fn tasks_on_date<'a, T: Schedulable>(
        &mut self,
        tasks: &'a [T],
        date: NaiveDate,
    ) -> Vec<&'a T> {
        tasks
            .iter()
            .filter(|task| {
                schedule_of(*task).is_some_and(|(anchor, recurrence)| {
                    self.occurs_on(anchor, recurrence.as_ref(), date)
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Result};
    use chrono::{Duration, NaiveDate};

    use crate::{
        calendar::recurrence::{Recurrence, WeekdaySelection},
        utils::logging::TEST_LOGGING,
    };

    use super::{is_weekend, tasks_between, tasks_on_date, OccurrenceCache, Schedulable};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[derive(Debug, Clone)]
    struct TestTask {
        name: &'static str,
        anchor: Option<NaiveDate>,
        recurrence: Result<Option<Recurrence>, &'static str>,
    }

    impl TestTask {
        fn once(name: &'static str, anchor: NaiveDate) -> Self {
            Self {
                name,
                anchor: Some(anchor),
                recurrence: Ok(None),
            }
        }

        fn repeating(name: &'static str, anchor: NaiveDate, recurrence: Recurrence) -> Self {
            Self {
                name,
                anchor: Some(anchor),
                recurrence: Ok(Some(recurrence)),
            }
        }
    }

    impl Schedulable for TestTask {
        fn label(&self) -> String {
            self.name.to_string()
        }

        fn anchor_date(&self) -> Result<NaiveDate> {
            self.anchor.ok_or_else(|| anyhow!("no anchor"))
        }

        fn recurrence(&self) -> Result<Option<Recurrence>> {
            self.recurrence.map_err(|e| anyhow!(e))
        }
    }

    fn names(tasks: Vec<&TestTask>) -> Vec<&'static str> {
        tasks.into_iter().map(|t| t.name).collect()
    }

    #[test]
    fn test_tasks_on_date_keeps_order() {
        let day = date(2024, 1, 10);
        let tasks = vec![
            TestTask::repeating("c", date(2024, 1, 1), Recurrence::daily(1)),
            TestTask::once("a", day),
            TestTask::once("other day", date(2024, 1, 11)),
            TestTask::repeating(
                "b",
                date(2024, 1, 3),
                Recurrence::weekly(1, WeekdaySelection::AnchorWeekday),
            ),
        ];
        assert_eq!(names(tasks_on_date(&tasks, day)), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_malformed_tasks_are_excluded() {
        *TEST_LOGGING;
        let day = date(2024, 1, 10);
        let tasks = vec![
            TestTask {
                name: "no anchor",
                anchor: None,
                recurrence: Ok(None),
            },
            TestTask::once("valid", day),
            TestTask {
                name: "bad recurrence",
                anchor: Some(day),
                recurrence: Err("bad end date"),
            },
        ];
        assert_eq!(names(tasks_on_date(&tasks, day)), vec!["valid"]);
        let range = tasks_between(&tasks, day, day);
        assert_eq!(names(range[0].1.clone()), vec!["valid"]);
    }

    #[test]
    fn test_thirty_day_window_counts() {
        let start = date(2024, 1, 1);
        let tasks = vec![
            TestTask::repeating("every day", start, Recurrence::daily(1)),
            TestTask::once("one", start + Duration::days(3)),
            TestTask::repeating("every 4 days", start, Recurrence::daily(4)),
            TestTask::once("two", start + Duration::days(10)),
            TestTask::once("three", start + Duration::days(17)),
            TestTask::once("four", start + Duration::days(29)),
        ];

        let mut appearances = vec![0usize; tasks.len()];
        for day in start.iter_days().take(30) {
            for task in tasks_on_date(&tasks, day) {
                let index = tasks.iter().position(|t| t.name == task.name).unwrap();
                appearances[index] += 1;
            }
        }
        assert_eq!(appearances, vec![30, 1, 30_usize.div_ceil(4), 1, 1, 1]);
    }

    #[test]
    fn test_tasks_between_matches_single_day_queries() {
        let start = date(2024, 2, 1);
        let end = date(2024, 3, 15);
        let tasks = vec![
            TestTask::repeating("daily", start, Recurrence::daily(2).until(date(2024, 2, 20))),
            TestTask::repeating("monthly", date(2024, 1, 31), Recurrence::monthly(1)),
            TestTask::once("once", date(2024, 2, 29)),
        ];
        let grouped = tasks_between(&tasks, start, end);
        assert_eq!(grouped.len(), 44);
        for (day, active) in grouped {
            assert_eq!(names(active), names(tasks_on_date(&tasks, day)), "{day}");
        }
    }

    #[test]
    fn test_tasks_between_empty_when_reversed() {
        let tasks = vec![TestTask::once("once", date(2024, 2, 29))];
        assert!(tasks_between(&tasks, date(2024, 3, 1), date(2024, 2, 1)).is_empty());
    }

    #[test]
    fn test_is_weekend_full_week() {
        // 2024-01-07 is a Sunday
        let weekend = date(2024, 1, 7)
            .iter_days()
            .take(7)
            .map(|d| is_weekend(&d))
            .collect::<Vec<_>>();
        assert_eq!(weekend, vec![true, false, false, false, false, false, true]);
    }

    #[test]
    fn test_cache_agrees_with_direct_resolution() {
        let start = date(2024, 1, 1);
        let tasks = vec![
            TestTask::repeating("daily", start, Recurrence::daily(3)),
            TestTask::repeating(
                "weekly",
                start,
                Recurrence::weekly(2, WeekdaySelection::AnchorWeekday),
            ),
            TestTask::once("once", date(2024, 1, 15)),
        ];
        let mut cache = OccurrenceCache::new();
        for _ in 0..2 {
            for day in start.iter_days().take(60) {
                assert_eq!(
                    names(cache.tasks_on_date(&tasks, day)),
                    names(tasks_on_date(&tasks, day)),
                    "{day}"
                );
            }
        }
        assert_eq!(cache.len(), 3 * 60);
    }
}
