use std::collections::HashMap;

use chrono::NaiveDate;

use crate::{
    calendar::resolver::tasks_between,
    storage::entities::TaskEntity,
    utils::percentage::{count_percentage, Percentage},
};

pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, PartialEq)]
pub struct CategoryUsage {
    pub category: String,
    /// Occurrences of tasks in this category inside the analyzed range.
    pub scheduled: usize,
    /// Occurrences that belong to completed tasks.
    pub completed: usize,
}

impl CategoryUsage {
    fn new(category: String) -> Self {
        Self {
            category,
            scheduled: 0,
            completed: 0,
        }
    }

    pub fn completion(&self) -> Percentage {
        count_percentage(self.completed, self.scheduled)
    }
}

#[derive(Debug, PartialEq, Default)]
pub struct DayLoad {
    pub tasks: usize,
    /// Sum of planned durations. Tasks without a duration add nothing.
    pub planned_minutes: u32,
}

fn category_of(task: &TaskEntity) -> String {
    let category = task.category.trim();
    if category.is_empty() {
        UNCATEGORIZED.to_string()
    } else {
        category.to_string()
    }
}

/// Returns vector of categories with their occurrence statistics + total number of occurrences
/// between `start` and `end` inclusive. Categories below `min_share` of all occurrences are left
/// out of the vector but still counted in the total.
pub fn analyze_categories(
    tasks: &[TaskEntity],
    start: NaiveDate,
    end: NaiveDate,
    min_share: Percentage,
) -> (Vec<CategoryUsage>, usize) {
    let mut map = HashMap::<String, CategoryUsage>::new();
    let mut occurrence_sum = 0;

    for (_, active) in tasks_between(tasks, start, end) {
        for task in active {
            occurrence_sum += 1;
            let category = category_of(task);
            let usage = map
                .entry(category.clone())
                .or_insert_with(|| CategoryUsage::new(category));
            usage.scheduled += 1;
            if task.completed {
                usage.completed += 1;
            }
        }
    }

    let mut usages = map
        .into_values()
        .filter(|v| count_percentage(v.scheduled, occurrence_sum) >= min_share)
        .collect::<Vec<_>>();
    usages.sort_by(|a, b| {
        b.scheduled
            .cmp(&a.scheduled)
            .then_with(|| a.category.cmp(&b.category))
    });
    (usages, occurrence_sum)
}

/// Returns how busy every day between `start` and `end` inclusive is.
pub fn daily_load(
    tasks: &[TaskEntity],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<(NaiveDate, DayLoad)> {
    tasks_between(tasks, start, end)
        .into_iter()
        .map(|(day, active)| {
            let load = DayLoad {
                tasks: active.len(),
                planned_minutes: active.iter().filter_map(|v| v.duration).sum(),
            };
            (day, load)
        })
        .collect()
}
