use chrono::{Datelike, NaiveDate};
use tracing::trace;

use super::date_math::{days_between, months_between, weekday_index, weeks_between};

/// Set of weekdays stored as a bit mask, bit 0 is Sunday and bit 6 is Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WeekdayMask(u8);

impl WeekdayMask {
    /// Builds a mask from weekday indices. Indices outside `0..=6` are ignored.
    pub fn from_indices(indices: impl IntoIterator<Item = i64>) -> Self {
        let bits = indices
            .into_iter()
            .filter(|v| (0..7).contains(v))
            .fold(0u8, |bits, v| bits | (1 << v));
        Self(bits)
    }

    pub fn contains(&self, weekday_index: u32) -> bool {
        weekday_index < 7 && self.0 & (1 << weekday_index) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        (0..7).filter(|v| self.contains(*v))
    }
}

/// Which days inside a qualifying week a weekly recurrence fires on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeekdaySelection {
    /// Only the listed weekdays. The anchor's own weekday is not implied.
    Explicit(WeekdayMask),
    /// The weekday the anchor date falls on.
    AnchorWeekday,
}

impl WeekdaySelection {
    /// An empty or fully invalid list falls back to the anchor weekday.
    pub fn from_indices(indices: Option<&[i64]>) -> Self {
        let mask = WeekdayMask::from_indices(indices.unwrap_or_default().iter().copied());
        if mask.is_empty() {
            WeekdaySelection::AnchorWeekday
        } else {
            WeekdaySelection::Explicit(mask)
        }
    }

    fn matches(&self, anchor: NaiveDate, target: NaiveDate) -> bool {
        match self {
            WeekdaySelection::Explicit(mask) => mask.contains(weekday_index(&target)),
            WeekdaySelection::AnchorWeekday => weekday_index(&anchor) == weekday_index(&target),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Weekly(WeekdaySelection),
    Monthly,
    /// Stored by clients but has no rule language behind it. Never occurs.
    Custom,
    /// Recurrence type this version doesn't know about. Never occurs.
    Unknown,
}

/// Recurrence rule relative to a task's anchor date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Recurrence {
    frequency: Frequency,
    interval: u32,
    end_date: Option<NaiveDate>,
}

impl Recurrence {
    /// Intervals below 1 are coerced to 1.
    pub fn new(frequency: Frequency, interval: i64, end_date: Option<NaiveDate>) -> Self {
        let interval = u32::try_from(interval.max(1)).unwrap_or(u32::MAX);
        Self {
            frequency,
            interval,
            end_date,
        }
    }

    pub fn daily(interval: i64) -> Self {
        Self::new(Frequency::Daily, interval, None)
    }

    pub fn weekly(interval: i64, weekdays: WeekdaySelection) -> Self {
        Self::new(Frequency::Weekly(weekdays), interval, None)
    }

    pub fn monthly(interval: i64) -> Self {
        Self::new(Frequency::Monthly, interval, None)
    }

    pub fn until(self, end_date: NaiveDate) -> Self {
        Self {
            end_date: Some(end_date),
            ..self
        }
    }

    pub fn frequency(&self) -> &Frequency {
        &self.frequency
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    fn is_period(&self, distance: i64) -> bool {
        distance.rem_euclid(i64::from(self.interval)) == 0
    }
}

/// Decides whether a task anchored on `anchor` is active on `target`.
///
/// Without a recurrence the task happens only on its anchor date. Recurring tasks never happen
/// before the anchor and never after the inclusive end date.
pub fn occurs_on(anchor: NaiveDate, recurrence: Option<&Recurrence>, target: NaiveDate) -> bool {
    let Some(recurrence) = recurrence else {
        return anchor == target;
    };

    if target < anchor {
        return false;
    }
    if matches!(recurrence.end_date, Some(end) if target > end) {
        return false;
    }

    match recurrence.frequency {
        Frequency::Daily => recurrence.is_period(days_between(&anchor, &target)),
        Frequency::Weekly(weekdays) => {
            recurrence.is_period(weeks_between(&anchor, &target))
                && weekdays.matches(anchor, target)
        }
        // No clamping: an anchor on the 31st skips every month that is shorter.
        Frequency::Monthly => {
            anchor.day() == target.day()
                && recurrence.is_period(months_between(&anchor, &target))
        }
        Frequency::Custom => {
            trace!("Custom recurrence is not supported, anchored on {anchor}");
            false
        }
        Frequency::Unknown => {
            trace!("Unknown recurrence type, anchored on {anchor}");
            false
        }
    }
}
