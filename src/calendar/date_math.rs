use anyhow::{anyhow, ensure, Result};
use chrono::{Datelike, Days, NaiveDate};

/// Number of whole calendar days from `a` to `b`. Negative when `b` is before `a`.
///
/// Both values are reduced to their calendar day before differencing, so times of day and
/// daylight saving transitions never shift the result.
pub fn days_between(a: &impl Datelike, b: &impl Datelike) -> i64 {
    i64::from(b.num_days_from_ce()) - i64::from(a.num_days_from_ce())
}

/// Whole weeks from `a` to `b`, rounded towards negative infinity.
pub fn weeks_between(a: &impl Datelike, b: &impl Datelike) -> i64 {
    days_between(a, b).div_euclid(7)
}

/// Month distance that ignores day of month. 31st of January to 1st of February is one month.
pub fn months_between(a: &impl Datelike, b: &impl Datelike) -> i64 {
    (i64::from(b.year()) - i64::from(a.year())) * 12 + (i64::from(b.month()) - i64::from(a.month()))
}

pub fn is_same_calendar_day(a: &impl Datelike, b: &impl Datelike) -> bool {
    a.year() == b.year() && a.month() == b.month() && a.day() == b.day()
}

/// Weekday index where 0 is Sunday and 6 is Saturday.
pub fn weekday_index(date: &impl Datelike) -> u32 {
    date.weekday().num_days_from_sunday()
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if NaiveDate::from_ymd_opt(year, 2, 29).is_some() => 29,
        2 => 28,
        _ => 31,
    }
}

/// Sunday on or before `date`. Week rows in every view start on Sunday.
pub fn week_start(date: NaiveDate) -> Result<NaiveDate> {
    date.checked_sub_days(Days::new(u64::from(weekday_index(&date))))
        .ok_or_else(|| anyhow!("Week of {date} starts before the earliest supported date"))
}

/// Returns every date needed to draw the month containing `date` as full weeks.
///
/// The sequence starts with the days of the previous month that share the first week row, then
/// all days of the month, then days of the next month until the last row is full. The length is
/// always a multiple of 7. Months whose padding falls outside the supported date range are an
/// error.
pub fn generate_month_grid(date: NaiveDate) -> Result<Vec<NaiveDate>> {
    let first = date
        .with_day(1)
        .ok_or_else(|| anyhow!("Month of {date} has no first day"))?;
    let leading = weekday_index(&first) as usize;
    let in_month = days_in_month(first.year(), first.month()) as usize;
    let trailing = (7 - (leading + in_month) % 7) % 7;
    let length = leading + in_month + trailing;

    let grid_start = week_start(first)?;
    let grid = grid_start.iter_days().take(length).collect::<Vec<_>>();
    // iter_days never yields NaiveDate::MAX
    ensure!(
        grid.len() == length,
        "Month of {date} ends after the latest supported date"
    );
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday};

    use super::{
        days_between, days_in_month, generate_month_grid, is_same_calendar_day, months_between,
        week_start, weekday_index, weeks_between,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_between_signed() {
        assert_eq!(days_between(&date(2024, 1, 1), &date(2024, 1, 4)), 3);
        assert_eq!(days_between(&date(2024, 1, 4), &date(2024, 1, 1)), -3);
        assert_eq!(days_between(&date(2023, 12, 31), &date(2024, 3, 1)), 61);
    }

    #[test]
    fn test_days_between_ignores_time_of_day() {
        let late = Utc.from_utc_datetime(&NaiveDateTime::new(
            date(2024, 3, 9),
            NaiveTime::from_hms_opt(23, 59, 0).unwrap(),
        ));
        let early = Utc.from_utc_datetime(&NaiveDateTime::new(
            date(2024, 3, 10),
            NaiveTime::from_hms_opt(0, 1, 0).unwrap(),
        ));
        assert_eq!(days_between(&late, &early), 1);
    }

    #[test]
    fn test_weeks_between_floors() {
        assert_eq!(weeks_between(&date(2024, 1, 1), &date(2024, 1, 7)), 0);
        assert_eq!(weeks_between(&date(2024, 1, 1), &date(2024, 1, 8)), 1);
        assert_eq!(weeks_between(&date(2024, 1, 1), &date(2024, 1, 22)), 3);
        assert_eq!(weeks_between(&date(2024, 1, 8), &date(2024, 1, 7)), -1);
    }

    #[test]
    fn test_months_between_ignores_day() {
        assert_eq!(months_between(&date(2024, 1, 31), &date(2024, 2, 1)), 1);
        assert_eq!(months_between(&date(2023, 11, 15), &date(2024, 2, 15)), 3);
        assert_eq!(months_between(&date(2024, 5, 1), &date(2024, 3, 31)), -2);
    }

    #[test]
    fn test_same_calendar_day() {
        let midnight = Utc.from_utc_datetime(&date(2024, 6, 1).and_time(NaiveTime::MIN));
        assert!(is_same_calendar_day(&midnight, &date(2024, 6, 1)));
        assert!(!is_same_calendar_day(&midnight, &date(2024, 6, 2)));
        assert!(!is_same_calendar_day(&date(2023, 6, 1), &date(2024, 6, 1)));
    }

    #[test]
    fn test_weekday_index_starts_on_sunday() {
        // 2024-01-07 is a Sunday
        assert_eq!(weekday_index(&date(2024, 1, 7)), 0);
        assert_eq!(weekday_index(&date(2024, 1, 8)), 1);
        assert_eq!(weekday_index(&date(2024, 1, 13)), 6);
        assert_eq!(date(2024, 1, 13).weekday(), Weekday::Sat);
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 12), 31);
    }

    #[test]
    fn test_week_start() {
        assert_eq!(week_start(date(2024, 1, 10)).unwrap(), date(2024, 1, 7));
        assert_eq!(week_start(date(2024, 1, 7)).unwrap(), date(2024, 1, 7));
        assert_eq!(week_start(date(2024, 3, 2)).unwrap(), date(2024, 2, 25));
    }

    #[test]
    fn test_range_edges_do_not_panic() {
        // Leading padding exists only if the range starts on a week boundary
        let min_is_sunday = weekday_index(&NaiveDate::MIN) == 0;
        assert_eq!(week_start(NaiveDate::MIN).is_ok(), min_is_sunday);
        assert_eq!(generate_month_grid(NaiveDate::MIN).is_ok(), min_is_sunday);

        assert!(generate_month_grid(NaiveDate::MAX).is_err());
        assert!(week_start(NaiveDate::MAX).is_ok());
    }

    #[test]
    fn test_month_grid_alignment() {
        // March 2024 starts on a Friday and ends on a Sunday
        let grid = generate_month_grid(date(2024, 3, 17)).unwrap();
        assert_eq!(grid.len(), 42);
        assert_eq!(grid[0], date(2024, 2, 25));
        assert_eq!(grid[5], date(2024, 3, 1));
        assert_eq!(*grid.last().unwrap(), date(2024, 4, 6));
    }

    #[test]
    fn test_month_grid_without_padding() {
        // February 2015 starts on a Sunday and has exactly 4 weeks
        let grid = generate_month_grid(date(2015, 2, 14)).unwrap();
        assert_eq!(grid.len(), 28);
        assert_eq!(grid[0], date(2015, 2, 1));
        assert_eq!(grid[27], date(2015, 2, 28));
    }

    #[test]
    fn test_month_grid_shape_for_every_month() {
        for year in [1999, 2023, 2024, 2100] {
            for month in 1..=12 {
                let query = date(year, month, 1);
                let grid = generate_month_grid(query).unwrap();
                assert_eq!(grid.len() % 7, 0, "{query}");
                assert_eq!(weekday_index(&grid[0]), 0, "{query}");

                let in_month = grid.iter().filter(|d| d.month() == month).count();
                assert_eq!(in_month as u32, days_in_month(year, month), "{query}");

                let consecutive = grid.windows(2).all(|w| days_between(&w[0], &w[1]) == 1);
                assert!(consecutive, "{query}");
                assert_eq!(generate_month_grid(query).unwrap(), grid);
            }
        }
    }
}
