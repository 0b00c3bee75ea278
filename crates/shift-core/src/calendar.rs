//! Work-restricted day lookup.
//!
//! A month change seeds the busy days from this lookup: every weekend and
//! public holiday of the new month starts out as a busy day.

use crate::types::{Day, Month};
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::BTreeSet;

pub trait HolidayCalendar {
    /// Whether `date` is a weekend or public holiday.
    fn is_work_restricted_day(&self, date: NaiveDate) -> bool;
}

/// Weekends plus a fixed list of holiday dates.
#[derive(Debug, Clone, Default)]
pub struct StaticCalendar {
    pub weekends: bool,
    pub holidays: BTreeSet<NaiveDate>,
}

impl StaticCalendar {
    pub fn weekends_only() -> Self {
        Self {
            weekends: true,
            holidays: BTreeSet::new(),
        }
    }

    pub fn with_holidays(mut self, holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.holidays.extend(holidays);
        self
    }
}

impl HolidayCalendar for StaticCalendar {
    fn is_work_restricted_day(&self, date: NaiveDate) -> bool {
        if self.weekends && matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return true;
        }
        self.holidays.contains(&date)
    }
}

/// Every day of `month` the calendar marks as restricted.
pub fn restricted_days(month: Month, calendar: &dyn HolidayCalendar) -> BTreeSet<Day> {
    month
        .days()
        .filter(|&day| {
            month
                .date(day)
                .is_some_and(|date| calendar.is_work_restricted_day(date))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn weekends_of_june_2024() {
        let month: Month = "2024-06".parse().unwrap();
        let days = restricted_days(month, &StaticCalendar::weekends_only());
        assert_eq!(
            days.into_iter().collect::<Vec<_>>(),
            vec![1, 2, 8, 9, 15, 16, 22, 23, 29, 30]
        );
    }

    #[test]
    fn holidays_are_included() {
        let month: Month = "2024-05".parse().unwrap();
        let calendar =
            StaticCalendar::weekends_only().with_holidays([date("2024-05-03"), date("2024-06-03")]);
        let days = restricted_days(month, &calendar);
        assert!(days.contains(&3));
        assert!(days.contains(&4));
        assert!(!days.contains(&2));
    }

    #[test]
    fn empty_calendar_restricts_nothing() {
        let month: Month = "2024-06".parse().unwrap();
        assert!(restricted_days(month, &StaticCalendar::default()).is_empty());
    }
}
