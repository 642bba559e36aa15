#![forbid(unsafe_code)]

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use time::{Date, Month};

/// ISO-8601 week bucket: week number plus the week-based year.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekBucket {
    pub week: u8,
    pub year: i32,
}

pub fn bucket_of(date: Date) -> WeekBucket {
    let (year, week, _) = date.to_iso_week_date();
    WeekBucket { week, year }
}

/// ISO week numbers covered by `today`'s calendar month, keyed strictly on
/// `today`'s week-based year.
///
/// Boundary weeks that belong to the previous or next ISO year (a January 1st
/// in week 52/53, a December 31st in week 1) are clamped to the current
/// year's first/last week instead of producing an inverted range.
pub fn month_week_span(today: Date) -> RangeInclusive<u8> {
    let current_year = bucket_of(today).year;
    let first = bucket_of(first_day_of_month(today));
    let last = bucket_of(last_day_of_month(today));

    let start = if first.year == current_year { first.week } else { 1 };
    let end = if last.year == current_year {
        last.week
    } else {
        time::util::weeks_in_year(current_year)
    };
    start..=end
}

fn first_day_of_month(date: Date) -> Date {
    date.replace_day(1).unwrap_or(date)
}

fn last_day_of_month(date: Date) -> Date {
    let next_month = match date.month() {
        Month::December => Date::from_calendar_date(date.year() + 1, Month::January, 1),
        month => Date::from_calendar_date(date.year(), month.next(), 1),
    };
    next_month
        .ok()
        .and_then(|first| first.previous_day())
        .unwrap_or(date)
}
