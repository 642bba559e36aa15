#![forbid(unsafe_code)]

use time::Date;

/// Whether a weekly/biweekly entry applies on a candidate date.
///
/// `day_of_week` is Sunday-based (0 = Sunday .. 6 = Saturday). Entries with
/// `interval_weeks == 1`, or with no reference date, apply on every matching
/// weekday. Multi-week entries apply when the whole-week distance from the
/// reference date is a multiple of the interval; the reference date may lie in
/// the future, so the distance is signed and reduced with `rem_euclid`.
pub fn applies_on(
    candidate: Date,
    day_of_week: u8,
    interval_weeks: u32,
    reference_date: Option<Date>,
) -> bool {
    if candidate.weekday().number_days_from_sunday() != day_of_week {
        return false;
    }
    if interval_weeks <= 1 {
        return true;
    }
    let Some(reference) = reference_date else {
        return true;
    };
    let span_days = (candidate - reference).whole_days();
    // Round, not truncate: the reference date need not share the entry's
    // weekday, so the span is not always an exact multiple of 7.
    let diff_weeks = (span_days as f64 / 7.0).round() as i64;
    diff_weeks.rem_euclid(i64::from(interval_weeks)) == 0
}
