//! Date helpers shared by the scheduler, replay and queue

use chrono::{DateTime, Duration, Utc};

use super::error::{FsrsError, Result};

/// Granularity of [`date_diff`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffUnit {
    Days,
    Minutes,
}

/// Floor of `later - earlier` in whole units (negative when `later` is earlier)
pub fn date_diff(later: DateTime<Utc>, earlier: DateTime<Utc>, unit: DiffUnit) -> i64 {
    let ms = (later - earlier).num_milliseconds();
    let unit_ms = match unit {
        DiffUnit::Days => 86_400_000,
        DiffUnit::Minutes => 60_000,
    };
    ms.div_euclid(unit_ms)
}

/// Number of UTC calendar days from `from` to `to`
///
/// 23:59 → 00:01 the next day counts as one day.
pub fn calendar_days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to.date_naive() - from.date_naive()).num_days()
}

/// `at` shifted by whole days; fails past chrono's representable range
pub fn add_days(at: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>> {
    Duration::try_days(days)
        .and_then(|delta| at.checked_add_signed(delta))
        .ok_or_else(|| out_of_range(at, days, "days"))
}

/// `at` shifted by whole minutes; fails past chrono's representable range
pub fn add_minutes(at: DateTime<Utc>, minutes: i64) -> Result<DateTime<Utc>> {
    Duration::try_minutes(minutes)
        .and_then(|delta| at.checked_add_signed(delta))
        .ok_or_else(|| out_of_range(at, minutes, "minutes"))
}

fn out_of_range(at: DateTime<Utc>, amount: i64, unit: &str) -> FsrsError {
    FsrsError::DateOutOfRange(format!("{} + {} {}", at.to_rfc3339(), amount, unit))
}

/// `YYYY-MM-DD HH:MM:SS` in UTC
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Default unit labels for [`show_diff_message`]
pub const DIFF_LABELS: [&str; 6] = ["second", "min", "hour", "day", "month", "year"];

const DIFF_STEPS: [f64; 5] = [60.0, 60.0, 24.0, 31.0, 12.0];

/// Human readable gap from `last_review` to `due`, e.g. `"3day"` or `"10min"`
pub fn show_diff_message(due: DateTime<Utc>, last_review: DateTime<Utc>, with_unit: bool) -> String {
    show_diff_message_with_labels(due, last_review, with_unit, &DIFF_LABELS)
}

/// [`show_diff_message`] with custom unit labels
pub fn show_diff_message_with_labels(
    due: DateTime<Utc>,
    last_review: DateTime<Utc>,
    with_unit: bool,
    labels: &[&str; 6],
) -> String {
    let mut value = (due - last_review).num_milliseconds() as f64 / 1000.0;
    let mut unit = 0;
    while unit < DIFF_STEPS.len() && value >= DIFF_STEPS[unit] {
        value /= DIFF_STEPS[unit];
        unit += 1;
    }
    if with_unit {
        format!("{}{}", value.floor(), labels[unit])
    } else {
        format!("{}", value.floor())
    }
}
