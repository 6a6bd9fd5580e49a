//! Weekly cadence of the series, anchored at draw #1.

use std::sync::LazyLock;

use chrono::{DateTime, Days, NaiveDate, Utc};

const DAYS_PER_WEEK: i64 = 7;

/// Calendar date of draw #1.
pub static FIRST_DRAW_DATE: LazyLock<NaiveDate> =
    LazyLock::new(|| NaiveDate::from_ymd_opt(2002, 12, 7).expect("valid calendar date"));

/// Nominal date of `draw_no` if the weekly cadence never slipped.
pub fn scheduled_date(draw_no: u32) -> Option<NaiveDate> {
    let weeks = u64::from(draw_no.checked_sub(1)?);
    FIRST_DRAW_DATE.checked_add_days(Days::new(weeks * DAYS_PER_WEEK as u64))
}

/// Estimates the newest draw number from the cadence alone:
/// `floor(days_since_first / 7) + 1`, never below 1.
pub fn estimate_latest(now: DateTime<Utc>) -> u32 {
    let first = FIRST_DRAW_DATE.and_hms_opt(0, 0, 0).map(|t| t.and_utc());
    let Some(first) = first else {
        return 1;
    };

    let diff_days = (now - first).num_days();
    if diff_days < 0 {
        return 1;
    }
    u32::try_from(diff_days / DAYS_PER_WEEK + 1).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    #[test]
    fn estimate_follows_weekly_cadence() {
        let draw_day = Utc.with_ymd_and_hms(2024, 2, 3, 21, 0, 0).single();
        assert_eq!(draw_day.map(estimate_latest), Some(1105));

        let day_before = Utc.with_ymd_and_hms(2024, 2, 2, 12, 0, 0).single();
        assert_eq!(day_before.map(estimate_latest), Some(1104));

        let first_day = Utc.with_ymd_and_hms(2002, 12, 7, 0, 0, 0).single();
        assert_eq!(first_day.map(estimate_latest), Some(1));

        let before_series = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).single();
        assert_eq!(before_series.map(estimate_latest), Some(1));
    }

    #[test]
    fn scheduled_date_is_weekly() {
        assert_eq!(scheduled_date(1), Some(*FIRST_DRAW_DATE));
        assert_eq!(scheduled_date(1105), NaiveDate::from_ymd_opt(2024, 2, 3));
        assert_eq!(scheduled_date(0), None);
    }
}
