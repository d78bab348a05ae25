//! Pure date and time-of-day helpers for the weekly slot window.
//!
//! Every function takes the reference date explicitly so callers can pin
//! the clock in tests; only the service edge supplies `Utc::now()`.
//! Times of day are minutes since midnight, so interval checks and the
//! one-hour walk never touch string comparison.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

pub const MORNING_START: u32 = 6 * 60;
pub const MORNING_END: u32 = 12 * 60;
pub const AFTERNOON_END: u32 = 18 * 60;

/// Seven consecutive dates starting at `today`.
pub fn week_dates(today: NaiveDate) -> Vec<NaiveDate> {
    (0..7).map(|offset| today + Duration::days(offset)).collect()
}

pub fn day_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn weekday_from_name(name: &str) -> Option<Weekday> {
    match name {
        "Monday" => Some(Weekday::Mon),
        "Tuesday" => Some(Weekday::Tue),
        "Wednesday" => Some(Weekday::Wed),
        "Thursday" => Some(Weekday::Thu),
        "Friday" => Some(Weekday::Fri),
        "Saturday" => Some(Weekday::Sat),
        "Sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Next date on or after `today` falling on the named weekday; `today`
/// itself if it matches. `None` for an unrecognized weekday name.
pub fn next_occurrence(name: &str, today: NaiveDate) -> Option<NaiveDate> {
    let target = weekday_from_name(name)?;
    let days_ahead = (target.num_days_from_monday() as i64
        - today.weekday().num_days_from_monday() as i64)
        .rem_euclid(7);
    Some(today + Duration::days(days_ahead))
}

/// A special date is usable only if it is today or later and its actual
/// weekday agrees with the rule's `day_of_week`.
pub fn validate_special_date(
    special: NaiveDate,
    day_of_week: &str,
    today: NaiveDate,
) -> Option<NaiveDate> {
    if special < today {
        return None;
    }
    (day_name(special) == day_of_week).then_some(special)
}

/// Parses "HH:MM" into minutes since midnight.
pub fn parse_hhmm(value: &str) -> Option<u32> {
    let (hours, minutes) = value.split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    (hours < 24 && minutes < 60).then_some(hours * 60 + minutes)
}

pub fn format_hhmm(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

pub fn is_morning(minutes: u32) -> bool {
    (MORNING_START..MORNING_END).contains(&minutes)
}

pub fn is_afternoon(minutes: u32) -> bool {
    (MORNING_END..AFTERNOON_END).contains(&minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_dates_are_seven_consecutive_days() {
        let today = date(2025, 3, 5);
        let dates = week_dates(today);
        assert_eq!(dates.len(), 7);
        assert_eq!(dates[0], today);
        for window in dates.windows(2) {
            assert_eq!(window[1] - window[0], Duration::days(1));
        }
    }

    #[test]
    fn day_names_round_trip() {
        // 2025-03-03 is a Monday.
        let monday = date(2025, 3, 3);
        for offset in 0..7 {
            let d = monday + Duration::days(offset);
            assert_eq!(weekday_from_name(day_name(d)), Some(d.weekday()));
        }
    }

    #[test]
    fn next_occurrence_today_when_weekday_matches() {
        let wednesday = date(2025, 3, 5);
        assert_eq!(next_occurrence("Wednesday", wednesday), Some(wednesday));
    }

    #[test]
    fn next_occurrence_wraps_to_next_week() {
        let wednesday = date(2025, 3, 5);
        // Monday already passed this week.
        assert_eq!(next_occurrence("Monday", wednesday), Some(date(2025, 3, 10)));
        assert_eq!(next_occurrence("Friday", wednesday), Some(date(2025, 3, 7)));
    }

    #[test]
    fn next_occurrence_rejects_unknown_name() {
        assert_eq!(next_occurrence("Funday", date(2025, 3, 5)), None);
    }

    #[test]
    fn special_date_must_match_weekday_and_not_be_past() {
        let today = date(2025, 3, 5);
        let monday = date(2025, 3, 10);
        assert_eq!(validate_special_date(monday, "Monday", today), Some(monday));
        // Wrong weekday.
        assert_eq!(validate_special_date(monday, "Tuesday", today), None);
        // In the past.
        assert_eq!(validate_special_date(date(2025, 3, 3), "Monday", today), None);
        // Today itself is allowed.
        assert_eq!(
            validate_special_date(today, "Wednesday", today),
            Some(today)
        );
    }

    #[test]
    fn parse_hhmm_accepts_only_two_digit_fields() {
        assert_eq!(parse_hhmm("09:00"), Some(540));
        assert_eq!(parse_hhmm("23:59"), Some(1439));
        assert_eq!(parse_hhmm("9:00"), None);
        assert_eq!(parse_hhmm("24:00"), None);
        assert_eq!(parse_hhmm("12:60"), None);
        assert_eq!(parse_hhmm("noon"), None);
    }

    #[test]
    fn format_hhmm_pads_to_two_digits() {
        assert_eq!(format_hhmm(540), "09:00");
        assert_eq!(format_hhmm(1439), "23:59");
        assert_eq!(format_hhmm(0), "00:00");
    }

    #[test]
    fn buckets_are_half_open_and_disjoint() {
        assert!(!is_morning(MORNING_START - 1));
        assert!(is_morning(MORNING_START));
        assert!(!is_morning(MORNING_END));
        assert!(is_afternoon(MORNING_END));
        assert!(!is_afternoon(AFTERNOON_END));
        // Every minute lands in at most one bucket.
        for minutes in 0..(24 * 60) {
            assert!(!(is_morning(minutes) && is_afternoon(minutes)));
        }
    }
}
