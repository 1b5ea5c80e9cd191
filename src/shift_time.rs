use chrono::{NaiveTime, Timelike};
use thiserror::Error;

const MINUTES_PER_DAY: i64 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShiftTimeError {
    #[error("Invalid time \"{0}\". Use HH:MM.")]
    Malformed(String),
}

/// Parses a 24-hour `HH:MM` value. Single-digit hours (`9:00`) are accepted.
pub fn parse_time(value: &str) -> Result<NaiveTime, ShiftTimeError> {
    let trimmed = value.trim();
    let (hours, minutes) = trimmed
        .split_once(':')
        .ok_or_else(|| ShiftTimeError::Malformed(trimmed.to_string()))?;
    let digits = |field: &str| field.bytes().all(|b| b.is_ascii_digit());
    if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 || !digits(hours) || !digits(minutes) {
        return Err(ShiftTimeError::Malformed(trimmed.to_string()));
    }
    let hour: u32 = hours
        .parse()
        .map_err(|_| ShiftTimeError::Malformed(trimmed.to_string()))?;
    let minute: u32 = minutes
        .parse()
        .map_err(|_| ShiftTimeError::Malformed(trimmed.to_string()))?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| ShiftTimeError::Malformed(trimmed.to_string()))
}

pub fn format_time(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

/// Minutes worked between two clock times. An end before the start is
/// treated as the next day.
pub fn shift_minutes(start: NaiveTime, end: NaiveTime) -> i64 {
    let start_minutes = i64::from(start.hour() * 60 + start.minute());
    let end_minutes = i64::from(end.hour() * 60 + end.minute());
    let delta = end_minutes - start_minutes;
    if delta < 0 { delta + MINUTES_PER_DAY } else { delta }
}

/// Fractional hours between two `HH:MM` strings, rounded to two decimals.
pub fn shift_hours(start: &str, end: &str) -> Result<f64, ShiftTimeError> {
    let start = parse_time(start)?;
    let end = parse_time(end)?;
    Ok(round_hours(shift_minutes(start, end)))
}

fn round_hours(minutes: i64) -> f64 {
    let hours = minutes as f64 / 60.0;
    (hours * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_day_duration_is_plain_difference() {
        assert_eq!(shift_hours("09:00", "17:00").unwrap(), 8.0);
        assert_eq!(shift_hours("06:15", "14:45").unwrap(), 8.5);
        assert_eq!(shift_hours("10:00", "10:20").unwrap(), 0.33);
    }

    #[test]
    fn negative_minute_delta_borrows_an_hour() {
        assert_eq!(shift_hours("08:45", "12:30").unwrap(), 3.75);
    }

    #[test]
    fn end_before_start_wraps_past_midnight() {
        assert_eq!(shift_hours("22:00", "06:00").unwrap(), 8.0);
        assert_eq!(shift_hours("23:30", "00:15").unwrap(), 0.75);
    }

    #[test]
    fn equal_times_are_zero_hours() {
        assert_eq!(shift_hours("12:00", "12:00").unwrap(), 0.0);
    }

    #[test]
    fn every_same_day_pair_matches_difference() {
        for start in (0..24 * 60).step_by(45) {
            for end in (start..24 * 60).step_by(50) {
                let start_label = format!("{:02}:{:02}", start / 60, start % 60);
                let end_label = format!("{:02}:{:02}", end / 60, end % 60);
                let expected = ((end - start) as f64 / 60.0 * 100.0).round() / 100.0;
                assert_eq!(shift_hours(&start_label, &end_label).unwrap(), expected);
            }
        }
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(shift_hours("9am", "17:00").is_err());
        assert!(shift_hours("24:00", "17:00").is_err());
        assert!(shift_hours("09:60", "17:00").is_err());
        assert!(shift_hours("09:0", "17:00").is_err());
        assert!(shift_hours("", "17:00").is_err());
        assert!(parse_time("+9:00").is_err());
        assert!(parse_time("09:+5").is_err());
        assert!(parse_time("-1:00").is_err());
    }

    #[test]
    fn single_digit_hour_is_accepted() {
        assert_eq!(format_time(parse_time("9:05").unwrap()), "09:05");
    }
}
