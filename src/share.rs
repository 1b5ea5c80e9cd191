use chrono::NaiveDate;
use thiserror::Error;

use crate::dates::{ScheduleView, view_label, week_days};
use crate::models::Shift;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShareMethod {
    #[default]
    Email,
    Sms,
    Both,
}

impl ShareMethod {
    pub fn label(self) -> &'static str {
        match self {
            ShareMethod::Email => "email",
            ShareMethod::Sms => "SMS",
            ShareMethod::Both => "email and SMS",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ShareMethod::Email => ShareMethod::Sms,
            ShareMethod::Sms => ShareMethod::Both,
            ShareMethod::Both => ShareMethod::Email,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShareError {
    #[error("Select at least one employee")]
    NoRecipients,
}

/// Confirmation shown after the schedule for `date`'s week is sent.
pub fn share_message(
    date: NaiveDate,
    recipients: usize,
    method: ShareMethod,
) -> Result<String, ShareError> {
    if recipients == 0 {
        return Err(ShareError::NoRecipients);
    }
    let range = view_label(ScheduleView::Week, date);
    let range = range.replacen("Week of", "week of", 1);
    Ok(format!(
        "The {range} has been sent to {recipients} employee(s) via {}.",
        method.label()
    ))
}

/// Plain-text rota for the week containing `date`, one block per day.
pub fn schedule_text(date: NaiveDate, shifts: &[Shift]) -> String {
    let mut lines = vec![view_label(ScheduleView::Week, date), String::new()];

    for day in week_days(date) {
        let mut todays: Vec<&Shift> = shifts
            .iter()
            .filter(|shift| shift.date == day)
            .collect();
        if todays.is_empty() {
            continue;
        }
        todays.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        lines.push(day.format("%A, %B %-d").to_string());
        for shift in todays {
            let position = shift
                .position
                .as_deref()
                .map(|position| format!(" ({position})"))
                .unwrap_or_default();
            lines.push(format!(
                "  {} {}-{}{} {:.2}h",
                shift.employee, shift.start_time, shift.end_time, position, shift.hours
            ));
        }
    }

    if lines.len() == 2 {
        lines.push("No shifts scheduled.".to_string());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::seed_shifts;

    fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 19).unwrap()
    }

    #[test]
    fn message_names_range_count_and_method() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 22).unwrap();
        let message = share_message(date, 8, ShareMethod::Both).unwrap();
        assert_eq!(
            message,
            "The week of May 19 - May 25 has been sent to 8 employee(s) via email and SMS."
        );
        assert_eq!(share_message(date, 0, ShareMethod::Email), Err(ShareError::NoRecipients));
    }

    #[test]
    fn text_lists_only_the_selected_week() {
        let shifts = seed_shifts(anchor());
        let text = schedule_text(anchor(), &shifts);
        assert!(text.starts_with("Week of May 19 - May 25"));
        assert!(text.contains("Monday, May 20"));
        assert!(text.contains("Shane 06:00-14:30 (Manager) 8.50h"));
        // Offsets 8 and 9 fall in the following week.
        assert!(!text.contains("Monday, May 27"));
    }

    #[test]
    fn empty_week_says_so() {
        let text = schedule_text(anchor(), &[]);
        assert!(text.ends_with("No shifts scheduled."));
    }
}
