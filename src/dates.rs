use chrono::{Datelike, Duration, Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleView {
    Day,
    #[default]
    Week,
    Month,
}

impl ScheduleView {
    pub fn label(self) -> &'static str {
        match self {
            ScheduleView::Day => "Day",
            ScheduleView::Week => "Week",
            ScheduleView::Month => "Month",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ScheduleView::Day => ScheduleView::Week,
            ScheduleView::Week => ScheduleView::Month,
            ScheduleView::Month => ScheduleView::Day,
        }
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Sunday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

pub fn week_days(date: NaiveDate) -> [NaiveDate; 7] {
    let start = week_start(date);
    std::array::from_fn(|offset| start + Duration::days(offset as i64))
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn month_end(date: NaiveDate) -> NaiveDate {
    let first = month_start(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(first)
}

/// Calendar cells for the month containing `date`, padded with `None` to whole
/// Sunday-first weeks.
pub fn month_grid(date: NaiveDate) -> Vec<Option<NaiveDate>> {
    let first = month_start(date);
    let last = month_end(date);
    let mut cells: Vec<Option<NaiveDate>> = Vec::with_capacity(42);
    for _ in 0..first.weekday().num_days_from_sunday() {
        cells.push(None);
    }
    let mut current = first;
    while current <= last {
        cells.push(Some(current));
        current = current.succ_opt().unwrap_or(current + Duration::days(1));
    }
    while cells.len() % 7 != 0 {
        cells.push(None);
    }
    cells
}

/// First and last day covered by `view` around `date`.
pub fn view_bounds(view: ScheduleView, date: NaiveDate) -> (NaiveDate, NaiveDate) {
    match view {
        ScheduleView::Day => (date, date),
        ScheduleView::Week => {
            let start = week_start(date);
            (start, start + Duration::days(6))
        }
        ScheduleView::Month => (month_start(date), month_end(date)),
    }
}

pub fn view_label(view: ScheduleView, date: NaiveDate) -> String {
    match view {
        ScheduleView::Day => date.format("%A, %B %-d, %Y").to_string(),
        ScheduleView::Week => {
            let (start, end) = view_bounds(view, date);
            format!(
                "Week of {} - {}",
                start.format("%B %-d"),
                end.format("%B %-d")
            )
        }
        ScheduleView::Month => date.format("%B %Y").to_string(),
    }
}

/// Moves `date` one view-sized step forward or back.
pub fn step(view: ScheduleView, date: NaiveDate, forward: bool) -> NaiveDate {
    let moved = match (view, forward) {
        (ScheduleView::Day, true) => date.checked_add_signed(Duration::days(1)),
        (ScheduleView::Day, false) => date.checked_sub_signed(Duration::days(1)),
        (ScheduleView::Week, true) => date.checked_add_signed(Duration::days(7)),
        (ScheduleView::Week, false) => date.checked_sub_signed(Duration::days(7)),
        (ScheduleView::Month, true) => date.checked_add_months(Months::new(1)),
        (ScheduleView::Month, false) => date.checked_sub_months(Months::new(1)),
    };
    moved.unwrap_or(date)
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| "Invalid date format. Use YYYY-MM-DD.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn parse_date_valid() {
        let date = parse_date("2026-02-03").unwrap();
        assert_eq!(date, ymd(2026, 2, 3));
    }

    #[test]
    fn parse_date_invalid() {
        assert!(parse_date("02-03-2026").is_err());
    }

    #[test]
    fn weeks_start_on_sunday() {
        // 2024-05-22 is a Wednesday.
        assert_eq!(week_start(ymd(2024, 5, 22)), ymd(2024, 5, 19));
        assert_eq!(week_start(ymd(2024, 5, 19)), ymd(2024, 5, 19));
        let days = week_days(ymd(2024, 5, 25));
        assert_eq!(days[0], ymd(2024, 5, 19));
        assert_eq!(days[6], ymd(2024, 5, 25));
    }

    #[test]
    fn month_grid_covers_whole_weeks() {
        // June 2024 starts on Saturday and needs six rows.
        let grid = month_grid(ymd(2024, 6, 10));
        assert_eq!(grid.len(), 42);
        assert_eq!(grid[6], Some(ymd(2024, 6, 1)));
        assert!(grid.contains(&Some(ymd(2024, 6, 30))));

        // February 2026 starts on Sunday and fits four rows.
        let grid = month_grid(ymd(2026, 2, 14));
        assert_eq!(grid.len(), 28);
        assert_eq!(grid[0], Some(ymd(2026, 2, 1)));
    }

    #[test]
    fn labels_match_view() {
        let date = ymd(2024, 5, 20);
        assert_eq!(view_label(ScheduleView::Day, date), "Monday, May 20, 2024");
        assert_eq!(view_label(ScheduleView::Week, date), "Week of May 19 - May 25");
        assert_eq!(view_label(ScheduleView::Month, date), "May 2024");
    }

    #[test]
    fn month_step_clamps_to_shorter_months() {
        assert_eq!(step(ScheduleView::Month, ymd(2024, 1, 31), true), ymd(2024, 2, 29));
        assert_eq!(step(ScheduleView::Week, ymd(2024, 1, 31), false), ymd(2024, 1, 24));
    }
}
