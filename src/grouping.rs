use std::collections::HashMap;

use crate::models::Shift;

#[derive(Debug, Clone)]
pub struct EmployeeHours {
    pub name: String,
    pub total_hours: f64,
    pub shift_count: usize,
}

/// Totals hours per employee, largest first. Ties keep alphabetical order.
pub fn hours_by_employee<'a>(shifts: impl IntoIterator<Item = &'a Shift>) -> Vec<EmployeeHours> {
    let mut totals: HashMap<&str, (f64, usize)> = HashMap::new();
    for shift in shifts {
        let entry = totals.entry(shift.employee.as_str()).or_insert((0.0, 0));
        entry.0 += shift.hours;
        entry.1 += 1;
    }

    let mut result: Vec<EmployeeHours> = totals
        .into_iter()
        .map(|(name, (total_hours, shift_count))| EmployeeHours {
            name: name.to_string(),
            total_hours,
            shift_count,
        })
        .collect();

    result.sort_by(|a, b| {
        b.total_hours
            .total_cmp(&a.total_hours)
            .then_with(|| a.name.cmp(&b.name))
    });

    result
}

pub fn total_hours<'a>(shifts: impl IntoIterator<Item = &'a Shift>) -> f64 {
    shifts.into_iter().map(|shift| shift.hours).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn shift(employee: &str, hours: f64) -> Shift {
        Shift {
            id: format!("{employee}-{hours}"),
            employee: employee.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 20).unwrap(),
            start_time: "09:00".to_string(),
            end_time: "17:00".to_string(),
            hours,
            department: "Deli".to_string(),
            position: None,
        }
    }

    #[test]
    fn groups_shifts_by_employee() {
        let shifts = vec![
            shift("Randy", 8.0),
            shift("Crystal", 4.0),
            shift("Randy", 7.5),
            shift("Alice", 4.0),
        ];

        let grouped = hours_by_employee(&shifts);
        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped[0].name, "Randy");
        assert_eq!(grouped[0].shift_count, 2);
        assert!((grouped[0].total_hours - 15.5).abs() < 0.01);
        assert_eq!(grouped[1].name, "Alice");
        assert_eq!(grouped[2].name, "Crystal");
        assert!((total_hours(&shifts) - 23.5).abs() < 0.01);
    }
}
