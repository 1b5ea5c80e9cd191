use chrono::{Duration, NaiveDate};
use std::io;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{MEAT_MARKET, Shift};
use crate::shift_time::{ShiftTimeError, format_time, parse_time, shift_hours};
use crate::storage::{LocalStore, keys};

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Time(#[from] ShiftTimeError),
    #[error("Shift {0} not found")]
    NotFound(String),
    #[error("Failed to save schedule: {0}")]
    Storage(#[from] io::Error),
}

/// Unvalidated shift fields as entered in the shift form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftDraft {
    pub employee: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub department: String,
    pub position: Option<String>,
}

impl ShiftDraft {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            employee: String::new(),
            date,
            start_time: "09:00".to_string(),
            end_time: "17:00".to_string(),
            department: String::new(),
            position: None,
        }
    }

    pub fn from_shift(shift: &Shift) -> Self {
        Self {
            employee: shift.employee.clone(),
            date: shift.date,
            start_time: shift.start_time.clone(),
            end_time: shift.end_time.clone(),
            department: shift.department.clone(),
            position: shift.position.clone(),
        }
    }

    fn into_shift(self, id: String) -> Result<Shift, ScheduleError> {
        let employee = self.employee.trim().to_string();
        let department = self.department.trim().to_string();
        let position = self
            .position
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        if employee.is_empty() {
            return Err(ScheduleError::Invalid("Employee is required.".to_string()));
        }
        if department.is_empty() {
            return Err(ScheduleError::Invalid("Department is required.".to_string()));
        }
        if department == MEAT_MARKET && position.is_none() {
            return Err(ScheduleError::Invalid(
                "Position is required for Meat Market shifts.".to_string(),
            ));
        }

        let hours = shift_hours(&self.start_time, &self.end_time)?;
        Ok(Shift {
            id,
            employee,
            date: self.date,
            start_time: format_time(parse_time(&self.start_time)?),
            end_time: format_time(parse_time(&self.end_time)?),
            hours,
            department,
            position,
        })
    }
}

/// Shift collection mirrored into the local store under `shiftSchedule`.
/// Each mutation rewrites the whole collection.
#[derive(Debug)]
pub struct ScheduleCache {
    shifts: Vec<Shift>,
    seed_anchor: NaiveDate,
}

impl ScheduleCache {
    /// Prefers the cached collection; falls back to seed data when the key is
    /// missing or unreadable.
    pub fn load(store: &LocalStore, seed_anchor: NaiveDate) -> Self {
        let shifts = match store.get(keys::SHIFT_SCHEDULE) {
            Some(raw) => match serde_json::from_str::<Vec<Shift>>(raw) {
                Ok(shifts) => {
                    debug!(count = shifts.len(), "loaded cached schedule");
                    shifts
                }
                Err(err) => {
                    warn!("cached schedule unreadable, using defaults: {err}");
                    seed_shifts(seed_anchor)
                }
            },
            None => seed_shifts(seed_anchor),
        };
        Self {
            shifts,
            seed_anchor,
        }
    }

    pub fn shifts(&self) -> &[Shift] {
        &self.shifts
    }

    pub fn get(&self, id: &str) -> Option<&Shift> {
        self.shifts.iter().find(|shift| shift.id == id)
    }

    pub fn on_date(&self, date: NaiveDate) -> Vec<&Shift> {
        self.shifts.iter().filter(|shift| shift.date == date).collect()
    }

    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Vec<&Shift> {
        self.shifts
            .iter()
            .filter(|shift| shift.date >= start && shift.date <= end)
            .collect()
    }

    pub fn create(&mut self, store: &mut LocalStore, draft: ShiftDraft) -> Result<Shift, ScheduleError> {
        let shift = draft.into_shift(Uuid::new_v4().to_string())?;
        let mut next = self.shifts.clone();
        next.push(shift.clone());
        self.commit(store, next)?;
        info!(id = %shift.id, employee = %shift.employee, "shift created");
        Ok(shift)
    }

    pub fn update(
        &mut self,
        store: &mut LocalStore,
        id: &str,
        draft: ShiftDraft,
    ) -> Result<Shift, ScheduleError> {
        let index = self
            .shifts
            .iter()
            .position(|shift| shift.id == id)
            .ok_or_else(|| ScheduleError::NotFound(id.to_string()))?;
        let shift = draft.into_shift(id.to_string())?;
        let mut next = self.shifts.clone();
        next[index] = shift.clone();
        self.commit(store, next)?;
        info!(id, "shift updated");
        Ok(shift)
    }

    pub fn delete(&mut self, store: &mut LocalStore, id: &str) -> Result<Shift, ScheduleError> {
        let index = self
            .shifts
            .iter()
            .position(|shift| shift.id == id)
            .ok_or_else(|| ScheduleError::NotFound(id.to_string()))?;
        let mut next = self.shifts.clone();
        let removed = next.remove(index);
        self.commit(store, next)?;
        info!(id, "shift deleted");
        Ok(removed)
    }

    /// Replaces the collection with the seed data.
    pub fn reset(&mut self, store: &mut LocalStore) -> Result<(), ScheduleError> {
        self.commit(store, seed_shifts(self.seed_anchor))?;
        info!(count = self.shifts.len(), "schedule reset to defaults");
        Ok(())
    }

    /// Writes `next` to the store and only then adopts it, so a failed write
    /// leaves the collection as it was.
    fn commit(&mut self, store: &mut LocalStore, next: Vec<Shift>) -> Result<(), ScheduleError> {
        let json = serde_json::to_string(&next)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;
        store.set(keys::SHIFT_SCHEDULE, json)?;
        self.shifts = next;
        Ok(())
    }
}

/// Default rota for the Meat Market, laid out over the week starting at
/// `anchor` and the week after.
pub fn seed_shifts(anchor: NaiveDate) -> Vec<Shift> {
    const ROTA: [(&str, &str, i64, &str, &str); 12] = [
        ("Shane", "Manager", 1, "06:00", "14:30"),
        ("James", "Assistant Manager", 1, "10:00", "18:30"),
        ("Randy", "Meat Cutter", 2, "06:00", "14:00"),
        ("Crystal", "Cleanup", 2, "14:00", "22:00"),
        ("David", "Meat Cutter", 3, "07:00", "15:30"),
        ("Roland", "Meat Cutter", 3, "12:00", "20:30"),
        ("Jamey", "Meat Cutter", 4, "06:00", "14:30"),
        ("Taylor", "Trainee", 4, "09:00", "13:00"),
        ("Shane", "Manager", 5, "06:00", "14:30"),
        ("Crystal", "Cleanup", 6, "22:00", "06:00"),
        ("Randy", "Meat Cutter", 8, "06:00", "14:00"),
        ("James", "Assistant Manager", 9, "10:00", "18:30"),
    ];

    ROTA.iter()
        .enumerate()
        .map(|(index, (employee, position, offset, start, end))| Shift {
            id: format!("shift-{}", index + 1),
            employee: employee.to_string(),
            date: anchor + Duration::days(*offset),
            start_time: start.to_string(),
            end_time: end.to_string(),
            hours: shift_hours(start, end).unwrap_or_default(),
            department: MEAT_MARKET.to_string(),
            position: Some(position.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 19).unwrap()
    }

    fn draft(employee: &str, start: &str, end: &str) -> ShiftDraft {
        ShiftDraft {
            employee: employee.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 21).unwrap(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            department: "Deli".to_string(),
            position: None,
        }
    }

    #[test]
    fn missing_cache_falls_back_to_seed() {
        let store = LocalStore::in_memory();
        let cache = ScheduleCache::load(&store, anchor());
        assert_eq!(cache.shifts(), seed_shifts(anchor()).as_slice());
    }

    #[test]
    fn corrupt_cache_falls_back_to_seed() {
        let mut store = LocalStore::in_memory();
        store.set(keys::SHIFT_SCHEDULE, "[{\"id\":").unwrap();
        let cache = ScheduleCache::load(&store, anchor());
        assert_eq!(cache.shifts().len(), seed_shifts(anchor()).len());
    }

    #[test]
    fn mutations_round_trip_through_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let mut store = LocalStore::open(&path);
        let mut cache = ScheduleCache::load(&store, anchor());

        let created = cache.create(&mut store, draft("John Doe", "9:00", "17:30")).unwrap();
        assert_eq!(created.hours, 8.5);
        assert_eq!(created.start_time, "09:00");
        cache
            .update(&mut store, "shift-2", draft("Charlie Brown", "08:00", "12:00"))
            .unwrap();
        cache.delete(&mut store, "shift-3").unwrap();

        let reopened = LocalStore::open(&path);
        let reloaded = ScheduleCache::load(&reopened, anchor());
        assert_eq!(reloaded.shifts(), cache.shifts());
        assert_eq!(reloaded.shifts()[1].employee, "Charlie Brown");
        assert_eq!(reloaded.shifts().last().unwrap().id, created.id);
    }

    #[test]
    fn failed_writes_leave_the_schedule_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::open(dir.path().join("missing").join("store.json"));
        let mut cache = ScheduleCache::load(&store, anchor());
        let before = cache.shifts().to_vec();

        let err = cache
            .create(&mut store, draft("John Doe", "09:00", "17:00"))
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Storage(_)));
        assert!(cache.delete(&mut store, "shift-1").is_err());
        assert!(
            cache
                .update(&mut store, "shift-2", draft("Charlie Brown", "08:00", "12:00"))
                .is_err()
        );
        assert!(cache.reset(&mut store).is_err());

        assert_eq!(cache.shifts(), before.as_slice());
        assert!(store.get(keys::SHIFT_SCHEDULE).is_none());
    }

    #[test]
    fn reset_restores_seed_after_any_history() {
        let mut store = LocalStore::in_memory();
        let mut cache = ScheduleCache::load(&store, anchor());
        cache.create(&mut store, draft("John Doe", "09:00", "17:00")).unwrap();
        cache.delete(&mut store, "shift-1").unwrap();
        cache.reset(&mut store).unwrap();
        assert_eq!(cache.shifts(), seed_shifts(anchor()).as_slice());

        let reloaded = ScheduleCache::load(&store, anchor());
        assert_eq!(reloaded.shifts(), seed_shifts(anchor()).as_slice());
    }

    #[test]
    fn validation_rejects_incomplete_drafts() {
        let mut store = LocalStore::in_memory();
        let mut cache = ScheduleCache::load(&store, anchor());

        let err = cache.create(&mut store, draft("  ", "09:00", "17:00")).unwrap_err();
        assert!(matches!(err, ScheduleError::Invalid(_)));

        let mut meat = draft("Randy", "09:00", "17:00");
        meat.department = MEAT_MARKET.to_string();
        assert!(matches!(
            cache.create(&mut store, meat).unwrap_err(),
            ScheduleError::Invalid(_)
        ));

        let err = cache.create(&mut store, draft("Randy", "25:00", "17:00")).unwrap_err();
        assert!(matches!(err, ScheduleError::Time(_)));
        assert_eq!(cache.shifts().len(), seed_shifts(anchor()).len());
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let mut store = LocalStore::in_memory();
        let mut cache = ScheduleCache::load(&store, anchor());
        assert!(matches!(
            cache.delete(&mut store, "nope").unwrap_err(),
            ScheduleError::NotFound(_)
        ));
    }

    #[test]
    fn overnight_seed_shift_wraps() {
        let seed = seed_shifts(anchor());
        let overnight = seed.iter().find(|shift| shift.start_time == "22:00").unwrap();
        assert_eq!(overnight.hours, 8.0);
    }

    #[test]
    fn date_filters_use_calendar_days() {
        let store = LocalStore::in_memory();
        let cache = ScheduleCache::load(&store, anchor());
        let monday = anchor() + Duration::days(1);
        assert_eq!(cache.on_date(monday).len(), 2);
        assert_eq!(cache.between(anchor(), anchor() + Duration::days(6)).len(), 10);
    }
}
