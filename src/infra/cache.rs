use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use crate::domain::models::calendar_day::CalendarDay;
use crate::domain::models::rates::TeamRates;

/// In-memory stand-in for calendar days while the database is unreachable.
///
/// Entries written during an outage are flagged dirty and flushed back to
/// durable storage once it recovers; entries read from durable storage are
/// never kept here, so the database stays the source of truth in normal
/// operation. Everything expires after `ttl` so a long outage cannot serve
/// arbitrarily old state.
pub struct DayCache {
    ttl: Duration,
    entries: Mutex<HashMap<NaiveDate, DayEntry>>,
}

struct DayEntry {
    day: CalendarDay,
    stored_at: Instant,
    dirty: bool,
}

impl DayEntry {
    fn expired(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() > ttl
    }
}

impl DayCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, date: NaiveDate) -> Option<CalendarDay> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(&date) {
            Some(entry) if !entry.expired(self.ttl) => Some(entry.day.clone()),
            Some(_) => {
                entries.remove(&date);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, day: CalendarDay, dirty: bool) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            day.date,
            DayEntry {
                day,
                stored_at: Instant::now(),
                dirty,
            },
        );
    }

    pub fn remove(&self, date: NaiveDate) {
        self.entries.lock().unwrap().remove(&date);
    }

    /// Drop the cached copy unless it still holds an unflushed write.
    pub fn remove_clean(&self, date: NaiveDate) {
        let mut entries = self.entries.lock().unwrap();
        if entries.get(&date).is_some_and(|e| !e.dirty) {
            entries.remove(&date);
        }
    }

    pub fn remove_before(&self, date: NaiveDate) -> u64 {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|d, _| *d >= date);
        (before - entries.len()) as u64
    }

    pub fn has_dirty(&self) -> bool {
        let entries = self.entries.lock().unwrap();
        entries.values().any(|e| e.dirty && !e.expired(self.ttl))
    }

    /// Snapshot of entries still waiting to be flushed, oldest date first.
    pub fn dirty_entries(&self) -> Vec<CalendarDay> {
        let entries = self.entries.lock().unwrap();
        let mut days: Vec<CalendarDay> = entries
            .values()
            .filter(|e| e.dirty && !e.expired(self.ttl))
            .map(|e| e.day.clone())
            .collect();
        days.sort_by_key(|d| d.date);
        days
    }

    pub fn mark_clean(&self, date: NaiveDate) {
        if let Some(entry) = self.entries.lock().unwrap().get_mut(&date) {
            entry.dirty = false;
        }
    }

    pub fn fresh_days(&self) -> Vec<CalendarDay> {
        let entries = self.entries.lock().unwrap();
        let mut days: Vec<CalendarDay> = entries
            .values()
            .filter(|e| !e.expired(self.ttl))
            .map(|e| e.day.clone())
            .collect();
        days.sort_by_key(|d| d.date);
        days
    }

    /// Claim a slot against the cached copy, creating the day from
    /// `default` when nothing is cached. Runs under the cache lock, so two
    /// in-process claims for the same slot cannot both succeed even while
    /// the database is down.
    pub fn claim_slot(
        &self,
        date: NaiveDate,
        time: &str,
        booking_id: &str,
        default: impl FnOnce() -> CalendarDay,
    ) -> Result<CalendarDay, crate::error::AppError> {
        use crate::error::AppError;

        let mut entries = self.entries.lock().unwrap();
        if entries.get(&date).is_some_and(|e| e.expired(self.ttl)) {
            entries.remove(&date);
        }
        let entry = entries.entry(date).or_insert_with(|| DayEntry {
            day: default(),
            stored_at: Instant::now(),
            dirty: true,
        });

        let slot = entry
            .day
            .time_slots
            .iter_mut()
            .find(|s| s.time == time)
            .ok_or_else(|| AppError::Conflict(format!("No {} slot exists on {}", time, date)))?;

        if !slot.is_available && slot.booking_id.as_deref() != Some(booking_id) {
            return Err(AppError::Conflict(format!("Slot {} on {} is already booked", time, date)));
        }

        slot.is_available = false;
        slot.booking_id = Some(booking_id.to_string());
        entry.day.updated_at = chrono::Utc::now();
        entry.stored_at = Instant::now();
        entry.dirty = true;

        Ok(entry.day.clone())
    }
}

/// Single-document counterpart of [`DayCache`] for the team rates.
pub struct RatesCache {
    ttl: Duration,
    entry: Mutex<Option<RatesEntry>>,
}

struct RatesEntry {
    rates: TeamRates,
    stored_at: Instant,
    dirty: bool,
}

impl RatesCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: Mutex::new(None),
        }
    }

    pub fn get(&self) -> Option<TeamRates> {
        let mut entry = self.entry.lock().unwrap();
        match entry.as_ref() {
            Some(e) if e.stored_at.elapsed() <= self.ttl => Some(e.rates.clone()),
            Some(_) => {
                *entry = None;
                None
            }
            None => None,
        }
    }

    pub fn put(&self, rates: TeamRates, dirty: bool) {
        *self.entry.lock().unwrap() = Some(RatesEntry {
            rates,
            stored_at: Instant::now(),
            dirty,
        });
    }

    pub fn clear(&self) {
        *self.entry.lock().unwrap() = None;
    }

    /// Drop the cached copy unless it still holds an unflushed write.
    pub fn clear_clean(&self) {
        let mut entry = self.entry.lock().unwrap();
        if entry.as_ref().is_some_and(|e| !e.dirty) {
            *entry = None;
        }
    }

    pub fn dirty_rates(&self) -> Option<TeamRates> {
        let entry = self.entry.lock().unwrap();
        entry
            .as_ref()
            .filter(|e| e.dirty && e.stored_at.elapsed() <= self.ttl)
            .map(|e| e.rates.clone())
    }

    pub fn mark_clean(&self) {
        if let Some(entry) = self.entry.lock().unwrap().as_mut() {
            entry.dirty = false;
        }
    }
}
