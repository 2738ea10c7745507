use chrono::{NaiveDate, Utc};

use crate::domain::models::calendar_day::{BusinessRules, CalendarDay, TimeSlot};

/// Canonical daily slot times, 24h "HH:MM". The crew runs three windows a
/// day regardless of weekday or season; seasonal tuning is done by editing
/// individual days through the calendar API, not here.
pub const DEFAULT_SLOT_TIMES: [&str; 3] = ["09:00", "13:00", "15:00"];

pub fn default_time_slots() -> Vec<TimeSlot> {
    DEFAULT_SLOT_TIMES
        .iter()
        .map(|time| TimeSlot {
            time: time.to_string(),
            display_time: format_display(time),
            is_available: true,
            booking_id: None,
        })
        .collect()
}

/// A fresh day with the default slot set and no business rules. Used for any
/// date that has never been stored.
pub fn default_day(date: NaiveDate) -> CalendarDay {
    CalendarDay {
        date,
        time_slots: default_time_slots(),
        business_rules: BusinessRules::default(),
        updated_at: Utc::now(),
    }
}

/// Sort ascending by the 24h time key. Zero-padded "HH:MM" strings order
/// correctly under plain string comparison.
pub fn sort_by_time(mut slots: Vec<TimeSlot>) -> Vec<TimeSlot> {
    slots.sort_by(|a, b| a.time.cmp(&b.time));
    slots
}

pub fn available_only(slots: &[TimeSlot]) -> Vec<TimeSlot> {
    sort_by_time(slots.iter().filter(|s| s.is_available).cloned().collect())
}

pub fn has_any_available(slots: &[TimeSlot]) -> bool {
    slots.iter().any(|s| s.is_available)
}

/// "HH:MM" to a short 12h label: "09:00" -> "9AM", "13:00" -> "1PM".
/// Minutes are dropped. Anything that does not parse as an hour is returned
/// unchanged, so the function is stable when applied twice.
pub fn format_display(time: &str) -> String {
    let Some((hour_str, _minutes)) = time.split_once(':') else {
        return time.to_string();
    };
    let Ok(hour) = hour_str.parse::<u32>() else {
        return time.to_string();
    };
    if hour > 23 {
        return time.to_string();
    }

    match hour {
        0 => "12AM".to_string(),
        h if h < 12 => format!("{}AM", h),
        12 => "12PM".to_string(),
        h => format!("{}PM", h - 12),
    }
}
