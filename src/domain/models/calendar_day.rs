use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One bookable window on a given day. `time` is the canonical 24h "HH:MM"
/// key; `display_time` is the human label shown by the frontend ("9AM").
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub time: String,
    pub display_time: String,
    pub is_available: bool,
    pub booking_id: Option<String>,
}

/// Advisory day-level flags set by the admin. These are stored and echoed
/// back but never enforced by the booking flow.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessRules {
    pub is_day_off: bool,
    pub is_blocked: bool,
    pub block_reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub time_slots: Vec<TimeSlot>,
    pub business_rules: BusinessRules,
    pub updated_at: DateTime<Utc>,
}
