use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::models::calendar_day::TimeSlot;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAvailability {
    pub max_bookings: usize,
    pub current_bookings: usize,
    pub is_available: bool,
    pub time_slots: Vec<TimeSlot>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateAvailabilityResponse {
    pub date: NaiveDate,
    /// Active booking count for the day; distinct from `current_bookings`,
    /// which counts occupied slots after reconciliation.
    pub bookings: usize,
    pub availability: DayAvailability,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlotsResponse {
    pub date: NaiveDate,
    pub time_slots: Vec<TimeSlot>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteBookingResponse {
    pub booking_id: String,
    pub final_amount_cents: i64,
    pub charged: bool,
    pub status: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PastCleanupResponse {
    pub deleted_bookings: u64,
    pub deleted_days: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarCleanupResponse {
    pub deleted_days: u64,
}
