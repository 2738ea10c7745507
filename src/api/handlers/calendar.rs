use axum::{extract::{Query, State}, response::IntoResponse, Json};
use chrono::{NaiveDate, NaiveTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::requests::{MarkSlotBookedRequest, ReplaceTimeSlotsRequest};
use crate::api::dtos::responses::{DateAvailabilityResponse, DayAvailability, TimeSlotsResponse};
use crate::domain::models::booking::Booking;
use crate::domain::models::calendar_day::{CalendarDay, TimeSlot};
use crate::domain::services::reconcile::reconcile;
use crate::domain::services::slots::{default_day, format_display, has_any_available, sort_by_time};
use crate::error::AppError;
use crate::state::AppState;

pub fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Invalid date format (expected YYYY-MM-DD)".into()))
}

fn validate_slot_time(raw: &str) -> Result<(), AppError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .map(|_| ())
        .map_err(|_| AppError::Validation(format!("Invalid slot time '{}' (expected HH:MM)", raw)))
}

/// Availability entry for one day, computed from the stored slot list (or
/// the defaults) and the day's active bookings. Read-only: nothing is
/// written back here, so a GET can never mutate the calendar.
fn availability_entry(day: CalendarDay, bookings: &[Booking]) -> DateAvailabilityResponse {
    let slots = reconcile(day.time_slots, bookings);
    let occupied = slots.iter().filter(|s| !s.is_available).count();

    DateAvailabilityResponse {
        date: day.date,
        bookings: bookings.len(),
        availability: DayAvailability {
            max_bookings: slots.len(),
            current_bookings: occupied,
            is_available: has_any_available(&slots),
            time_slots: slots,
        },
    }
}

pub async fn get_calendar_availability(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(raw) = params.get("date") {
        let date = parse_date(raw)?;
        let day = state.calendar_repo.get(date).await?.unwrap_or_else(|| default_day(date));
        let bookings = state.booking_repo.list_active_by_date(date).await?;
        return Ok(Json(vec![availability_entry(day, &bookings)]));
    }

    // Union of stored days and dates that only exist on bookings, so a day
    // booked before it was ever edited still shows up.
    let mut days: BTreeMap<NaiveDate, CalendarDay> = state
        .calendar_repo
        .list()
        .await?
        .into_iter()
        .map(|d| (d.date, d))
        .collect();
    for date in state.booking_repo.list_dates().await? {
        days.entry(date).or_insert_with(|| default_day(date));
    }

    let mut entries = Vec::with_capacity(days.len());
    for (date, day) in days {
        let bookings = state.booking_repo.list_active_by_date(date).await?;
        entries.push(availability_entry(day, &bookings));
    }

    Ok(Json(entries))
}

pub async fn replace_time_slots(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ReplaceTimeSlotsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let date = parse_date(&payload.date.ok_or(AppError::Validation("date is required".into()))?)?;
    let incoming = payload
        .time_slots
        .ok_or(AppError::Validation("timeSlots is required".into()))?;

    let mut seen = HashSet::new();
    let mut slots = Vec::with_capacity(incoming.len());
    for slot in incoming {
        let time = slot.time.ok_or(AppError::Validation("every slot needs a time".into()))?;
        validate_slot_time(&time)?;
        if !seen.insert(time.clone()) {
            return Err(AppError::Validation(format!("Duplicate slot time '{}'", time)));
        }

        let display_time = slot.display_time.unwrap_or_else(|| format_display(&time));
        slots.push(TimeSlot {
            time,
            display_time,
            is_available: slot.is_available.unwrap_or(true),
            booking_id: slot.booking_id,
        });
    }

    let previous = state.calendar_repo.get(date).await?;

    // Carry forward what the caller did not restate: day-level rules, and
    // booking references for slot times that survived the edit.
    let business_rules = payload
        .business_rules
        .or_else(|| previous.as_ref().map(|p| p.business_rules.clone()))
        .unwrap_or_default();
    if let Some(prev) = &previous {
        for slot in &mut slots {
            if slot.booking_id.is_none()
                && let Some(old) = prev.time_slots.iter().find(|s| s.time == slot.time)
                && let Some(id) = &old.booking_id
            {
                slot.booking_id = Some(id.clone());
                slot.is_available = false;
            }
        }
    }

    let day = CalendarDay {
        date,
        time_slots: sort_by_time(slots),
        business_rules,
        updated_at: Utc::now(),
    };
    let saved = state.calendar_repo.replace(&day).await?;

    info!("Replaced time slots for {}: {} slots", date, saved.time_slots.len());
    Ok(Json(TimeSlotsResponse {
        date,
        time_slots: saved.time_slots,
    }))
}

pub async fn mark_slot_booked(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<MarkSlotBookedRequest>,
) -> Result<impl IntoResponse, AppError> {
    let date = parse_date(&payload.date.ok_or(AppError::Validation("date is required".into()))?)?;
    let time_slot = payload
        .time_slot
        .ok_or(AppError::Validation("timeSlot is required".into()))?;
    let booking_id = payload
        .booking_id
        .ok_or(AppError::Validation("bookingId is required".into()))?;

    let day = state.calendar_repo.claim_slot(date, &time_slot, &booking_id).await?;

    info!("Marked slot {} on {} as booked by {}", time_slot, date, booking_id);
    Ok(Json(day))
}
