use axum::{extract::{Path, Query, State}, response::IntoResponse, Json};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::api::dtos::requests::{ChargeCompleteRequest, CreateBookingRequest, CustomerPayload, UpdateBookingRequest};
use crate::api::dtos::responses::CompleteBookingResponse;
use crate::api::handlers::calendar::parse_date;
use crate::domain::models::booking::{Booking, BookingStatus, CustomerInfo, NewBookingParams};
use crate::domain::ports::BookingFilter;
use crate::domain::services::billing::final_balance_cents;
use crate::domain::services::reconcile::reconcile_day;
use crate::domain::services::slots::{default_day, format_display};
use crate::error::AppError;
use crate::state::AppState;

// Upper bounds on client-supplied money and hours. Generous for a
// landscaping job, small enough that the balance arithmetic stays far from
// integer range.
const MAX_MONEY_CENTS: i64 = 100_000_000; // one million dollars
const MAX_HOURS_WORKED: f64 = 10_000.0;

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("{} is required", field)))
}

fn customer_from_payload(payload: CustomerPayload) -> Result<CustomerInfo, AppError> {
    Ok(CustomerInfo {
        name: required(payload.name, "customer.name")?,
        email: required(payload.email, "customer.email")?,
        phone: required(payload.phone, "customer.phone")?,
        address: required(payload.address, "customer.address")?,
    })
}

fn validate_time_slot(raw: &str) -> Result<(), AppError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .map(|_| ())
        .map_err(|_| AppError::Validation(format!("Invalid time slot '{}' (expected HH:MM)", raw)))
}

/// Rewrite one day's slot occupancy from its active bookings and persist
/// the result. Called after every booking mutation so the calendar never
/// drifts from the booking table; also how a dangling claim gets released
/// when a create or move fails halfway.
async fn sync_calendar_day(state: &AppState, date: NaiveDate) -> Result<(), AppError> {
    let bookings = state.booking_repo.list_active_by_date(date).await?;
    let day = state.calendar_repo.get(date).await?.unwrap_or_else(|| default_day(date));
    let day = reconcile_day(day, &bookings);
    state.calendar_repo.replace(&day).await?;
    Ok(())
}

async fn release_claim(state: &AppState, date: NaiveDate) {
    if let Err(e) = sync_calendar_day(state, date).await {
        error!("Failed to release slot claim for {}: {}", date, e);
    }
}

fn confirmation_email(booking: &Booking) -> (String, String) {
    let subject = format!("Booking received for {}", booking.service.date);
    let body = format!(
        "<p>Hi {},</p>\
         <p>We received your booking for <strong>{}</strong> at <strong>{}</strong> \
         ({}-person crew at ${:.2}/hr).</p>\
         <p>We will be in touch to confirm. Reply to this email with any questions.</p>",
        booking.customer.name,
        booking.service.date,
        format_display(&booking.service.time_slot),
        booking.service.crew_size,
        booking.service.hourly_rate_cents as f64 / 100.0,
    );
    (subject, body)
}

fn review_email(frontend_url: &str, booking: &Booking) -> (String, String) {
    let subject = "How did we do?".to_string();
    let body = format!(
        "<p>Hi {},</p>\
         <p>Thanks for having us out on {}. If you have a minute, we would \
         love to hear how it went:</p>\
         <p><a href=\"{}/review\">Leave a quick review</a></p>",
        booking.customer.name, booking.service.date, frontend_url,
    );
    (subject, body)
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let customer = customer_from_payload(
        payload.customer.ok_or(AppError::Validation("customer is required".into()))?,
    )?;
    let service = payload.service.ok_or(AppError::Validation("service is required".into()))?;

    let date = parse_date(&required(service.date, "service.date")?)?;
    let time_slot = required(service.time_slot, "service.timeSlot")?;
    validate_time_slot(&time_slot)?;
    let crew_size = service
        .crew_size
        .ok_or(AppError::Validation("service.crewSize is required".into()))?;

    // Snapshot the rate now; later rate edits must not reprice this job.
    let rates = state.rates_repo.get().await?;
    let hourly_rate_cents = rates
        .rate_for(crew_size)
        .ok_or(AppError::Validation("crewSize must be 2, 3 or 4".into()))?;

    let (deposit_cents, payment_token) = match payload.payment {
        Some(p) => (p.deposit_cents.unwrap_or(0), p.token),
        None => (0, None),
    };
    if deposit_cents < 0 {
        return Err(AppError::Validation("depositCents cannot be negative".into()));
    }
    if deposit_cents > MAX_MONEY_CENTS {
        return Err(AppError::Validation(format!("depositCents cannot exceed {}", MAX_MONEY_CENTS)));
    }

    let mut booking = Booking::new(NewBookingParams {
        id: payload.booking_id,
        customer,
        date,
        time_slot: time_slot.clone(),
        crew_size,
        hourly_rate_cents,
        services: service.services.unwrap_or_default(),
        notes: service.notes,
        deposit_cents,
    });

    info!("create_booking: claiming {} on {} for {}", time_slot, date, booking.id);
    state.calendar_repo.claim_slot(date, &time_slot, &booking.id).await?;

    if let Some(token) = payment_token.as_deref() {
        if state.payment_service.is_enabled() && deposit_cents > 0 {
            match state
                .payment_service
                .charge(token, deposit_cents, &format!("Deposit for booking {}", booking.id))
                .await
            {
                Ok(receipt) => {
                    booking.payment.deposit_paid = true;
                    info!(
                        "Deposit of {} cents captured for booking {} (payment {})",
                        deposit_cents, booking.id, receipt.payment_id
                    );
                }
                Err(e) => {
                    release_claim(&state, date).await;
                    return Err(e);
                }
            }
        } else if !state.payment_service.is_enabled() {
            warn!("Payment token supplied but payments are disabled; booking {} proceeds unpaid", booking.id);
        }
    }

    let created = match state.booking_repo.create(&booking).await {
        Ok(b) => b,
        Err(e) => {
            release_claim(&state, date).await;
            return Err(e);
        }
    };

    sync_calendar_day(&state, date).await?;

    // Best effort: a failed email must never lose the booking.
    let (subject, body) = confirmation_email(&created);
    if let Err(e) = state.email_service.send(&created.customer.email, &subject, &body).await {
        warn!("Confirmation email for booking {} failed: {}", created.id, e);
    }

    info!("Booking created: {} for {} at {}", created.id, date, time_slot);
    Ok(Json(created))
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let date = match params.get("date") {
        Some(raw) => Some(parse_date(raw)?),
        None => None,
    };
    let status = match params.get("status") {
        Some(raw) => Some(
            BookingStatus::parse(raw)
                .ok_or_else(|| AppError::Validation(format!("Unknown status '{}'", raw)))?,
        ),
        None => None,
    };
    let email = params.get("email").cloned();

    let bookings = state.booking_repo.list(&BookingFilter { date, status, email }).await?;
    Ok(Json(bookings))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state
        .booking_repo
        .find_by_id(&booking_id)
        .await?
        .ok_or(AppError::NotFound("Booking not found".into()))?;
    Ok(Json(booking))
}

pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
    Json(payload): Json<UpdateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut booking = state
        .booking_repo
        .find_by_id(&booking_id)
        .await?
        .ok_or(AppError::NotFound("Booking not found".into()))?;

    let old_date = booking.service.date;
    let old_slot = booking.service.time_slot.clone();

    if let Some(customer) = payload.customer {
        booking.customer = customer_from_payload(customer)?;
    }

    let mut slot_moved = false;
    if let Some(service) = payload.service {
        let date = parse_date(&required(service.date, "service.date")?)?;
        let time_slot = required(service.time_slot, "service.timeSlot")?;
        validate_time_slot(&time_slot)?;
        let crew_size = service
            .crew_size
            .ok_or(AppError::Validation("service.crewSize is required".into()))?;
        if !matches!(crew_size, 2 | 3 | 4) {
            return Err(AppError::Validation("crewSize must be 2, 3 or 4".into()));
        }

        slot_moved = date != old_date || time_slot != old_slot;
        booking.service.date = date;
        booking.service.time_slot = time_slot;
        booking.service.crew_size = crew_size;
        booking.service.services = service.services.unwrap_or_default();
        booking.service.notes = service.notes;
        // hourly_rate_cents intentionally untouched
    }

    if let Some(raw) = payload.status {
        let next = BookingStatus::parse(&raw)
            .ok_or_else(|| AppError::Validation(format!("Unknown status '{}'", raw)))?;
        if next != booking.status {
            if !booking.status.can_transition(next) {
                return Err(AppError::Conflict(format!(
                    "Cannot change status from {} to {}",
                    booking.status.as_str(),
                    next.as_str()
                )));
            }
            booking.push_status(next, payload.status_note);
        }
    }

    // Grab the new slot before writing anything, so a taken slot rejects
    // the whole update with nothing changed.
    if slot_moved {
        state
            .calendar_repo
            .claim_slot(booking.service.date, &booking.service.time_slot, &booking.id)
            .await?;
    }

    booking.updated_at = Utc::now();
    let updated = match state.booking_repo.update(&booking).await {
        Ok(b) => b,
        Err(e) => {
            if slot_moved {
                release_claim(&state, booking.service.date).await;
            }
            return Err(e);
        }
    };

    sync_calendar_day(&state, updated.service.date).await?;
    if updated.service.date != old_date {
        sync_calendar_day(&state, old_date).await?;
    }

    info!("Booking updated: {}", updated.id);
    Ok(Json(updated))
}

pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state
        .booking_repo
        .find_by_id(&booking_id)
        .await?
        .ok_or(AppError::NotFound("Booking not found".into()))?;

    state.booking_repo.delete(&booking_id).await?;
    sync_calendar_day(&state, booking.service.date).await?;

    info!("Booking deleted: {}", booking_id);
    Ok(Json(json!({ "status": "deleted" })))
}

/// Final billing at job completion: compute the balance, charge it when a
/// token is supplied, fire the review email, then remove the booking and
/// free its slot. A declined charge aborts before anything is deleted; a
/// failed email does not.
pub async fn complete_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
    Json(payload): Json<ChargeCompleteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state
        .booking_repo
        .find_by_id(&booking_id)
        .await?
        .ok_or(AppError::NotFound("Booking not found".into()))?;

    let hours_worked = payload
        .hours_worked
        .ok_or(AppError::Validation("hoursWorked is required".into()))?;
    if !hours_worked.is_finite() || hours_worked < 0.0 {
        return Err(AppError::Validation("hoursWorked must be a non-negative number".into()));
    }
    if hours_worked > MAX_HOURS_WORKED {
        return Err(AppError::Validation(format!("hoursWorked cannot exceed {}", MAX_HOURS_WORKED)));
    }
    let materials_cents = payload.materials_cents.unwrap_or(0);
    if materials_cents < 0 {
        return Err(AppError::Validation("materialsCents cannot be negative".into()));
    }
    if materials_cents > MAX_MONEY_CENTS {
        return Err(AppError::Validation(format!("materialsCents cannot exceed {}", MAX_MONEY_CENTS)));
    }

    let deposit_credit = if booking.payment.deposit_paid {
        booking.payment.deposit_cents
    } else {
        0
    };
    let final_amount_cents = final_balance_cents(
        hours_worked,
        booking.service.hourly_rate_cents,
        materials_cents,
        deposit_credit,
    );

    let mut charged = false;
    if let Some(token) = payload.payment_token.as_deref() {
        if state.payment_service.is_enabled() && final_amount_cents > 0 {
            let receipt = state
                .payment_service
                .charge(token, final_amount_cents, &format!("Final balance for booking {}", booking.id))
                .await?;
            charged = true;
            info!(
                "Final balance of {} cents captured for booking {} (payment {})",
                final_amount_cents, booking.id, receipt.payment_id
            );
        } else if !state.payment_service.is_enabled() {
            warn!("Payment token supplied but payments are disabled; completing {} without charging", booking.id);
        }
    }

    let (subject, body) = review_email(&state.config.frontend_url, &booking);
    if let Err(e) = state.email_service.send(&booking.customer.email, &subject, &body).await {
        warn!("Review email for booking {} failed: {}", booking.id, e);
    }

    state.booking_repo.delete(&booking.id).await?;
    sync_calendar_day(&state, booking.service.date).await?;

    info!(
        "Booking completed: {} (final balance {} cents, charged: {})",
        booking.id, final_amount_cents, charged
    );
    Ok(Json(CompleteBookingResponse {
        booking_id: booking.id,
        final_amount_cents,
        charged,
        status: "completed".to_string(),
    }))
}
