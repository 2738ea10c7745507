use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::responses::{CalendarCleanupResponse, PastCleanupResponse};
use crate::error::AppError;
use crate::state::AppState;

// "Past" is strictly before today in UTC; today's rows always survive.

pub async fn purge_past_dates(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let today = Utc::now().date_naive();

    let deleted_bookings = state.booking_repo.delete_before(today).await?;
    let deleted_days = state.calendar_repo.delete_before(today).await?;

    info!(
        "Cleanup removed {} past bookings and {} past calendar days",
        deleted_bookings, deleted_days
    );
    Ok(Json(PastCleanupResponse {
        deleted_bookings,
        deleted_days,
    }))
}

pub async fn purge_past_calendar_only(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let today = Utc::now().date_naive();

    let deleted_days = state.calendar_repo.delete_before(today).await?;

    info!("Cleanup removed {} past calendar days (bookings kept)", deleted_days);
    Ok(Json(CalendarCleanupResponse { deleted_days }))
}
