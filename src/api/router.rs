use axum::{
    body::Body,
    extract::Request,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{booking, calendar, cleanup, health, rates};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Calendar
        .route("/api/calendar-availability", get(calendar::get_calendar_availability))
        .route("/api/calendar-time-slots", put(calendar::replace_time_slots))
        .route("/api/calendar-mark-slot-booked", put(calendar::mark_slot_booked))

        // Bookings
        .route("/api/bookings", get(booking::list_bookings).post(booking::create_booking))
        .route("/api/bookings/{booking_id}", get(booking::get_booking).put(booking::update_booking).delete(booking::delete_booking))
        .route("/api/bookings/{booking_id}/complete", post(booking::complete_booking))

        // Rates
        .route("/api/team-rates", get(rates::get_team_rates).put(rates::update_team_rates))

        // Maintenance
        .route("/api/cleanup/past-dates", delete(cleanup::purge_past_dates))
        .route("/api/cleanup/past-calendar-only", delete(cleanup::purge_past_calendar_only))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
