mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::NaiveDate;
use common::TestApp;
use serde_json::{json, Value};
use tower::ServiceExt;

use yardbook_backend::domain::models::booking::{Booking, CustomerInfo, NewBookingParams};
use yardbook_backend::error::AppError;

async fn parse_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn booking_payload(date: &str, time: &str, email: &str) -> Value {
    json!({
        "customer": {
            "name": "Avery Brooks",
            "email": email,
            "phone": "555-0142",
            "address": "88 Maple Ave"
        },
        "service": {
            "date": date,
            "timeSlot": time,
            "crewSize": 2,
            "services": ["mowing", "edging"],
            "notes": "gate code 4411"
        }
    })
}

async fn post_booking(app: &TestApp, payload: Value) -> axum::response::Response {
    app.router.clone().oneshot(
        Request::builder().method("POST").uri("/api/bookings")
            .header("Content-Type", "application/json")
            .body(Body::from(payload.to_string())).unwrap()
    ).await.unwrap()
}

async fn day_slots(app: &TestApp, date: &str) -> Vec<Value> {
    let res = app.router.clone().oneshot(
        Request::builder().method("GET")
            .uri(format!("/api/calendar-availability?date={}", date))
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    parse_body(res).await[0]["availability"]["timeSlots"].as_array().unwrap().clone()
}

fn slot<'a>(slots: &'a [Value], time: &str) -> &'a Value {
    slots.iter().find(|s| s["time"] == time).unwrap()
}

#[tokio::test]
async fn create_returns_pending_booking_and_occupies_the_slot() {
    let app = TestApp::new().await;

    let res = post_booking(&app, booking_payload("2030-06-10", "09:00", "avery@example.com")).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = parse_body(res).await;
    let id = body["bookingId"].as_str().unwrap();
    assert!(!id.is_empty());
    assert_eq!(body["status"], "pending");
    assert_eq!(body["statusHistory"].as_array().unwrap().len(), 1);
    assert_eq!(body["service"]["hourlyRateCents"], 8500);
    assert_eq!(body["service"]["notes"], "gate code 4411");
    assert_eq!(body["payment"]["depositCents"], 0);
    assert_eq!(body["payment"]["depositPaid"], false);

    let slots = day_slots(&app, "2030-06-10").await;
    assert_eq!(slot(&slots, "09:00")["isAvailable"], false);
    assert_eq!(slot(&slots, "09:00")["bookingId"], id);
    assert_eq!(slot(&slots, "13:00")["isAvailable"], true);

    let emails = app.emails.lock().unwrap();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].to, "avery@example.com");
    assert_eq!(emails[0].subject, "Booking received for 2030-06-10");
}

#[tokio::test]
async fn second_booking_for_the_same_slot_conflicts() {
    let app = TestApp::new().await;

    let res = post_booking(&app, booking_payload("2030-06-10", "09:00", "first@example.com")).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = post_booking(&app, booking_payload("2030-06-10", "09:00", "second@example.com")).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(
        parse_body(res).await["error"],
        "Slot 09:00 on 2030-06-10 is already booked"
    );

    // A different slot on the same day is fine.
    let res = post_booking(&app, booking_payload("2030-06-10", "15:00", "second@example.com")).await;
    assert_eq!(res.status(), StatusCode::OK);

    let slots = day_slots(&app, "2030-06-10").await;
    assert_eq!(slot(&slots, "09:00")["isAvailable"], false);
    assert_eq!(slot(&slots, "13:00")["isAvailable"], true);
    assert_eq!(slot(&slots, "15:00")["isAvailable"], false);
}

#[tokio::test]
async fn create_rejects_missing_required_fields() {
    let app = TestApp::new().await;

    let res = post_booking(&app, json!({
        "service": {"date": "2030-06-10", "timeSlot": "09:00", "crewSize": 2}
    })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_body(res).await["error"], "customer is required");

    let mut payload = booking_payload("2030-06-10", "09:00", "a@example.com");
    payload["customer"]["email"] = Value::Null;
    let res = post_booking(&app, payload).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_body(res).await["error"], "customer.email is required");

    let mut payload = booking_payload("2030-06-10", "09:00", "a@example.com");
    payload["service"].as_object_mut().unwrap().remove("timeSlot");
    let res = post_booking(&app, payload).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_body(res).await["error"], "service.timeSlot is required");

    let mut payload = booking_payload("2030-06-10", "09:00", "a@example.com");
    payload["service"].as_object_mut().unwrap().remove("date");
    let res = post_booking(&app, payload).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Nothing was written along the way.
    let slots = day_slots(&app, "2030-06-10").await;
    assert!(slots.iter().all(|s| s["isAvailable"] == true));
}

#[tokio::test]
async fn create_rejects_unsupported_crew_sizes_and_times() {
    let app = TestApp::new().await;

    let mut payload = booking_payload("2030-06-10", "09:00", "a@example.com");
    payload["service"]["crewSize"] = json!(5);
    let res = post_booking(&app, payload).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_body(res).await["error"], "crewSize must be 2, 3 or 4");

    let mut payload = booking_payload("2030-06-10", "09:00", "a@example.com");
    payload["service"].as_object_mut().unwrap().remove("crewSize");
    let res = post_booking(&app, payload).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = post_booking(&app, booking_payload("2030-06-10", "noon", "a@example.com")).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        parse_body(res).await["error"],
        "Invalid time slot 'noon' (expected HH:MM)"
    );
}

#[tokio::test]
async fn caller_supplied_id_is_honored_and_duplicates_conflict() {
    let app = TestApp::new().await;

    let mut payload = booking_payload("2030-06-10", "09:00", "sync@example.com");
    payload["bookingId"] = json!("mobile-123");
    let res = post_booking(&app, payload).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["bookingId"], "mobile-123");

    // Same id again, different slot: the insert collides and the freshly
    // claimed slot is released.
    let mut payload = booking_payload("2030-06-10", "13:00", "sync@example.com");
    payload["bookingId"] = json!("mobile-123");
    let res = post_booking(&app, payload).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(
        parse_body(res).await["error"],
        "Resource already exists (duplicate entry)"
    );

    let slots = day_slots(&app, "2030-06-10").await;
    assert_eq!(slot(&slots, "09:00")["bookingId"], "mobile-123");
    assert_eq!(slot(&slots, "13:00")["isAvailable"], true);
}

#[tokio::test]
async fn unknown_booking_ids_return_404() {
    let app = TestApp::new().await;

    let res = app.router.clone().oneshot(
        Request::builder().method("GET").uri("/api/bookings/nope")
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(parse_body(res).await["error"], "Booking not found");

    let res = app.router.clone().oneshot(
        Request::builder().method("DELETE").uri("/api/bookings/nope")
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.router.clone().oneshot(
        Request::builder().method("PUT").uri("/api/bookings/nope")
            .header("Content-Type", "application/json")
            .body(Body::from(json!({"status": "confirmed"}).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_filters_by_date_status_and_email() {
    let app = TestApp::new().await;

    let res = post_booking(&app, booking_payload("2030-06-10", "09:00", "a@example.com")).await;
    let first = parse_body(res).await["bookingId"].as_str().unwrap().to_string();
    post_booking(&app, booking_payload("2030-06-10", "13:00", "b@example.com")).await;
    post_booking(&app, booking_payload("2030-06-11", "09:00", "a@example.com")).await;

    // Move the first booking to confirmed so the status filter has a hit.
    let res = app.router.clone().oneshot(
        Request::builder().method("PUT").uri(format!("/api/bookings/{}", first))
            .header("Content-Type", "application/json")
            .body(Body::from(json!({"status": "confirmed"}).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let cases = [
        ("/api/bookings", 3),
        ("/api/bookings?date=2030-06-10", 2),
        ("/api/bookings?email=a@example.com", 2),
        ("/api/bookings?status=confirmed", 1),
        ("/api/bookings?date=2030-06-10&status=pending", 1),
    ];
    for (uri, expected) in cases {
        let res = app.router.clone().oneshot(
            Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
        ).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK, "uri {}", uri);
        let body = parse_body(res).await;
        assert_eq!(body.as_array().unwrap().len(), expected, "uri {}", uri);
    }

    // Listing is ordered by date then slot.
    let res = app.router.clone().oneshot(
        Request::builder().method("GET").uri("/api/bookings").body(Body::empty()).unwrap()
    ).await.unwrap();
    let all = parse_body(res).await;
    let times: Vec<String> = all.as_array().unwrap().iter()
        .map(|b| format!("{} {}", b["service"]["date"].as_str().unwrap(), b["service"]["timeSlot"].as_str().unwrap()))
        .collect();
    assert_eq!(times, vec!["2030-06-10 09:00", "2030-06-10 13:00", "2030-06-11 09:00"]);

    let res = app.router.clone().oneshot(
        Request::builder().method("GET").uri("/api/bookings?status=weird")
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_body(res).await["error"], "Unknown status 'weird'");
}

#[tokio::test]
async fn deleting_a_booking_frees_its_slot() {
    let app = TestApp::new().await;

    let res = post_booking(&app, booking_payload("2030-06-10", "13:00", "gone@example.com")).await;
    let id = parse_body(res).await["bookingId"].as_str().unwrap().to_string();

    let res = app.router.clone().oneshot(
        Request::builder().method("DELETE").uri(format!("/api/bookings/{}", id))
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["status"], "deleted");

    let res = app.router.clone().oneshot(
        Request::builder().method("GET").uri(format!("/api/bookings/{}", id))
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let slots = day_slots(&app, "2030-06-10").await;
    assert_eq!(slot(&slots, "13:00")["isAvailable"], true);
    assert!(slot(&slots, "13:00")["bookingId"].is_null());
}

#[tokio::test]
async fn update_moves_the_booking_and_frees_the_old_slot() {
    let app = TestApp::new().await;

    let res = post_booking(&app, booking_payload("2030-06-10", "09:00", "move@example.com")).await;
    let id = parse_body(res).await["bookingId"].as_str().unwrap().to_string();

    let res = app.router.clone().oneshot(
        Request::builder().method("PUT").uri(format!("/api/bookings/{}", id))
            .header("Content-Type", "application/json")
            .body(Body::from(json!({
                "service": {
                    "date": "2030-06-11",
                    "timeSlot": "15:00",
                    "crewSize": 3,
                    "services": ["mowing"]
                }
            }).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = parse_body(res).await;
    assert_eq!(body["service"]["date"], "2030-06-11");
    assert_eq!(body["service"]["timeSlot"], "15:00");
    assert_eq!(body["service"]["crewSize"], 3);

    let old = day_slots(&app, "2030-06-10").await;
    assert_eq!(slot(&old, "09:00")["isAvailable"], true);

    let new = day_slots(&app, "2030-06-11").await;
    assert_eq!(slot(&new, "15:00")["isAvailable"], false);
    assert_eq!(slot(&new, "15:00")["bookingId"], id.as_str());
}

#[tokio::test]
async fn moving_onto_a_taken_slot_conflicts_and_changes_nothing() {
    let app = TestApp::new().await;

    post_booking(&app, booking_payload("2030-06-10", "09:00", "holder@example.com")).await;
    let res = post_booking(&app, booking_payload("2030-06-10", "13:00", "mover@example.com")).await;
    let mover = parse_body(res).await["bookingId"].as_str().unwrap().to_string();

    let res = app.router.clone().oneshot(
        Request::builder().method("PUT").uri(format!("/api/bookings/{}", mover))
            .header("Content-Type", "application/json")
            .body(Body::from(json!({
                "service": {
                    "date": "2030-06-10",
                    "timeSlot": "09:00",
                    "crewSize": 2,
                    "services": ["mowing"]
                }
            }).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app.router.clone().oneshot(
        Request::builder().method("GET").uri(format!("/api/bookings/{}", mover))
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    let body = parse_body(res).await;
    assert_eq!(body["service"]["timeSlot"], "13:00");

    let slots = day_slots(&app, "2030-06-10").await;
    assert_eq!(slot(&slots, "13:00")["bookingId"], mover.as_str());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn simultaneous_creates_for_one_slot_admit_exactly_one() {
    let app = TestApp::new().await;

    // A fresh slot each round, so an unlucky schedule cannot hide a double
    // booking behind an earlier winner.
    for round in 0..8 {
        let date = format!("2031-01-{:02}", round + 1);

        let mut handles = Vec::new();
        for who in ["first", "second"] {
            let router = app.router.clone();
            let payload = booking_payload(&date, "09:00", &format!("{}@example.com", who));
            handles.push(tokio::spawn(async move {
                let res = router.oneshot(
                    Request::builder().method("POST").uri("/api/bookings")
                        .header("Content-Type", "application/json")
                        .body(Body::from(payload.to_string())).unwrap()
                ).await.unwrap();
                let status = res.status();
                (status, parse_body(res).await)
            }));
        }

        let mut statuses = Vec::new();
        let mut conflict_error = None;
        for handle in handles {
            let (status, body) = handle.await.unwrap();
            if status == StatusCode::CONFLICT {
                conflict_error = Some(body["error"].clone());
            }
            statuses.push(status);
        }
        statuses.sort_by_key(|s| s.as_u16());
        assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT], "round {}", round);
        assert_eq!(
            conflict_error.unwrap(),
            format!("Slot 09:00 on {} is already booked", date).as_str()
        );

        // Exactly one booking persisted, and it holds the slot.
        let res = app.router.clone().oneshot(
            Request::builder().method("GET")
                .uri(format!("/api/bookings?date={}", date))
                .body(Body::empty()).unwrap()
        ).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(parse_body(res).await.as_array().unwrap().len(), 1, "round {}", round);

        let slots = day_slots(&app, &date).await;
        assert_eq!(slot(&slots, "09:00")["isAvailable"], false);
    }
}

#[tokio::test]
async fn updating_a_vanished_booking_reports_not_found() {
    let app = TestApp::new().await;

    // Never inserted, standing in for a booking deleted after it was loaded.
    let ghost = Booking::new(NewBookingParams {
        id: Some("ghost-1".to_string()),
        customer: CustomerInfo {
            name: "Avery Brooks".to_string(),
            email: "avery@example.com".to_string(),
            phone: "555-0142".to_string(),
            address: "88 Maple Ave".to_string(),
        },
        date: NaiveDate::from_ymd_opt(2030, 6, 10).unwrap(),
        time_slot: "09:00".to_string(),
        crew_size: 2,
        hourly_rate_cents: 8500,
        services: vec![],
        notes: None,
        deposit_cents: 0,
    });

    let err = app.state.booking_repo.update(&ghost).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn update_replaces_customer_info_but_keeps_the_rate() {
    let app = TestApp::new().await;

    let res = post_booking(&app, booking_payload("2030-06-10", "09:00", "before@example.com")).await;
    let id = parse_body(res).await["bookingId"].as_str().unwrap().to_string();

    let res = app.router.clone().oneshot(
        Request::builder().method("PUT").uri(format!("/api/bookings/{}", id))
            .header("Content-Type", "application/json")
            .body(Body::from(json!({
                "customer": {
                    "name": "Jordan Vega",
                    "email": "after@example.com",
                    "phone": "555-0199",
                    "address": "14 Birch Ct"
                }
            }).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = parse_body(res).await;
    assert_eq!(body["customer"]["name"], "Jordan Vega");
    assert_eq!(body["customer"]["email"], "after@example.com");
    assert_eq!(body["service"]["hourlyRateCents"], 8500);
    assert_eq!(body["service"]["timeSlot"], "09:00");
}
