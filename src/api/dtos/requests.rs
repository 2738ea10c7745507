use crate::domain::models::calendar_day::BusinessRules;
use serde::Deserialize;

// Dates and times arrive as strings ("YYYY-MM-DD", "HH:MM") and are parsed
// in the handlers so malformed input turns into a 400 rather than an axum
// rejection. Required-but-missing fields are rejected the same way.

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePayload {
    pub date: Option<String>,
    pub time_slot: Option<String>,
    pub crew_size: Option<i64>,
    pub services: Option<Vec<String>>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub token: Option<String>,
    pub deposit_cents: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub booking_id: Option<String>,
    pub customer: Option<CustomerPayload>,
    pub service: Option<ServicePayload>,
    pub payment: Option<PaymentPayload>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingRequest {
    pub customer: Option<CustomerPayload>,
    pub service: Option<ServicePayload>,
    pub status: Option<String>,
    pub status_note: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeCompleteRequest {
    pub hours_worked: Option<f64>,
    pub materials_cents: Option<i64>,
    pub payment_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlotPayload {
    pub time: Option<String>,
    pub display_time: Option<String>,
    pub is_available: Option<bool>,
    pub booking_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceTimeSlotsRequest {
    pub date: Option<String>,
    pub time_slots: Option<Vec<TimeSlotPayload>>,
    pub business_rules: Option<BusinessRules>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkSlotBookedRequest {
    pub date: Option<String>,
    pub time_slot: Option<String>,
    pub booking_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamRatesRequest {
    pub crew_of_two_cents: Option<i64>,
    pub crew_of_three_cents: Option<i64>,
    pub crew_of_four_cents: Option<i64>,
}
