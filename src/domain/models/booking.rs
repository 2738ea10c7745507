use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "in_progress" => Some(BookingStatus::InProgress),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// Forward transitions move one step through the job lifecycle.
    /// Cancellation is allowed from any state that is not already terminal.
    pub fn can_transition(self, next: Self) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, InProgress)
                | (InProgress, Completed)
                | (Pending | Confirmed | InProgress, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDetails {
    pub date: NaiveDate,
    pub time_slot: String,
    pub crew_size: i64,
    /// Rate snapshot taken when the booking was created. Later edits to the
    /// team rates never touch this.
    pub hourly_rate_cents: i64,
    pub services: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub status: BookingStatus,
    pub changed_at: DateTime<Utc>,
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentInfo {
    pub deposit_cents: i64,
    pub deposit_paid: bool,
    pub final_cents: Option<i64>,
    pub final_paid: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "bookingId")]
    pub id: String,
    pub customer: CustomerInfo,
    pub service: ServiceDetails,
    pub status: BookingStatus,
    pub status_history: Vec<StatusChange>,
    pub payment: PaymentInfo,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewBookingParams {
    /// Callers may bring their own id (offline-created bookings get synced
    /// later); a fresh UUID is minted otherwise.
    pub id: Option<String>,
    pub customer: CustomerInfo,
    pub date: NaiveDate,
    pub time_slot: String,
    pub crew_size: i64,
    pub hourly_rate_cents: i64,
    pub services: Vec<String>,
    pub notes: Option<String>,
    pub deposit_cents: i64,
}

impl Booking {
    pub fn new(params: NewBookingParams) -> Self {
        let now = Utc::now();

        Self {
            id: params.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            customer: params.customer,
            service: ServiceDetails {
                date: params.date,
                time_slot: params.time_slot,
                crew_size: params.crew_size,
                hourly_rate_cents: params.hourly_rate_cents,
                services: params.services,
                notes: params.notes,
            },
            status: BookingStatus::Pending,
            status_history: vec![StatusChange {
                status: BookingStatus::Pending,
                changed_at: now,
                note: None,
            }],
            payment: PaymentInfo {
                deposit_cents: params.deposit_cents,
                ..Default::default()
            },
            created_at: now,
            updated_at: now,
        }
    }

    pub fn push_status(&mut self, next: BookingStatus, note: Option<String>) {
        self.status = next;
        self.status_history.push(StatusChange {
            status: next,
            changed_at: Utc::now(),
            note,
        });
    }
}
