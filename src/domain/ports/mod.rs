use crate::domain::models::{
    booking::{Booking, BookingStatus},
    calendar_day::CalendarDay,
    rates::TeamRates,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
pub trait CalendarRepository: Send + Sync {
    async fn get(&self, date: NaiveDate) -> Result<Option<CalendarDay>, AppError>;
    /// Full-document overwrite keyed by date; creates the row when absent.
    async fn replace(&self, day: &CalendarDay) -> Result<CalendarDay, AppError>;
    /// Atomically mark one slot as taken by `booking_id`. Fails with
    /// `Conflict` when the slot is missing or already held by another
    /// booking; claiming a slot you already hold is a no-op success.
    async fn claim_slot(
        &self,
        date: NaiveDate,
        time: &str,
        booking_id: &str,
    ) -> Result<CalendarDay, AppError>;
    async fn list(&self) -> Result<Vec<CalendarDay>, AppError>;
    /// Purge rows strictly before `date`. Returns how many were removed.
    async fn delete_before(&self, date: NaiveDate) -> Result<u64, AppError>;
}

#[derive(Debug, Default, Clone)]
pub struct BookingFilter {
    pub date: Option<NaiveDate>,
    pub status: Option<BookingStatus>,
    pub email: Option<String>,
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, AppError>;
    /// Non-cancelled bookings for one date, oldest first. This is the input
    /// order the slot reconciler relies on.
    async fn list_active_by_date(&self, date: NaiveDate) -> Result<Vec<Booking>, AppError>;
    /// Distinct service dates across all bookings, used to surface days the
    /// calendar has no stored row for yet.
    async fn list_dates(&self) -> Result<Vec<NaiveDate>, AppError>;
    async fn update(&self, booking: &Booking) -> Result<Booking, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
    async fn delete_before(&self, date: NaiveDate) -> Result<u64, AppError>;
}

#[async_trait]
pub trait RatesRepository: Send + Sync {
    /// Never fails with "not found"; defaults are returned until the first
    /// save.
    async fn get(&self) -> Result<TeamRates, AppError>;
    async fn save(&self, rates: &TeamRates) -> Result<TeamRates, AppError>;
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError>;
}

#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub payment_id: String,
    pub amount_cents: i64,
}

#[async_trait]
pub trait PaymentService: Send + Sync {
    /// False when the processor is not configured; callers skip charging
    /// instead of failing the whole request.
    fn is_enabled(&self) -> bool;
    async fn charge(
        &self,
        source_token: &str,
        amount_cents: i64,
        note: &str,
    ) -> Result<PaymentReceipt, AppError>;
}
