pub mod sqlite_booking_repo;
pub mod sqlite_calendar_repo;
pub mod sqlite_rates_repo;

pub mod fallback_calendar_repo;
pub mod fallback_rates_repo;
