pub mod booking;
pub mod calendar_day;
pub mod rates;
