pub mod booking;
pub mod calendar;
pub mod cleanup;
pub mod health;
pub mod rates;
