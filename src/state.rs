use std::sync::Arc;
use crate::config::Config;
use crate::domain::ports::{
    BookingRepository, CalendarRepository, EmailService, PaymentService, RatesRepository,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub calendar_repo: Arc<dyn CalendarRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub rates_repo: Arc<dyn RatesRepository>,
    pub email_service: Arc<dyn EmailService>,
    pub payment_service: Arc<dyn PaymentService>,
}
