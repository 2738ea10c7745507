use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{ConnectOptions, SqlitePool};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::ports::{EmailService, PaymentService};
use crate::infra::cache::{DayCache, RatesCache};
use crate::infra::email::resend_service::{DisabledEmailService, ResendEmailService};
use crate::infra::payments::square_service::{DisabledPaymentService, SquarePaymentService};
use crate::infra::repositories::{
    fallback_calendar_repo::FallbackCalendarRepo, fallback_rates_repo::FallbackRatesRepo,
    sqlite_booking_repo::SqliteBookingRepo, sqlite_calendar_repo::SqliteCalendarRepo,
    sqlite_rates_repo::SqliteRatesRepo,
};
use crate::state::AppState;

pub async fn bootstrap_state(config: &Config) -> AppState {
    info!("Initializing SQLite connection with WAL Mode...");

    let opts = SqliteConnectOptions::from_str(&config.database_url)
        .expect("Invalid SQLite connection string")
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await
        .expect("Failed to connect to SQLite");

    run_migrations(&pool).await;

    let ttl = Duration::from_secs(config.fallback_cache_ttl_secs);

    let calendar_repo = Arc::new(FallbackCalendarRepo::new(
        Arc::new(SqliteCalendarRepo::new(pool.clone())),
        Arc::new(DayCache::new(ttl)),
    ));
    let rates_repo = Arc::new(FallbackRatesRepo::new(
        Arc::new(SqliteRatesRepo::new(pool.clone())),
        Arc::new(RatesCache::new(ttl)),
    ));
    let booking_repo = Arc::new(SqliteBookingRepo::new(pool.clone()));

    let email_service: Arc<dyn EmailService> = match &config.resend_api_key {
        Some(key) => Arc::new(ResendEmailService::new(key.clone(), config.email_from.clone())),
        None => {
            info!("RESEND_API_KEY not set; outgoing email is disabled");
            Arc::new(DisabledEmailService)
        }
    };

    let payment_service: Arc<dyn PaymentService> =
        match (&config.square_access_token, &config.square_location_id) {
            (Some(token), Some(location)) => Arc::new(SquarePaymentService::new(
                config.square_api_base.clone(),
                token.clone(),
                location.clone(),
            )),
            _ => {
                info!("Square credentials not set; payment processing is disabled");
                Arc::new(DisabledPaymentService)
            }
        };

    AppState {
        config: config.clone(),
        calendar_repo,
        booking_repo,
        rates_repo,
        email_service,
        payment_service,
    }
}

async fn run_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .expect("Failed to run migrations");
}
