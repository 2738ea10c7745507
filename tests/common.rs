use yardbook_backend::{
    api::router::create_router,
    state::AppState,
    config::Config,
    infra::cache::{DayCache, RatesCache},
    infra::repositories::{
        fallback_calendar_repo::FallbackCalendarRepo,
        fallback_rates_repo::FallbackRatesRepo,
        sqlite_booking_repo::SqliteBookingRepo,
        sqlite_calendar_repo::SqliteCalendarRepo,
        sqlite_rates_repo::SqliteRatesRepo,
    },
    domain::ports::{EmailService, PaymentReceipt, PaymentService},
    error::AppError,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;
use axum::Router;
use async_trait::async_trait;

#[derive(Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
}

/// Email double that records every send and can be flipped into failure
/// mode mid-test.
pub struct RecordingEmailService {
    pub sent: Arc<Mutex<Vec<SentEmail>>>,
    pub fail: Arc<AtomicBool>,
}

#[async_trait]
impl EmailService for RecordingEmailService {
    async fn send(&self, recipient: &str, subject: &str, _html_body: &str) -> Result<(), AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::InternalWithMsg(
                "Email service failed. Status: 500 Internal Server Error, Body: simulated outage".to_string(),
            ));
        }
        self.sent.lock().unwrap().push(SentEmail {
            to: recipient.to_string(),
            subject: subject.to_string(),
        });
        Ok(())
    }
}

/// Payment double that records (token, amount) pairs instead of talking to
/// a processor. `fail` simulates a decline on the next charge.
pub struct RecordingPaymentService {
    pub enabled: bool,
    pub charges: Arc<Mutex<Vec<(String, i64)>>>,
    pub fail: Arc<AtomicBool>,
}

#[async_trait]
impl PaymentService for RecordingPaymentService {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn charge(
        &self,
        source_token: &str,
        amount_cents: i64,
        _note: &str,
    ) -> Result<PaymentReceipt, AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::InternalWithMsg(
                "Payment failed. Status: 402 Payment Required, Body: simulated decline".to_string(),
            ));
        }
        self.charges.lock().unwrap().push((source_token.to_string(), amount_cents));
        Ok(PaymentReceipt {
            payment_id: format!("test-payment-{}", Uuid::new_v4()),
            amount_cents,
        })
    }
}

pub fn test_config(db_url: &str) -> Config {
    Config {
        database_url: db_url.to_string(),
        port: 0,
        email_from: "Yardbook Test <test@localhost>".to_string(),
        resend_api_key: None,
        square_access_token: None,
        square_location_id: None,
        square_api_base: "http://localhost".to_string(),
        frontend_url: "http://localhost:5173".to_string(),
        fallback_cache_ttl_secs: 300,
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub emails: Arc<Mutex<Vec<SentEmail>>>,
    pub email_fail: Arc<AtomicBool>,
    pub charges: Arc<Mutex<Vec<(String, i64)>>>,
    pub payment_fail: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        Self::build(true).await
    }

    /// Same app with the payment processor unconfigured, mirroring a
    /// deployment without Square credentials.
    pub async fn without_payments() -> Self {
        Self::build(false).await
    }

    async fn build(payments_enabled: bool) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = test_config(&db_url);
        let ttl = Duration::from_secs(config.fallback_cache_ttl_secs);

        let emails = Arc::new(Mutex::new(Vec::new()));
        let email_fail = Arc::new(AtomicBool::new(false));
        let charges = Arc::new(Mutex::new(Vec::new()));
        let payment_fail = Arc::new(AtomicBool::new(false));

        let state = Arc::new(AppState {
            config,
            calendar_repo: Arc::new(FallbackCalendarRepo::new(
                Arc::new(SqliteCalendarRepo::new(pool.clone())),
                Arc::new(DayCache::new(ttl)),
            )),
            booking_repo: Arc::new(SqliteBookingRepo::new(pool.clone())),
            rates_repo: Arc::new(FallbackRatesRepo::new(
                Arc::new(SqliteRatesRepo::new(pool.clone())),
                Arc::new(RatesCache::new(ttl)),
            )),
            email_service: Arc::new(RecordingEmailService {
                sent: emails.clone(),
                fail: email_fail.clone(),
            }),
            payment_service: Arc::new(RecordingPaymentService {
                enabled: payments_enabled,
                charges: charges.clone(),
                fail: payment_fail.clone(),
            }),
        });

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            emails,
            email_fail,
            charges,
            payment_fail,
        }
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
    }
}
