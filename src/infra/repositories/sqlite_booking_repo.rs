use crate::domain::models::booking::{
    Booking, BookingStatus, CustomerInfo, PaymentInfo, ServiceDetails, StatusChange,
};
use crate::domain::ports::{BookingFilter, BookingRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqlitePool};

pub struct SqliteBookingRepo {
    pool: SqlitePool,
}

impl SqliteBookingRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Flat row shape. The nested sub-documents (services list, status history)
/// live in JSON text columns and are folded back into the domain model here.
#[derive(FromRow)]
struct BookingRow {
    id: String,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    customer_address: String,
    service_date: NaiveDate,
    time_slot: String,
    crew_size: i64,
    hourly_rate_cents: i64,
    services: String,
    notes: Option<String>,
    status: String,
    status_history: String,
    deposit_cents: i64,
    deposit_paid: bool,
    final_cents: Option<i64>,
    final_paid: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_booking(self) -> Result<Booking, AppError> {
        let services: Vec<String> = serde_json::from_str(&self.services)
            .map_err(|e| AppError::InternalWithMsg(format!("Corrupt services column for booking {}: {}", self.id, e)))?;
        let status_history: Vec<StatusChange> = serde_json::from_str(&self.status_history)
            .map_err(|e| AppError::InternalWithMsg(format!("Corrupt status history for booking {}: {}", self.id, e)))?;
        let status = BookingStatus::parse(&self.status)
            .ok_or_else(|| AppError::InternalWithMsg(format!("Unknown stored status '{}' for booking {}", self.status, self.id)))?;

        Ok(Booking {
            id: self.id,
            customer: CustomerInfo {
                name: self.customer_name,
                email: self.customer_email,
                phone: self.customer_phone,
                address: self.customer_address,
            },
            service: ServiceDetails {
                date: self.service_date,
                time_slot: self.time_slot,
                crew_size: self.crew_size,
                hourly_rate_cents: self.hourly_rate_cents,
                services,
                notes: self.notes,
            },
            status,
            status_history,
            payment: PaymentInfo {
                deposit_cents: self.deposit_cents,
                deposit_paid: self.deposit_paid,
                final_cents: self.final_cents,
                final_paid: self.final_paid,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn encode_json<T: serde::Serialize>(value: &T, what: &str) -> Result<String, AppError> {
    serde_json::to_string(value)
        .map_err(|e| AppError::InternalWithMsg(format!("Failed to encode {}: {}", what, e)))
}

#[async_trait]
impl BookingRepository for SqliteBookingRepo {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError> {
        let services = encode_json(&booking.service.services, "services")?;
        let history = encode_json(&booking.status_history, "status history")?;

        let row = sqlx::query_as::<_, BookingRow>(
            "INSERT INTO bookings (id, customer_name, customer_email, customer_phone, customer_address,
                                   service_date, time_slot, crew_size, hourly_rate_cents, services, notes,
                                   status, status_history, deposit_cents, deposit_paid, final_cents, final_paid,
                                   created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&booking.id).bind(&booking.customer.name).bind(&booking.customer.email)
            .bind(&booking.customer.phone).bind(&booking.customer.address)
            .bind(booking.service.date).bind(&booking.service.time_slot).bind(booking.service.crew_size)
            .bind(booking.service.hourly_rate_cents).bind(&services).bind(&booking.service.notes)
            .bind(booking.status.as_str()).bind(&history)
            .bind(booking.payment.deposit_cents).bind(booking.payment.deposit_paid)
            .bind(booking.payment.final_cents).bind(booking.payment.final_paid)
            .bind(booking.created_at).bind(booking.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)?;

        row.into_booking()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        let row = sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings WHERE id = ?")
            .bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)?;
        row.map(BookingRow::into_booking).transpose()
    }

    async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, AppError> {
        let mut sql = String::from("SELECT * FROM bookings WHERE 1=1");
        if filter.date.is_some() {
            sql.push_str(" AND service_date = ?");
        }
        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if filter.email.is_some() {
            sql.push_str(" AND customer_email = ?");
        }
        sql.push_str(" ORDER BY service_date ASC, time_slot ASC, created_at ASC");

        let mut query = sqlx::query_as::<_, BookingRow>(&sql);
        if let Some(date) = filter.date {
            query = query.bind(date);
        }
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        if let Some(email) = filter.email.clone() {
            query = query.bind(email);
        }

        let rows = query.fetch_all(&self.pool).await.map_err(AppError::Database)?;
        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    async fn list_active_by_date(&self, date: NaiveDate) -> Result<Vec<Booking>, AppError> {
        let rows = sqlx::query_as::<_, BookingRow>(
            "SELECT * FROM bookings WHERE service_date = ? AND status != 'cancelled' ORDER BY created_at ASC"
        )
            .bind(date).fetch_all(&self.pool).await.map_err(AppError::Database)?;
        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    async fn list_dates(&self) -> Result<Vec<NaiveDate>, AppError> {
        sqlx::query_scalar::<_, NaiveDate>("SELECT DISTINCT service_date FROM bookings ORDER BY service_date ASC")
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, booking: &Booking) -> Result<Booking, AppError> {
        let services = encode_json(&booking.service.services, "services")?;
        let history = encode_json(&booking.status_history, "status history")?;

        let row = sqlx::query_as::<_, BookingRow>(
            "UPDATE bookings SET customer_name=?, customer_email=?, customer_phone=?, customer_address=?,
                                 service_date=?, time_slot=?, crew_size=?, hourly_rate_cents=?, services=?, notes=?,
                                 status=?, status_history=?, deposit_cents=?, deposit_paid=?, final_cents=?, final_paid=?,
                                 updated_at=?
             WHERE id=?
             RETURNING *"
        )
            .bind(&booking.customer.name).bind(&booking.customer.email)
            .bind(&booking.customer.phone).bind(&booking.customer.address)
            .bind(booking.service.date).bind(&booking.service.time_slot).bind(booking.service.crew_size)
            .bind(booking.service.hourly_rate_cents).bind(&services).bind(&booking.service.notes)
            .bind(booking.status.as_str()).bind(&history)
            .bind(booking.payment.deposit_cents).bind(booking.payment.deposit_paid)
            .bind(booking.payment.final_cents).bind(booking.payment.final_paid)
            .bind(booking.updated_at)
            .bind(&booking.id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?;

        row.ok_or_else(|| AppError::NotFound("Booking not found".into()))?
            .into_booking()
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = ?")
            .bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Booking not found".into()));
        }
        Ok(())
    }

    async fn delete_before(&self, date: NaiveDate) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM bookings WHERE service_date < ?")
            .bind(date).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}
