use crate::domain::models::calendar_day::{BusinessRules, CalendarDay, TimeSlot};
use crate::domain::ports::CalendarRepository;
use crate::domain::services::slots::default_day;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::warn;

pub struct SqliteCalendarRepo {
    pool: SqlitePool,
}

impl SqliteCalendarRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// One claim attempt inside a transaction. Under WAL two deferred
    /// transactions can both read the slot as free; the loser's write then
    /// fails with a busy/snapshot error instead of seeing the winner's
    /// commit, so the caller retries against the committed state.
    async fn try_claim(
        &self,
        date: NaiveDate,
        time: &str,
        booking_id: &str,
    ) -> Result<CalendarDay, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let row = sqlx::query_as::<_, CalendarDayRow>("SELECT * FROM calendar_days WHERE date = ?")
            .bind(date).fetch_optional(&mut *tx).await.map_err(AppError::Database)?;

        let mut day = match row {
            Some(r) => r.into_day()?,
            None => default_day(date),
        };

        let slot = day
            .time_slots
            .iter_mut()
            .find(|s| s.time == time)
            .ok_or_else(|| AppError::Conflict(format!("No {} slot exists on {}", time, date)))?;

        if !slot.is_available && slot.booking_id.as_deref() != Some(booking_id) {
            return Err(AppError::Conflict(format!("Slot {} on {} is already booked", time, date)));
        }

        slot.is_available = false;
        slot.booking_id = Some(booking_id.to_string());
        day.updated_at = Utc::now();

        let slots = encode_slots(&day)?;
        sqlx::query(UPSERT_DAY)
            .bind(day.date).bind(&slots)
            .bind(day.business_rules.is_day_off).bind(day.business_rules.is_blocked)
            .bind(&day.business_rules.block_reason).bind(&day.business_rules.notes)
            .bind(day.updated_at)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(day)
    }
}

#[derive(FromRow)]
struct CalendarDayRow {
    date: NaiveDate,
    time_slots: String,
    is_day_off: bool,
    is_blocked: bool,
    block_reason: Option<String>,
    notes: Option<String>,
    updated_at: DateTime<Utc>,
}

impl CalendarDayRow {
    fn into_day(self) -> Result<CalendarDay, AppError> {
        let time_slots: Vec<TimeSlot> = serde_json::from_str(&self.time_slots)
            .map_err(|e| AppError::InternalWithMsg(format!("Corrupt slot data for {}: {}", self.date, e)))?;

        Ok(CalendarDay {
            date: self.date,
            time_slots,
            business_rules: BusinessRules {
                is_day_off: self.is_day_off,
                is_blocked: self.is_blocked,
                block_reason: self.block_reason,
                notes: self.notes,
            },
            updated_at: self.updated_at,
        })
    }
}

fn encode_slots(day: &CalendarDay) -> Result<String, AppError> {
    serde_json::to_string(&day.time_slots)
        .map_err(|e| AppError::InternalWithMsg(format!("Failed to encode slots for {}: {}", day.date, e)))
}

const UPSERT_DAY: &str =
    "INSERT INTO calendar_days (date, time_slots, is_day_off, is_blocked, block_reason, notes, updated_at)
     VALUES (?, ?, ?, ?, ?, ?, ?)
     ON CONFLICT(date) DO UPDATE SET
         time_slots = excluded.time_slots,
         is_day_off = excluded.is_day_off,
         is_blocked = excluded.is_blocked,
         block_reason = excluded.block_reason,
         notes = excluded.notes,
         updated_at = excluded.updated_at";

const CLAIM_RETRIES: usize = 3;

#[async_trait]
impl CalendarRepository for SqliteCalendarRepo {
    async fn get(&self, date: NaiveDate) -> Result<Option<CalendarDay>, AppError> {
        let row = sqlx::query_as::<_, CalendarDayRow>("SELECT * FROM calendar_days WHERE date = ?")
            .bind(date).fetch_optional(&self.pool).await.map_err(AppError::Database)?;
        row.map(CalendarDayRow::into_day).transpose()
    }

    async fn replace(&self, day: &CalendarDay) -> Result<CalendarDay, AppError> {
        let slots = encode_slots(day)?;

        let row = sqlx::query_as::<_, CalendarDayRow>(&format!("{} RETURNING *", UPSERT_DAY))
            .bind(day.date).bind(&slots)
            .bind(day.business_rules.is_day_off).bind(day.business_rules.is_blocked)
            .bind(&day.business_rules.block_reason).bind(&day.business_rules.notes)
            .bind(day.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)?;

        row.into_day()
    }

    async fn claim_slot(
        &self,
        date: NaiveDate,
        time: &str,
        booking_id: &str,
    ) -> Result<CalendarDay, AppError> {
        let mut attempt = 0;
        loop {
            match self.try_claim(date, time, booking_id).await {
                Err(e) if e.is_busy() && attempt < CLAIM_RETRIES => {
                    attempt += 1;
                    warn!(
                        "Slot claim for {} {} hit a busy database (attempt {}); retrying",
                        date, time, attempt
                    );
                }
                result => return result,
            }
        }
    }

    async fn list(&self) -> Result<Vec<CalendarDay>, AppError> {
        let rows = sqlx::query_as::<_, CalendarDayRow>("SELECT * FROM calendar_days ORDER BY date ASC")
            .fetch_all(&self.pool).await.map_err(AppError::Database)?;
        rows.into_iter().map(CalendarDayRow::into_day).collect()
    }

    async fn delete_before(&self, date: NaiveDate) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM calendar_days WHERE date < ?")
            .bind(date).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}
