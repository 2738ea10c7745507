use std::sync::Arc;

use crate::domain::models::calendar_day::CalendarDay;
use crate::domain::ports::CalendarRepository;
use crate::domain::services::slots::default_day;
use crate::error::AppError;
use crate::infra::cache::DayCache;
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{info, warn};

/// Wraps the durable calendar repository with an in-memory fallback.
///
/// Database failures degrade to the cache instead of surfacing 500s:
/// reads serve whatever fresh copy exists, writes land in the cache flagged
/// dirty. The next call that reaches the database first flushes those dirty
/// entries back, so short outages heal without operator action.
pub struct FallbackCalendarRepo {
    durable: Arc<dyn CalendarRepository>,
    cache: Arc<DayCache>,
}

impl FallbackCalendarRepo {
    pub fn new(durable: Arc<dyn CalendarRepository>, cache: Arc<DayCache>) -> Self {
        Self { durable, cache }
    }

    async fn flush_dirty(&self) {
        for day in self.cache.dirty_entries() {
            match self.durable.replace(&day).await {
                Ok(_) => {
                    self.cache.mark_clean(day.date);
                    info!("Promoted cached calendar day {} back to durable storage", day.date);
                }
                Err(e) => {
                    warn!("Promotion of cached calendar day {} failed: {}", day.date, e);
                    return;
                }
            }
        }
    }

    // Busy/locked means the database is alive with a concurrent writer, not
    // down; falling back there would let two claimers both succeed. Only
    // connectivity-class failures engage the cache.
    fn is_outage(err: &AppError) -> bool {
        matches!(err, AppError::Database(_)) && !err.is_busy()
    }
}

#[async_trait]
impl CalendarRepository for FallbackCalendarRepo {
    async fn get(&self, date: NaiveDate) -> Result<Option<CalendarDay>, AppError> {
        if self.cache.has_dirty() {
            self.flush_dirty().await;
        }

        match self.durable.get(date).await {
            Ok(found) => {
                // Durable storage answered; a clean cached copy is stale now.
                // A dirty one stays put until flush_dirty lands it.
                self.cache.remove_clean(date);
                Ok(found)
            }
            Err(e) if Self::is_outage(&e) => {
                warn!("Calendar read for {} failed ({}); serving from fallback cache", date, e);
                Ok(self.cache.get(date))
            }
            Err(e) => Err(e),
        }
    }

    async fn replace(&self, day: &CalendarDay) -> Result<CalendarDay, AppError> {
        if self.cache.has_dirty() {
            self.flush_dirty().await;
        }

        match self.durable.replace(day).await {
            Ok(saved) => {
                self.cache.remove(day.date);
                Ok(saved)
            }
            Err(e) if Self::is_outage(&e) => {
                warn!("Calendar write for {} failed ({}); holding in fallback cache", day.date, e);
                self.cache.put(day.clone(), true);
                Ok(day.clone())
            }
            Err(e) => Err(e),
        }
    }

    async fn claim_slot(
        &self,
        date: NaiveDate,
        time: &str,
        booking_id: &str,
    ) -> Result<CalendarDay, AppError> {
        if self.cache.has_dirty() {
            self.flush_dirty().await;
        }

        match self.durable.claim_slot(date, time, booking_id).await {
            Ok(day) => {
                self.cache.remove_clean(date);
                Ok(day)
            }
            Err(e) if Self::is_outage(&e) => {
                warn!("Slot claim for {} {} failed ({}); claiming in fallback cache", date, time, e);
                self.cache.claim_slot(date, time, booking_id, || default_day(date))
            }
            Err(e) => Err(e),
        }
    }

    async fn list(&self) -> Result<Vec<CalendarDay>, AppError> {
        if self.cache.has_dirty() {
            self.flush_dirty().await;
        }

        match self.durable.list().await {
            Ok(days) => Ok(days),
            Err(e) if Self::is_outage(&e) => {
                warn!("Calendar listing failed ({}); serving fallback cache contents", e);
                Ok(self.cache.fresh_days())
            }
            Err(e) => Err(e),
        }
    }

    async fn delete_before(&self, date: NaiveDate) -> Result<u64, AppError> {
        let removed_cached = self.cache.remove_before(date);

        match self.durable.delete_before(date).await {
            Ok(removed) => Ok(removed),
            Err(e) if Self::is_outage(&e) => {
                warn!("Calendar purge before {} failed ({}); dropped {} cached days only", date, e, removed_cached);
                Ok(removed_cached)
            }
            Err(e) => Err(e),
        }
    }
}
