use std::sync::Arc;

use crate::domain::models::rates::TeamRates;
use crate::domain::ports::RatesRepository;
use crate::error::AppError;
use crate::infra::cache::RatesCache;
use async_trait::async_trait;
use tracing::{info, warn};

/// Same degradation scheme as the calendar fallback, for the single rates
/// document. When both the database and the cache come up empty the caller
/// gets the built-in defaults, which keeps pricing available no matter what.
pub struct FallbackRatesRepo {
    durable: Arc<dyn RatesRepository>,
    cache: Arc<RatesCache>,
}

impl FallbackRatesRepo {
    pub fn new(durable: Arc<dyn RatesRepository>, cache: Arc<RatesCache>) -> Self {
        Self { durable, cache }
    }

    async fn flush_dirty(&self) {
        if let Some(rates) = self.cache.dirty_rates() {
            match self.durable.save(&rates).await {
                Ok(_) => {
                    self.cache.mark_clean();
                    info!("Promoted cached team rates back to durable storage");
                }
                Err(e) => warn!("Promotion of cached team rates failed: {}", e),
            }
        }
    }

    // Busy/locked is a live database with a concurrent writer, not an
    // outage; only connectivity-class failures engage the cache.
    fn is_outage(err: &AppError) -> bool {
        matches!(err, AppError::Database(_)) && !err.is_busy()
    }
}

#[async_trait]
impl RatesRepository for FallbackRatesRepo {
    async fn get(&self) -> Result<TeamRates, AppError> {
        self.flush_dirty().await;

        match self.durable.get().await {
            Ok(rates) => {
                // A dirty cached edit survives until flush_dirty lands it.
                self.cache.clear_clean();
                Ok(rates)
            }
            Err(e) if Self::is_outage(&e) => {
                warn!("Rates read failed ({}); serving from fallback cache", e);
                Ok(self.cache.get().unwrap_or_default())
            }
            Err(e) => Err(e),
        }
    }

    async fn save(&self, rates: &TeamRates) -> Result<TeamRates, AppError> {
        self.flush_dirty().await;

        match self.durable.save(rates).await {
            Ok(saved) => {
                self.cache.clear();
                Ok(saved)
            }
            Err(e) if Self::is_outage(&e) => {
                warn!("Rates write failed ({}); holding in fallback cache", e);
                self.cache.put(rates.clone(), true);
                Ok(rates.clone())
            }
            Err(e) => Err(e),
        }
    }
}
