use crate::domain::models::rates::TeamRates;
use crate::domain::ports::RatesRepository;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

pub struct SqliteRatesRepo {
    pool: SqlitePool,
}

impl SqliteRatesRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct TeamRatesRow {
    crew_of_two_cents: i64,
    crew_of_three_cents: i64,
    crew_of_four_cents: i64,
    updated_at: DateTime<Utc>,
}

impl TeamRatesRow {
    fn into_rates(self) -> TeamRates {
        TeamRates {
            crew_of_two_cents: self.crew_of_two_cents,
            crew_of_three_cents: self.crew_of_three_cents,
            crew_of_four_cents: self.crew_of_four_cents,
            updated_at: self.updated_at,
        }
    }
}

#[async_trait]
impl RatesRepository for SqliteRatesRepo {
    async fn get(&self) -> Result<TeamRates, AppError> {
        let row = sqlx::query_as::<_, TeamRatesRow>("SELECT * FROM team_rates WHERE id = 1")
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?;
        // Defaults until the first save.
        Ok(row.map(TeamRatesRow::into_rates).unwrap_or_default())
    }

    async fn save(&self, rates: &TeamRates) -> Result<TeamRates, AppError> {
        let row = sqlx::query_as::<_, TeamRatesRow>(
            "INSERT INTO team_rates (id, crew_of_two_cents, crew_of_three_cents, crew_of_four_cents, updated_at)
             VALUES (1, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 crew_of_two_cents = excluded.crew_of_two_cents,
                 crew_of_three_cents = excluded.crew_of_three_cents,
                 crew_of_four_cents = excluded.crew_of_four_cents,
                 updated_at = excluded.updated_at
             RETURNING *"
        )
            .bind(rates.crew_of_two_cents)
            .bind(rates.crew_of_three_cents)
            .bind(rates.crew_of_four_cents)
            .bind(rates.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)?;

        Ok(row.into_rates())
    }
}
