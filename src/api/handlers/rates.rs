use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::requests::UpdateTeamRatesRequest;
use crate::error::AppError;
use crate::state::AppState;

pub async fn get_team_rates(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let rates = state.rates_repo.get().await?;
    Ok(Json(rates))
}

pub async fn update_team_rates(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UpdateTeamRatesRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut rates = state.rates_repo.get().await?;

    if let Some(cents) = payload.crew_of_two_cents {
        rates.crew_of_two_cents = cents;
    }
    if let Some(cents) = payload.crew_of_three_cents {
        rates.crew_of_three_cents = cents;
    }
    if let Some(cents) = payload.crew_of_four_cents {
        rates.crew_of_four_cents = cents;
    }
    if rates.crew_of_two_cents < 0 || rates.crew_of_three_cents < 0 || rates.crew_of_four_cents < 0 {
        return Err(AppError::Validation("Rates cannot be negative".into()));
    }
    rates.updated_at = Utc::now();

    let saved = state.rates_repo.save(&rates).await?;
    info!(
        "Team rates updated: 2-person {} / 3-person {} / 4-person {} cents",
        saved.crew_of_two_cents, saved.crew_of_three_cents, saved.crew_of_four_cents
    );
    Ok(Json(saved))
}
