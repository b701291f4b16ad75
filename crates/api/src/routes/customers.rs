//! Customer routes: settlement history, carry-over seed and statistics.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use bahi_core::settlement::{
    CustomerLedgerSeed, CustomerStatistics, SettlementError, SettlementScalars, SettlementService,
};
use bahi_shared::types::CustomerId;
use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::{AppState, error::ApiError, routes::settlements::SettlementResponse};

/// Creates the customer routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/customers/{customer_id}/settlements",
            get(list_settlements),
        )
        .route("/customers/{customer_id}/seed", get(get_seed))
        .route(
            "/customers/{customer_id}/statistics",
            get(get_statistics),
        )
}

/// Carry-over seed with the scalars a new settlement starts from.
#[derive(Debug, Serialize)]
pub struct SeedResponse {
    /// Customer the seed is for.
    pub customer_id: CustomerId,
    /// Business day the seed was resolved on.
    pub business_day: NaiveDate,
    /// Carried values.
    #[serde(flatten)]
    pub seed: CustomerLedgerSeed,
    /// Prefilled manual inputs for a new settlement.
    pub scalars: SettlementScalars,
}

/// GET /customers/{customer_id}/settlements
async fn list_settlements(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
) -> Result<Json<Vec<SettlementResponse>>, ApiError> {
    let history = state
        .store
        .history_for_customer(customer_id)
        .await
        .map_err(SettlementError::Load)?;

    Ok(Json(
        history.into_iter().map(SettlementResponse::from).collect(),
    ))
}

/// GET /customers/{customer_id}/seed
async fn get_seed(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
) -> Result<Json<SeedResponse>, ApiError> {
    let now = Utc::now();
    let seed = SettlementService::seed_for(
        state.store.as_ref(),
        &state.resolver,
        &state.seed_cache,
        customer_id,
        now,
    )
    .await?;

    let scalars = SettlementScalars {
        deduction_rate_percent: state.settlement.default_deduction_rate_percent,
        ..SettlementScalars::seeded(&seed)
    };

    Ok(Json(SeedResponse {
        customer_id,
        business_day: state.resolver.business_day(now),
        seed,
        scalars,
    }))
}

/// GET /customers/{customer_id}/statistics
async fn get_statistics(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
) -> Result<Json<CustomerStatistics>, ApiError> {
    let history = state
        .store
        .history_for_customer(customer_id)
        .await
        .map_err(SettlementError::Load)?;

    Ok(Json(CustomerStatistics::from_history(customer_id, &history)))
}
