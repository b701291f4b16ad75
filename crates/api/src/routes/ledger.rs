//! Ledger-wide reporting routes.

use axum::{Json, Router, extract::State, routing::get};
use bahi_core::settlement::{LedgerSummary, SettlementError};

use crate::{AppState, error::ApiError};

/// Creates the ledger routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/ledger/summary", get(get_summary))
}

/// GET /ledger/summary
async fn get_summary(State(state): State<AppState>) -> Result<Json<LedgerSummary>, ApiError> {
    let history = state
        .store
        .all_settlements()
        .await
        .map_err(SettlementError::Load)?;

    Ok(Json(LedgerSummary::from_history(&history)))
}
