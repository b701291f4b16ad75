//! Settlement routes: preview, create, replace, delete and batch entry.

use std::collections::HashSet;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{post, put},
};
use bahi_core::settlement::{
    BatchEntry, BatchOutcome, BatchSettlementBuilder, LooseValue, MAX_ROWS, PairCategory,
    RawAdjustment, RawEntryRow, ReferenceValues, SettlementBreakdown, SettlementCalculator,
    SettlementDraft, SettlementError, SettlementRecord, SettlementScalars, SettlementService,
    SubmissionFailure, coerce_entered, normalize_rows,
};
use bahi_shared::AppError;
use bahi_shared::types::{BalanceDirection, CustomerId, SettlementId, display_amount};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppState, error::ApiError};

/// Creates the settlement routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/settlements", post(create_settlement))
        .route("/settlements/preview", post(preview_settlement))
        .route("/settlements/batch", post(submit_batch))
        .route(
            "/settlements/{settlement_id}",
            put(replace_settlement)
                .get(get_settlement)
                .delete(delete_settlement),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Manual inputs of a settlement, as entered.
///
/// Missing values fall back to defaults. Blank or non-numeric values are zero.
#[derive(Debug, Default, Deserialize)]
pub struct ScalarsRequest {
    /// Deduction rate; the configured default when absent.
    pub deduction_rate_percent: Option<LooseValue>,
    /// Balance carried in.
    pub opening_pending_balance: Option<LooseValue>,
    /// Advance carried in.
    pub opening_advance: Option<LooseValue>,
    /// Cutting fee.
    pub cutting_fee: Option<LooseValue>,
    /// Deposit.
    pub deposit_amount: Option<LooseValue>,
    /// Adjustment mode and value.
    pub adjustment: Option<RawAdjustment>,
    /// Day-level reference figures.
    pub reference_values: Option<ReferenceValues>,
}

impl ScalarsRequest {
    /// Coerces entered values and fills in missing ones.
    pub fn resolve(self, default_rate: Decimal) -> SettlementScalars {
        SettlementScalars {
            deduction_rate_percent: coerce_entered(self.deduction_rate_percent.as_ref())
                .unwrap_or(default_rate),
            opening_pending_balance: coerce_entered(self.opening_pending_balance.as_ref())
                .unwrap_or_default(),
            opening_advance: coerce_entered(self.opening_advance.as_ref()).unwrap_or_default(),
            cutting_fee: coerce_entered(self.cutting_fee.as_ref()).unwrap_or_default(),
            deposit_amount: coerce_entered(self.deposit_amount.as_ref()).unwrap_or_default(),
            adjustment: self
                .adjustment
                .as_ref()
                .map(RawAdjustment::to_adjustment)
                .unwrap_or_default(),
            reference_values: self.reference_values.unwrap_or_default(),
        }
    }
}

/// Request body for previewing, creating or replacing a settlement.
///
/// Rows are accepted in any stored shape and normalized.
#[derive(Debug, Default, Deserialize)]
pub struct SettlementRequest {
    /// Settlement to replace; a new one is created when absent.
    pub id: Option<SettlementId>,
    /// Customer the settlement belongs to.
    pub customer_id: Option<CustomerId>,
    /// Occurrence time; "now" for new settlements when absent.
    pub occurred_at: Option<DateTime<Utc>>,
    /// Entry rows.
    #[serde(default)]
    pub rows: Vec<RawEntryRow>,
    /// Category of the third pair; taken from the rows when absent.
    pub pair_c_category: Option<PairCategory>,
    /// Manual inputs.
    #[serde(default)]
    pub scalars: ScalarsRequest,
}

impl SettlementRequest {
    /// Normalizes the request into a draft.
    pub fn into_draft(self, default_rate: Decimal) -> SettlementDraft {
        let normalized = normalize_rows(self.rows);

        SettlementDraft {
            id: self.id,
            customer_id: self.customer_id,
            occurred_at: self.occurred_at,
            rows: normalized.rows,
            pair_c_category: self.pair_c_category.unwrap_or(normalized.category),
            scalars: self.scalars.resolve(default_rate),
        }
    }
}

/// A settlement with its balance rendered for display.
#[derive(Debug, Serialize)]
pub struct SettlementResponse {
    /// Stored settlement.
    #[serde(flatten)]
    pub record: SettlementRecord,
    /// Who owes whom after this settlement.
    pub direction: BalanceDirection,
    /// Closing balance rounded to two places.
    pub closing_balance_display: String,
    /// Advance net rounded to two places.
    pub advance_net_display: String,
}

impl From<SettlementRecord> for SettlementResponse {
    fn from(record: SettlementRecord) -> Self {
        let breakdown = record.breakdown;
        Self {
            direction: BalanceDirection::of(breakdown.closing_balance),
            closing_balance_display: display_amount(breakdown.closing_balance),
            advance_net_display: display_amount(breakdown.advance_net),
            record,
        }
    }
}

/// Response for a preview.
#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    /// Itemized breakdown.
    pub breakdown: SettlementBreakdown,
    /// Who would owe whom.
    pub direction: BalanceDirection,
    /// Closing balance rounded to two places.
    pub closing_balance_display: String,
}

/// One customer's entry in a batch request.
#[derive(Debug, Deserialize)]
pub struct BatchEntryRequest {
    /// Customer the entry belongs to.
    pub customer_id: CustomerId,
    /// Entry rows in any stored shape.
    #[serde(default)]
    pub rows: Vec<RawEntryRow>,
    /// Category of the third pair.
    pub pair_c_category: Option<PairCategory>,
    /// Reference figures entered for the day.
    pub reference_values: Option<ReferenceValues>,
    /// Deduction rate override.
    pub deduction_rate_percent: Option<LooseValue>,
    /// Deposit.
    pub deposit_amount: Option<LooseValue>,
    /// Adjustment.
    pub adjustment: Option<RawAdjustment>,
    /// Advance override.
    pub opening_advance: Option<LooseValue>,
    /// Cutting fee.
    pub cutting_fee: Option<LooseValue>,
}

impl BatchEntryRequest {
    fn into_entry(self, default_rate: Decimal) -> BatchEntry {
        let normalized = normalize_rows(self.rows);

        BatchEntry {
            customer_id: self.customer_id,
            rows: normalized.rows,
            pair_c_category: self.pair_c_category.unwrap_or(normalized.category),
            reference_values: self.reference_values,
            deduction_rate_percent: Some(
                coerce_entered(self.deduction_rate_percent.as_ref()).unwrap_or(default_rate),
            ),
            deposit_amount: coerce_entered(self.deposit_amount.as_ref()),
            adjustment: self.adjustment.as_ref().map(RawAdjustment::to_adjustment),
            opening_advance: coerce_entered(self.opening_advance.as_ref()),
            cutting_fee: coerce_entered(self.cutting_fee.as_ref()),
        }
    }
}

/// Request body for a batch submission.
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    /// Customers the batch is opened for.
    pub customer_ids: Vec<CustomerId>,
    /// Entries, at most one per customer.
    #[serde(default)]
    pub entries: Vec<BatchEntryRequest>,
}

/// Response for a batch submission.
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    /// Settlements persisted.
    pub success_count: usize,
    /// Entries rejected or failed.
    pub failure_count: usize,
    /// Persisted settlements.
    pub persisted: Vec<SettlementResponse>,
    /// Per-customer failures.
    pub failures: Vec<SubmissionFailure>,
    /// Customers whose entries carried no data.
    pub skipped: Vec<CustomerId>,
}

impl From<BatchOutcome> for BatchResponse {
    fn from(outcome: BatchOutcome) -> Self {
        Self {
            success_count: outcome.success_count(),
            failure_count: outcome.failure_count(),
            persisted: outcome
                .persisted
                .into_iter()
                .map(SettlementResponse::from)
                .collect(),
            failures: outcome.failures,
            skipped: outcome.skipped,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /settlements/preview
async fn preview_settlement(
    State(state): State<AppState>,
    Json(request): Json<SettlementRequest>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let draft = request.into_draft(state.settlement.default_deduction_rate_percent);

    if draft.rows.len() > MAX_ROWS {
        return Err(SettlementError::TooManyRows {
            count: draft.rows.len(),
            max: MAX_ROWS,
        }
        .into());
    }

    let breakdown = SettlementCalculator::compute(&draft.rows, &draft.scalars);
    Ok(Json(PreviewResponse {
        direction: BalanceDirection::of(breakdown.closing_balance),
        closing_balance_display: display_amount(breakdown.closing_balance),
        breakdown,
    }))
}

/// POST /settlements
async fn create_settlement(
    State(state): State<AppState>,
    Json(request): Json<SettlementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let status = if request.id.is_some() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    let record = save(&state, request).await?;
    Ok((status, Json(SettlementResponse::from(record))))
}

/// PUT /settlements/{settlement_id}
async fn replace_settlement(
    State(state): State<AppState>,
    Path(settlement_id): Path<SettlementId>,
    Json(mut request): Json<SettlementRequest>,
) -> Result<Json<SettlementResponse>, ApiError> {
    request.id = Some(settlement_id);

    let record = save(&state, request).await?;
    Ok(Json(SettlementResponse::from(record)))
}

/// GET /settlements/{settlement_id}
async fn get_settlement(
    State(state): State<AppState>,
    Path(settlement_id): Path<SettlementId>,
) -> Result<Json<SettlementResponse>, ApiError> {
    let record = state
        .store
        .find(settlement_id)
        .await
        .map_err(SettlementError::Load)?
        .ok_or(SettlementError::NotFound(settlement_id))?;

    Ok(Json(SettlementResponse::from(record)))
}

/// DELETE /settlements/{settlement_id}
async fn delete_settlement(
    State(state): State<AppState>,
    Path(settlement_id): Path<SettlementId>,
) -> Result<StatusCode, ApiError> {
    SettlementService::delete(state.store.as_ref(), settlement_id).await?;

    info!(settlement_id = %settlement_id, "Settlement deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /settlements/batch
async fn submit_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    if request.customer_ids.is_empty() {
        return Err(AppError::Validation("At least one customer must be selected".into()).into());
    }

    let now = Utc::now();
    let history = batch_history(&state, &request.customer_ids, now).await?;
    let builder =
        BatchSettlementBuilder::open(&state.resolver, &request.customer_ids, &history, now);

    let default_rate = state.settlement.default_deduction_rate_percent;
    let entries = request
        .entries
        .into_iter()
        .map(|entry| entry.into_entry(default_rate))
        .collect();

    let outcome = builder
        .submit(
            state.store.as_ref(),
            entries,
            state.settlement.batch_concurrency,
            now,
        )
        .await;

    Ok(Json(BatchResponse::from(outcome)))
}

// ============================================================================
// Helper Functions
// ============================================================================

async fn save(
    state: &AppState,
    request: SettlementRequest,
) -> Result<SettlementRecord, SettlementError> {
    let draft = request.into_draft(state.settlement.default_deduction_rate_percent);
    let record = SettlementService::submit(state.store.as_ref(), draft, Utc::now()).await?;

    info!(
        settlement_id = ?record.id,
        customer_id = %record.customer_id,
        closing_balance = %record.breakdown.closing_balance,
        "Settlement saved"
    );
    Ok(record)
}

/// Loads what a batch is seeded from: each customer's history plus the
/// current business day across all customers.
async fn batch_history(
    state: &AppState,
    customers: &[CustomerId],
    now: DateTime<Utc>,
) -> Result<Vec<SettlementRecord>, SettlementError> {
    let (start, end) = state.resolver.day_bounds(state.resolver.business_day(now));
    let mut history = state
        .store
        .settlements_between(start, end)
        .await
        .map_err(SettlementError::Load)?;

    let mut seen = HashSet::with_capacity(customers.len());
    for &customer_id in customers {
        if !seen.insert(customer_id) {
            continue;
        }
        let records = state
            .store
            .history_for_customer(customer_id)
            .await
            .map_err(SettlementError::Load)?;
        history.extend(records);
    }

    Ok(history)
}
