//! Batch settlement entry.
//!
//! A batch is opened for a set of customers, seeding each once from history.
//! Entries are then turned into drafts and submitted independently: one
//! customer's failure neither blocks nor rolls back the others.

use std::collections::{HashMap, HashSet};

use bahi_shared::types::CustomerId;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::carry_over::CarryOverResolver;
use super::error::{SettlementError, SubmissionStep};
use super::service::SettlementService;
use super::store::SettlementStore;
use super::types::{
    AdjustmentInput, EntryRow, PairCategory, ReferenceValues, SettlementDraft, SettlementRecord,
    SettlementScalars,
};

/// What was entered for one customer in a batch.
///
/// Scalar fields left empty keep the value seeded when the batch was opened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BatchEntry {
    /// Customer the entry belongs to.
    pub customer_id: CustomerId,
    /// Entry rows.
    #[serde(default)]
    pub rows: Vec<EntryRow>,
    /// Category of the third pair.
    #[serde(default)]
    pub pair_c_category: PairCategory,
    /// Reference figures entered for the day.
    #[serde(default)]
    pub reference_values: Option<ReferenceValues>,
    /// Deduction rate override.
    #[serde(default)]
    pub deduction_rate_percent: Option<Decimal>,
    /// Deposit.
    #[serde(default)]
    pub deposit_amount: Option<Decimal>,
    /// Adjustment.
    #[serde(default)]
    pub adjustment: Option<AdjustmentInput>,
    /// Advance override.
    #[serde(default)]
    pub opening_advance: Option<Decimal>,
    /// Cutting fee.
    #[serde(default)]
    pub cutting_fee: Option<Decimal>,
}

impl BatchEntry {
    /// Returns true if any row or reference figure was entered.
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.rows.iter().any(|row| !row.is_blank())
            || self
                .reference_values
                .as_ref()
                .is_some_and(|values| !values.is_blank())
    }

    fn apply_to(&self, seeded: &SettlementScalars) -> SettlementScalars {
        SettlementScalars {
            deduction_rate_percent: self
                .deduction_rate_percent
                .unwrap_or(seeded.deduction_rate_percent),
            opening_pending_balance: seeded.opening_pending_balance,
            opening_advance: self.opening_advance.unwrap_or(seeded.opening_advance),
            cutting_fee: self.cutting_fee.unwrap_or(seeded.cutting_fee),
            deposit_amount: self.deposit_amount.unwrap_or(seeded.deposit_amount),
            adjustment: self.adjustment.unwrap_or(seeded.adjustment),
            reference_values: self
                .reference_values
                .clone()
                .unwrap_or_else(|| seeded.reference_values.clone()),
        }
    }
}

/// A customer's submission that did not go through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionFailure {
    /// Customer whose settlement failed.
    pub customer_id: CustomerId,
    /// Step at which it failed.
    pub step: SubmissionStep,
    /// Error code of the cause.
    pub code: &'static str,
    /// Human-readable cause.
    pub cause: String,
}

impl SubmissionFailure {
    fn new(customer_id: CustomerId, error: &SettlementError) -> Self {
        Self {
            customer_id,
            step: error.step(),
            code: error.error_code(),
            cause: error.to_string(),
        }
    }
}

/// Drafts built from a batch, plus what could not become a draft.
#[derive(Debug, Clone, Default)]
pub struct BatchPlan {
    /// Ready-to-submit drafts.
    pub drafts: Vec<SettlementDraft>,
    /// Customers without entered data.
    pub skipped: Vec<CustomerId>,
    /// Entries refused before submission.
    pub rejected: Vec<SubmissionFailure>,
}

/// Result of submitting a batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    /// Settlements that were persisted.
    pub persisted: Vec<SettlementRecord>,
    /// Per-customer failures.
    pub failures: Vec<SubmissionFailure>,
    /// Customers excluded for lack of data.
    pub skipped: Vec<CustomerId>,
}

impl BatchOutcome {
    /// Number of persisted settlements.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.persisted.len()
    }

    /// Number of failed customers.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

/// Builds and submits settlements for many customers at once.
#[derive(Debug, Clone)]
pub struct BatchSettlementBuilder {
    opened_at: DateTime<Utc>,
    customers: Vec<CustomerId>,
    seeded: HashMap<CustomerId, SettlementScalars>,
}

impl BatchSettlementBuilder {
    /// Opens a batch, seeding every customer once from `history`.
    ///
    /// Duplicate customers are seeded once and keep their first position.
    #[must_use]
    pub fn open(
        resolver: &CarryOverResolver,
        customers: &[CustomerId],
        history: &[SettlementRecord],
        now: DateTime<Utc>,
    ) -> Self {
        let mut ordered = Vec::with_capacity(customers.len());
        let mut seeded = HashMap::with_capacity(customers.len());

        for &customer_id in customers {
            if seeded.contains_key(&customer_id) {
                continue;
            }
            let seed = resolver.resolve(customer_id, history, now);
            seeded.insert(customer_id, SettlementScalars::seeded(&seed));
            ordered.push(customer_id);
        }

        Self {
            opened_at: now,
            customers: ordered,
            seeded,
        }
    }

    /// When the batch was opened.
    #[must_use]
    pub const fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Customers in the batch, in opening order.
    #[must_use]
    pub fn customers(&self) -> &[CustomerId] {
        &self.customers
    }

    /// Scalars a customer's settlement starts from.
    #[must_use]
    pub fn seeded_scalars(&self, customer_id: CustomerId) -> Option<&SettlementScalars> {
        self.seeded.get(&customer_id)
    }

    /// Turns entries into drafts.
    ///
    /// Entries without data are skipped. Entries for customers outside the
    /// batch, repeated entries for a customer and entries with too many rows
    /// are rejected.
    #[must_use]
    pub fn build_drafts(&self, entries: Vec<BatchEntry>) -> BatchPlan {
        let mut plan = BatchPlan::default();
        let mut entered = HashSet::with_capacity(entries.len());

        for entry in entries {
            let customer_id = entry.customer_id;

            let Some(seeded) = self.seeded.get(&customer_id) else {
                let error = SettlementError::NotInBatch(customer_id);
                plan.rejected.push(SubmissionFailure::new(customer_id, &error));
                continue;
            };

            // First entry per customer wins.
            if !entered.insert(customer_id) {
                let error = SettlementError::DuplicateEntry(customer_id);
                plan.rejected.push(SubmissionFailure::new(customer_id, &error));
                continue;
            }

            if !entry.has_data() {
                plan.skipped.push(customer_id);
                continue;
            }

            let draft = SettlementDraft {
                id: None,
                customer_id: Some(customer_id),
                occurred_at: None,
                scalars: entry.apply_to(seeded),
                pair_c_category: entry.pair_c_category,
                rows: entry.rows,
            };

            match SettlementService::validate(&draft) {
                Ok(_) => plan.drafts.push(draft),
                Err(error) => plan.rejected.push(SubmissionFailure::new(customer_id, &error)),
            }
        }

        plan
    }

    /// Builds drafts and submits them with at most `concurrency` in flight.
    pub async fn submit(
        &self,
        store: &dyn SettlementStore,
        entries: Vec<BatchEntry>,
        concurrency: usize,
        now: DateTime<Utc>,
    ) -> BatchOutcome {
        let plan = self.build_drafts(entries);
        let mut outcome = BatchOutcome {
            persisted: Vec::with_capacity(plan.drafts.len()),
            failures: plan.rejected,
            skipped: plan.skipped,
        };

        let drafts = plan
            .drafts
            .into_iter()
            .filter_map(|draft| draft.customer_id.map(|customer_id| (customer_id, draft)));

        let results: Vec<_> = stream::iter(drafts)
            .map(|(customer_id, draft)| async move {
                (
                    customer_id,
                    SettlementService::submit(store, draft, now).await,
                )
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        for (customer_id, result) in results {
            match result {
                Ok(record) => outcome.persisted.push(record),
                Err(error) => {
                    warn!(
                        customer_id = %customer_id,
                        step = %error.step(),
                        error = %error,
                        "Batch submission failed"
                    );
                    outcome
                        .failures
                        .push(SubmissionFailure::new(customer_id, &error));
                }
            }
        }

        info!(
            success_count = outcome.success_count(),
            failure_count = outcome.failure_count(),
            skipped = outcome.skipped.len(),
            "Batch submitted"
        );

        outcome
    }
}
