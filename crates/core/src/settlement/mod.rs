//! Settlement computation and balance carry-over.
//!
//! Rows are priced by [`RowTotals`], aggregated into a [`SettlementBreakdown`]
//! by [`SettlementCalculator`], and new settlements are seeded from history by
//! [`CarryOverResolver`]. [`BatchSettlementBuilder`] applies the same pipeline
//! to many customers at once.

pub mod batch;
pub mod cache;
pub mod calculator;
pub mod carry_over;
pub mod error;
pub mod expression;
pub mod normalize;
pub mod row;
pub mod service;
pub mod store;
pub mod summary;
pub mod types;

#[cfg(test)]
mod tests;

pub use batch::{BatchEntry, BatchOutcome, BatchPlan, BatchSettlementBuilder, SubmissionFailure};
pub use cache::SeedCache;
pub use calculator::SettlementCalculator;
pub use carry_over::CarryOverResolver;
pub use error::{SettlementError, StoreError, SubmissionStep};
pub use normalize::{
    LooseValue, NormalizedRows, RawAdjustment, RawEntryRow, coerce_entered, normalize_rows,
};
pub use service::SettlementService;
pub use store::{InMemorySettlementStore, SettlementStore};
pub use summary::{CustomerStatistics, LedgerSummary};
pub use types::{
    AdjustmentInput, CustomerLedgerSeed, EntryRow, MAX_ROWS, PairCategory, PairMode, ProductPair,
    ReferenceValues, RowKind, RowTotals, SettlementBreakdown, SettlementDraft, SettlementRecord,
    SettlementScalars,
};
