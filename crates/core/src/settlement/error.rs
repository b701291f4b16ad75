//! Settlement error types.
//!
//! Calculators never fail. Errors only arise at the submission boundary:
//! a draft that cannot be submitted, or a persistence call that failed.

use bahi_shared::types::{CustomerId, SettlementId};
use thiserror::Error;

/// Errors raised by a settlement store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// No settlement with this id exists.
    #[error("Settlement not found: {0}")]
    NotFound(SettlementId),

    /// The backing store failed.
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Step of a submission at which it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStep {
    /// Checking the draft before persisting.
    Validate,
    /// Writing to the store.
    Persist,
}

impl std::fmt::Display for SubmissionStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validate => f.write_str("validate"),
            Self::Persist => f.write_str("persist"),
        }
    }
}

/// Errors that can occur while submitting or managing settlements.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// The draft has no customer bound.
    #[error("A customer must be selected before submitting a settlement")]
    MissingCustomer,

    /// The draft has more rows than a settlement may hold.
    #[error("Settlement has {count} rows, at most {max} are allowed")]
    TooManyRows {
        /// Rows on the draft.
        count: usize,
        /// Allowed maximum.
        max: usize,
    },

    /// The customer was not part of the batch being submitted.
    #[error("Customer {0} is not part of this batch")]
    NotInBatch(CustomerId),

    /// The batch already holds an entry for this customer.
    #[error("Customer {0} already has an entry in this batch")]
    DuplicateEntry(CustomerId),

    /// The settlement to replace or delete does not exist.
    #[error("Settlement not found: {0}")]
    NotFound(SettlementId),

    /// Persisting a customer's settlement failed.
    #[error("Submission for customer {customer_id} failed at {step}: {source}")]
    Submission {
        /// Customer whose settlement failed.
        customer_id: CustomerId,
        /// Step that failed.
        step: SubmissionStep,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// Loading settlements failed.
    #[error("Failed to load settlements: {0}")]
    Load(#[source] StoreError),
}

impl SettlementError {
    /// Wraps a store error raised while persisting for `customer_id`.
    #[must_use]
    pub fn persist(customer_id: CustomerId, source: StoreError) -> Self {
        match source {
            StoreError::NotFound(id) => Self::NotFound(id),
            source => Self::Submission {
                customer_id,
                step: SubmissionStep::Persist,
                source,
            },
        }
    }

    /// Step at which this error stopped a submission.
    #[must_use]
    pub const fn step(&self) -> SubmissionStep {
        match self {
            Self::MissingCustomer
            | Self::TooManyRows { .. }
            | Self::NotInBatch(_)
            | Self::DuplicateEntry(_) => SubmissionStep::Validate,
            Self::Submission { step, .. } => *step,
            Self::NotFound(_) | Self::Load(_) => SubmissionStep::Persist,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingCustomer => "MISSING_CUSTOMER",
            Self::TooManyRows { .. } => "TOO_MANY_ROWS",
            Self::NotInBatch(_) => "NOT_IN_BATCH",
            Self::DuplicateEntry(_) => "DUPLICATE_ENTRY",
            Self::NotFound(_) => "SETTLEMENT_NOT_FOUND",
            Self::Submission { .. } => "SUBMISSION_FAILED",
            Self::Load(_) => "LOAD_FAILED",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - draft cannot be submitted
            Self::MissingCustomer
            | Self::TooManyRows { .. }
            | Self::NotInBatch(_)
            | Self::DuplicateEntry(_) => 400,

            // 404 Not Found
            Self::NotFound(_) => 404,

            // 500 Internal Server Error - store failures
            Self::Submission { .. } | Self::Load(_) => 500,
        }
    }
}
