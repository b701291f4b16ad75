//! Settlement domain types.
//!
//! These are the canonical shapes the calculators work on. Loosely-typed input
//! (legacy field names, numbers as text) is converted into them once, by
//! [`super::normalize`].

use bahi_shared::types::{CustomerId, SettlementId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Maximum number of entry rows accepted on one settlement.
pub const MAX_ROWS: usize = 10;

/// Deduction rate used when none is supplied.
pub const DEFAULT_DEDUCTION_RATE_PERCENT: Decimal = Decimal::TEN;

/// Label of an entry row.
///
/// Two labels are canonical and carry a default multiplier; any other label is
/// vendor-defined and unscaled unless a multiplier is entered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RowKind {
    /// First canonical row.
    First,
    /// Second canonical row.
    Second,
    /// Vendor-defined label.
    Custom(String),
}

impl RowKind {
    /// Multiplier a row of this kind starts with.
    #[must_use]
    pub fn default_multiplier(&self) -> Option<Decimal> {
        match self {
            Self::First => Some(Decimal::from(8)),
            Self::Second => Some(Decimal::from(9)),
            Self::Custom(_) => None,
        }
    }

    /// Returns the label as stored.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::First => "first",
            Self::Second => "second",
            Self::Custom(label) => label,
        }
    }
}

impl From<String> for RowKind {
    fn from(label: String) -> Self {
        match label.trim() {
            "first" | "आ." | "आ" => Self::First,
            "second" | "कु." | "कु" => Self::Second,
            _ => Self::Custom(label),
        }
    }
}

impl From<RowKind> for String {
    fn from(kind: RowKind) -> Self {
        kind.label().to_string()
    }
}

/// Classification tag of the first product pair. No numeric effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairMode {
    /// Single ("sp").
    #[default]
    #[serde(alias = "sp")]
    Single,
    /// Double ("dp").
    #[serde(alias = "dp")]
    Double,
}

impl PairMode {
    /// Parses a stored tag, falling back to the default for unknown values.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "dp" | "double" => Self::Double,
            _ => Self::Single,
        }
    }
}

/// Category of the third product pair, shared by every row of a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairCategory {
    /// Jackpot.
    #[default]
    Jackpot,
    /// Sum ("berij").
    #[serde(alias = "berij")]
    Sum,
    /// Difference ("frak").
    #[serde(alias = "frak")]
    Difference,
}

impl PairCategory {
    /// Parses a stored tag, returning `None` for unknown values.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "jackpot" => Some(Self::Jackpot),
            "sum" | "berij" => Some(Self::Sum),
            "difference" | "frak" => Some(Self::Difference),
            _ => None,
        }
    }

    /// Column label shown for the third pair.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Jackpot => "jackpot",
            Self::Sum => "sum",
            Self::Difference => "difference",
        }
    }
}

/// Two values whose product contributes to a payout total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductPair {
    /// First factor.
    pub v1: Decimal,
    /// Second factor.
    pub v2: Decimal,
}

impl ProductPair {
    /// Creates a pair.
    #[must_use]
    pub const fn new(v1: Decimal, v2: Decimal) -> Self {
        Self { v1, v2 }
    }

    /// Returns true if both factors are zero.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.v1.is_zero() && self.v2.is_zero()
    }
}

/// One line of wagering activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRow {
    /// Row label.
    pub kind: RowKind,
    /// Gross amount attributed to this row.
    pub income_amount: Decimal,
    /// Expression text scaled by the multiplier.
    pub field_a: String,
    /// Expression text scaled by ten times the multiplier.
    pub field_b: String,
    /// Expression text scaled by the multiplier.
    pub field_c: String,
    /// Optional multiplier; absent means the fields count unscaled, for any kind.
    pub multiplier: Option<Decimal>,
    /// First product pair.
    pub pair_a: ProductPair,
    /// Classification of the first product pair.
    pub pair_a_mode: PairMode,
    /// Second product pair.
    pub pair_b: ProductPair,
    /// Third product pair; its category lives on the settlement.
    pub pair_c: ProductPair,
}

impl EntryRow {
    /// Creates an empty row of the given kind with that kind's default multiplier.
    #[must_use]
    pub fn new(kind: RowKind) -> Self {
        let multiplier = kind.default_multiplier();
        Self {
            kind,
            income_amount: Decimal::ZERO,
            field_a: String::new(),
            field_b: String::new(),
            field_c: String::new(),
            multiplier,
            pair_a: ProductPair::default(),
            pair_a_mode: PairMode::default(),
            pair_b: ProductPair::default(),
            pair_c: ProductPair::default(),
        }
    }

    /// The two rows a fresh settlement starts with.
    #[must_use]
    pub fn initial_rows() -> Vec<Self> {
        vec![Self::new(RowKind::First), Self::new(RowKind::Second)]
    }

    /// Returns true if nothing has been entered on this row.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.income_amount.is_zero()
            && self.field_a.trim().is_empty()
            && self.field_b.trim().is_empty()
            && self.field_c.trim().is_empty()
            && self.pair_a.is_blank()
            && self.pair_b.is_blank()
            && self.pair_c.is_blank()
    }
}

/// Day-level open/close/jod reference figures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ReferenceValues {
    /// Opening figure.
    #[serde(default)]
    pub open: String,
    /// Closing figure.
    #[serde(default)]
    pub close: String,
    /// Jod figure.
    #[serde(default)]
    pub jod: String,
}

impl ReferenceValues {
    /// Returns true if no reference figure has been entered.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.open.trim().is_empty() && self.close.trim().is_empty() && self.jod.trim().is_empty()
    }
}

/// How the adjustment step is supplied. The two modes are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AdjustmentInput {
    /// Amount entered directly. May be negative, which raises the closing balance.
    Manual {
        /// Entered amount.
        amount: Decimal,
    },
    /// Percentage of the pre-adjustment total.
    Rate {
        /// Percentage applied.
        percent: Decimal,
    },
}

impl AdjustmentInput {
    /// Returns true for the rate-derived mode.
    #[must_use]
    pub const fn uses_rate(&self) -> bool {
        matches!(self, Self::Rate { .. })
    }
}

impl Default for AdjustmentInput {
    fn default() -> Self {
        Self::Manual {
            amount: Decimal::ZERO,
        }
    }
}

/// Per-settlement manual inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementScalars {
    /// Percentage deducted from gross income.
    #[serde(default = "default_deduction_rate")]
    pub deduction_rate_percent: Decimal,
    /// Balance carried in from the prior settlement. Positive means the customer owes.
    #[serde(default)]
    pub opening_pending_balance: Decimal,
    /// Advance carried in or entered.
    #[serde(default)]
    pub opening_advance: Decimal,
    /// Cutting fee deducted from the advance.
    #[serde(default)]
    pub cutting_fee: Decimal,
    /// Deposit deducted before the adjustment step.
    #[serde(default)]
    pub deposit_amount: Decimal,
    /// Adjustment mode and value.
    #[serde(default)]
    pub adjustment: AdjustmentInput,
    /// Day-level reference figures.
    #[serde(default)]
    pub reference_values: ReferenceValues,
}

fn default_deduction_rate() -> Decimal {
    DEFAULT_DEDUCTION_RATE_PERCENT
}

impl Default for SettlementScalars {
    fn default() -> Self {
        Self {
            deduction_rate_percent: DEFAULT_DEDUCTION_RATE_PERCENT,
            opening_pending_balance: Decimal::ZERO,
            opening_advance: Decimal::ZERO,
            cutting_fee: Decimal::ZERO,
            deposit_amount: Decimal::ZERO,
            adjustment: AdjustmentInput::default(),
            reference_values: ReferenceValues::default(),
        }
    }
}

impl SettlementScalars {
    /// Scalars pre-filled from a carry-over seed.
    #[must_use]
    pub fn seeded(seed: &CustomerLedgerSeed) -> Self {
        Self {
            opening_pending_balance: seed.opening_pending_balance,
            opening_advance: seed.opening_advance,
            reference_values: seed.reference_values.clone(),
            ..Self::default()
        }
    }
}

/// The six payout aggregates produced by the row calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RowTotals {
    /// Multiplier-scaled `field_a`.
    pub field_a_total: Decimal,
    /// `field_b` scaled by ten times the multiplier.
    pub field_b_total: Decimal,
    /// Multiplier-scaled `field_c`.
    pub field_c_total: Decimal,
    /// Product of the first pair.
    pub pair_a_total: Decimal,
    /// Product of the second pair.
    pub pair_b_total: Decimal,
    /// Product of the third pair.
    pub pair_c_total: Decimal,
}

/// Itemized settlement breakdown. Every intermediate step is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SettlementBreakdown {
    /// Payout aggregates across all rows.
    #[serde(flatten)]
    pub row_totals: RowTotals,
    /// Sum of row incomes.
    pub gross_income: Decimal,
    /// Sum of the six payout aggregates.
    pub payout_total: Decimal,
    /// Gross income times the deduction rate.
    pub deduction_amount: Decimal,
    /// Gross income less deduction.
    pub net_after_deduction: Decimal,
    /// Net after deduction less payout.
    pub balance_before_carry: Decimal,
    /// Balance plus the opening pending balance.
    pub total_due: Decimal,
    /// Total due less deposit.
    pub pre_adjustment_total: Decimal,
    /// Entered or rate-derived adjustment.
    pub adjustment: Decimal,
    /// Signed final balance. Positive means the customer owes the vendor.
    pub closing_balance: Decimal,
    /// Opening advance less cutting fee.
    pub advance_net: Decimal,
}

/// A persisted settlement for one customer on one occasion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRecord {
    /// Identity, absent until first save.
    pub id: Option<SettlementId>,
    /// Owning customer.
    pub customer_id: CustomerId,
    /// When the settlement occurred.
    pub occurred_at: DateTime<Utc>,
    /// Entry rows in display order.
    pub rows: Vec<EntryRow>,
    /// Category of the third pair for all rows.
    pub pair_c_category: PairCategory,
    /// Manual inputs.
    pub scalars: SettlementScalars,
    /// Breakdown computed at save time.
    pub breakdown: SettlementBreakdown,
}

/// Unsaved settlement input.
///
/// The customer may still be unbound; the breakdown is derived on submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettlementDraft {
    /// Identity of the settlement being replaced, if any.
    pub id: Option<SettlementId>,
    /// Customer, once selected.
    pub customer_id: Option<CustomerId>,
    /// Explicit occurrence time; "now" when absent.
    pub occurred_at: Option<DateTime<Utc>>,
    /// Entry rows.
    pub rows: Vec<EntryRow>,
    /// Category of the third pair.
    pub pair_c_category: PairCategory,
    /// Manual inputs.
    pub scalars: SettlementScalars,
}

impl SettlementDraft {
    /// Creates a draft for a customer with the two initial rows.
    #[must_use]
    pub fn for_customer(customer_id: CustomerId, scalars: SettlementScalars) -> Self {
        Self {
            customer_id: Some(customer_id),
            rows: EntryRow::initial_rows(),
            scalars,
            ..Self::default()
        }
    }
}

/// Values that seed a new settlement. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomerLedgerSeed {
    /// Closing balance of the customer's latest settlement.
    pub opening_pending_balance: Decimal,
    /// Advance net of the customer's latest settlement.
    pub opening_advance: Decimal,
    /// Reference figures of the day's latest settlement across all customers.
    pub reference_values: ReferenceValues,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_row_kind_default_multipliers() {
        assert_eq!(RowKind::First.default_multiplier(), Some(dec!(8)));
        assert_eq!(RowKind::Second.default_multiplier(), Some(dec!(9)));
        assert_eq!(RowKind::Custom("extra".into()).default_multiplier(), None);
    }

    #[test]
    fn test_row_kind_from_legacy_labels() {
        assert_eq!(RowKind::from("आ.".to_string()), RowKind::First);
        assert_eq!(RowKind::from("कु".to_string()), RowKind::Second);
        assert_eq!(RowKind::from("second".to_string()), RowKind::Second);
        assert_eq!(
            RowKind::from("night".to_string()),
            RowKind::Custom("night".into())
        );
    }

    #[test]
    fn test_row_kind_serializes_as_label() {
        let json = serde_json::to_string(&RowKind::First).unwrap();
        assert_eq!(json, "\"first\"");
        let kind: RowKind = serde_json::from_str("\"evening\"").unwrap();
        assert_eq!(kind, RowKind::Custom("evening".into()));
    }

    #[test]
    fn test_pair_tags_fall_back_to_defaults() {
        assert_eq!(PairMode::from_tag("DP"), PairMode::Double);
        assert_eq!(PairMode::from_tag("sd"), PairMode::Single);
        assert_eq!(PairCategory::from_tag("berij"), Some(PairCategory::Sum));
        assert_eq!(PairCategory::from_tag("frak"), Some(PairCategory::Difference));
        assert_eq!(PairCategory::from_tag("other"), None);
    }

    #[test]
    fn test_new_row_is_blank() {
        let row = EntryRow::new(RowKind::First);
        assert!(row.is_blank());
        assert_eq!(row.multiplier, Some(dec!(8)));
    }

    #[test]
    fn test_row_with_expression_is_not_blank() {
        let mut row = EntryRow::new(RowKind::Custom(String::new()));
        row.field_b = "4+".into();
        assert!(!row.is_blank());
    }

    #[test]
    fn test_adjustment_input_serde_tag() {
        let json = serde_json::to_value(AdjustmentInput::Rate { percent: dec!(20) }).unwrap();
        assert_eq!(json["mode"], "rate");
        let manual: AdjustmentInput =
            serde_json::from_str(r#"{"mode":"manual","amount":"-50"}"#).unwrap();
        assert_eq!(manual, AdjustmentInput::Manual { amount: dec!(-50) });
        assert!(!manual.uses_rate());
    }

    #[test]
    fn test_scalars_default_deduction_rate() {
        let scalars: SettlementScalars = serde_json::from_str("{}").unwrap();
        assert_eq!(scalars.deduction_rate_percent, dec!(10));
        assert_eq!(scalars.adjustment, AdjustmentInput::default());
    }
}
