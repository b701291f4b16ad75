//! Normalization of loosely-typed entry rows.
//!
//! Rows arrive from clients and from older stored settlements in several
//! shapes: canonical field names or the short legacy ones (`o`, `jod`, `ko`,
//! `pan`, `gun`, `special`), numbers as JSON numbers or as text, and the third
//! pair split across `jackpot` / `berij` / `frak` keys. [`normalize_rows`]
//! turns any of these into canonical [`EntryRow`]s once, so the calculators
//! never see the raw shapes.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde::de::IgnoredAny;

use super::types::{AdjustmentInput, EntryRow, PairCategory, PairMode, ProductPair, RowKind};

/// A numeric field as entered: a number, text, or something unusable.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LooseValue {
    /// Already numeric.
    Number(Decimal),
    /// Free text.
    Text(String),
    /// Any other JSON value; coerces to zero.
    Other(IgnoredAny),
}

impl LooseValue {
    /// Best-effort numeric coercion. Blank or non-numeric input is zero.
    #[must_use]
    pub fn to_decimal(&self) -> Decimal {
        match self {
            Self::Number(value) => *value,
            Self::Text(text) => parse_decimal(text),
            Self::Other(_) => Decimal::ZERO,
        }
    }

    /// Text form used for expression fields.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Number(value) => value.normalize().to_string(),
            Self::Text(text) => text.clone(),
            Self::Other(_) => String::new(),
        }
    }
}

fn parse_decimal(text: &str) -> Decimal {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .unwrap_or(Decimal::ZERO)
}

fn coerce(value: Option<&LooseValue>) -> Decimal {
    value.map_or(Decimal::ZERO, LooseValue::to_decimal)
}

/// Coerces an entered value, keeping `None` when nothing was sent.
#[must_use]
pub fn coerce_entered(value: Option<&LooseValue>) -> Option<Decimal> {
    value.map(LooseValue::to_decimal)
}

/// An adjustment as entered, before its value is coerced.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RawAdjustment {
    /// Amount entered directly.
    Manual {
        /// Entered amount.
        #[serde(default)]
        amount: Option<LooseValue>,
    },
    /// Percentage of the pre-adjustment total.
    Rate {
        /// Percentage applied.
        #[serde(default)]
        percent: Option<LooseValue>,
    },
}

impl RawAdjustment {
    /// Converts to the canonical input; a blank or unusable value is zero.
    #[must_use]
    pub fn to_adjustment(&self) -> AdjustmentInput {
        match self {
            Self::Manual { amount } => AdjustmentInput::Manual {
                amount: coerce(amount.as_ref()),
            },
            Self::Rate { percent } => AdjustmentInput::Rate {
                percent: coerce(percent.as_ref()),
            },
        }
    }
}

/// A product pair in any stored shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPair {
    /// First factor.
    #[serde(default, alias = "val1")]
    pub v1: Option<LooseValue>,
    /// Second factor.
    #[serde(default, alias = "val2")]
    pub v2: Option<LooseValue>,
    /// Mode or category tag carried on the pair.
    #[serde(default, rename = "type", alias = "mode", alias = "category")]
    pub tag: Option<String>,
}

impl RawPair {
    fn to_pair(&self) -> ProductPair {
        ProductPair::new(coerce(self.v1.as_ref()), coerce(self.v2.as_ref()))
    }
}

/// A pair field that older rows stored as a single bare value.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawPairField {
    /// Object with two factors.
    Pair(RawPair),
    /// Bare value, taken as the first factor.
    Bare(LooseValue),
}

impl RawPairField {
    fn into_pair(self) -> RawPair {
        match self {
            Self::Pair(pair) => pair,
            Self::Bare(value) => RawPair {
                v1: Some(value),
                ..RawPair::default()
            },
        }
    }
}

/// An entry row as received, before normalization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEntryRow {
    /// Row label.
    #[serde(default, alias = "type")]
    pub kind: Option<String>,
    /// Gross income.
    #[serde(default, alias = "income")]
    pub income_amount: Option<LooseValue>,
    /// First scaled field.
    #[serde(default, alias = "o")]
    pub field_a: Option<LooseValue>,
    /// Tens-quoted scaled field.
    #[serde(default, alias = "jod")]
    pub field_b: Option<LooseValue>,
    /// Third scaled field.
    #[serde(default, alias = "ko")]
    pub field_c: Option<LooseValue>,
    /// Multiplier. `Some(None)` is an explicit null: the row is unscaled.
    #[serde(default, deserialize_with = "present")]
    pub multiplier: Option<Option<LooseValue>>,
    /// First pair.
    #[serde(default, alias = "pan")]
    pub pair_a: Option<RawPairField>,
    /// Explicit mode of the first pair.
    #[serde(default)]
    pub pair_a_mode: Option<String>,
    /// Second pair.
    #[serde(default, alias = "gun")]
    pub pair_b: Option<RawPairField>,
    /// Third pair.
    #[serde(default, alias = "special")]
    pub pair_c: Option<RawPairField>,
    /// Legacy third pair stored under its category name.
    #[serde(default)]
    pub jackpot: Option<RawPair>,
    /// Legacy third pair stored under its category name.
    #[serde(default)]
    pub berij: Option<RawPair>,
    /// Legacy third pair stored under its category name.
    #[serde(default)]
    pub frak: Option<RawPair>,
}

impl RawEntryRow {
    /// Converts to a canonical row, returning the pair category the row carried.
    #[must_use]
    pub fn into_entry_row(self) -> (EntryRow, Option<PairCategory>) {
        let kind = RowKind::from(self.kind.unwrap_or_default());
        let multiplier = match &self.multiplier {
            Some(Some(LooseValue::Other(_))) | None => kind.default_multiplier(),
            Some(None) => None,
            Some(Some(value)) => Some(value.to_decimal()),
        };

        let pair_a = self.pair_a.map(RawPairField::into_pair).unwrap_or_default();
        let pair_a_mode = self
            .pair_a_mode
            .as_deref()
            .or(pair_a.tag.as_deref())
            .map_or_else(PairMode::default, PairMode::from_tag);

        let (pair_c, category) = match (self.pair_c, self.jackpot, self.berij, self.frak) {
            (Some(special), ..) => {
                let special = special.into_pair();
                let category = special.tag.as_deref().and_then(PairCategory::from_tag);
                (special.to_pair(), category)
            }
            (None, Some(pair), ..) => (pair.to_pair(), Some(PairCategory::Jackpot)),
            (None, None, Some(pair), _) => (pair.to_pair(), Some(PairCategory::Sum)),
            (None, None, None, Some(pair)) => (pair.to_pair(), Some(PairCategory::Difference)),
            (None, None, None, None) => (ProductPair::default(), None),
        };

        let row = EntryRow {
            kind,
            income_amount: coerce(self.income_amount.as_ref()),
            field_a: text(self.field_a.as_ref()),
            field_b: text(self.field_b.as_ref()),
            field_c: text(self.field_c.as_ref()),
            multiplier,
            pair_a: pair_a.to_pair(),
            pair_a_mode,
            pair_b: self
                .pair_b
                .map(RawPairField::into_pair)
                .unwrap_or_default()
                .to_pair(),
            pair_c,
        };

        (row, category)
    }
}

/// Distinguishes an explicit `null` from a missing key.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn text(value: Option<&LooseValue>) -> String {
    value.map(LooseValue::to_text).unwrap_or_default()
}

/// Canonical rows and the settlement-wide category they resolve to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRows {
    /// Rows in input order.
    pub rows: Vec<EntryRow>,
    /// Category taken from the first row that carries one.
    pub category: PairCategory,
}

/// Normalizes raw rows into canonical rows and one settlement-level category.
#[must_use]
pub fn normalize_rows(raw: Vec<RawEntryRow>) -> NormalizedRows {
    let mut category = None;
    let rows = raw
        .into_iter()
        .map(|raw_row| {
            let (row, row_category) = raw_row.into_entry_row();
            category = category.or(row_category);
            row
        })
        .collect();

    NormalizedRows {
        rows,
        category: category.unwrap_or_default(),
    }
}
