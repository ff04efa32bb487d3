use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Numeric market-data field carried per option side.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    Oi,
    Volume,
    Iv,
    BidQty,
    AskQty,
    BidPrice,
    AskPrice,
}

impl MetricField {
    pub const ALL: [MetricField; 7] = [
        MetricField::Oi,
        MetricField::Volume,
        MetricField::Iv,
        MetricField::BidQty,
        MetricField::AskQty,
        MetricField::BidPrice,
        MetricField::AskPrice,
    ];

    /// Default field set summed into totals.
    pub const TOTALS: [MetricField; 5] = [
        MetricField::Oi,
        MetricField::Volume,
        MetricField::Iv,
        MetricField::BidQty,
        MetricField::AskQty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricField::Oi => "oi",
            MetricField::Volume => "volume",
            MetricField::Iv => "iv",
            MetricField::BidQty => "bid_qty",
            MetricField::AskQty => "ask_qty",
            MetricField::BidPrice => "bid_price",
            MetricField::AskPrice => "ask_price",
        }
    }

    /// Parse a comma-separated list such as `"oi,volume"`. Blank entries are ignored.
    pub fn parse_list(s: &str) -> Result<Vec<MetricField>, UnknownField> {
        s.split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(MetricField::from_str)
            .collect()
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown metric field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for MetricField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricField::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// Fixed-shape per-side accumulator: one slot per [`MetricField`].
///
/// A `None` slot means the field is not tracked in this record. Serialized as a
/// map of the tracked fields only, so a record with no tracked fields is `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid_qty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask_qty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask_price: Option<f64>,
}

impl FieldValues {
    /// Record with every field in `fields` tracked at zero.
    pub fn zeroed(fields: &[MetricField]) -> Self {
        let mut out = Self::default();
        for f in fields {
            out.set(*f, 0.0);
        }
        out
    }

    fn slot(&self, field: MetricField) -> &Option<f64> {
        match field {
            MetricField::Oi => &self.oi,
            MetricField::Volume => &self.volume,
            MetricField::Iv => &self.iv,
            MetricField::BidQty => &self.bid_qty,
            MetricField::AskQty => &self.ask_qty,
            MetricField::BidPrice => &self.bid_price,
            MetricField::AskPrice => &self.ask_price,
        }
    }

    fn slot_mut(&mut self, field: MetricField) -> &mut Option<f64> {
        match field {
            MetricField::Oi => &mut self.oi,
            MetricField::Volume => &mut self.volume,
            MetricField::Iv => &mut self.iv,
            MetricField::BidQty => &mut self.bid_qty,
            MetricField::AskQty => &mut self.ask_qty,
            MetricField::BidPrice => &mut self.bid_price,
            MetricField::AskPrice => &mut self.ask_price,
        }
    }

    pub fn get(&self, field: MetricField) -> Option<f64> {
        *self.slot(field)
    }

    /// Tracked value, or `0.0` when the field is absent.
    pub fn value_or_zero(&self, field: MetricField) -> f64 {
        self.get(field).unwrap_or(0.0)
    }

    pub fn set(&mut self, field: MetricField, value: f64) {
        *self.slot_mut(field) = Some(value);
    }

    /// Adds `value` into the slot, starting from zero if untracked.
    pub fn add(&mut self, field: MetricField, value: f64) {
        let slot = self.slot_mut(field);
        *slot = Some(slot.unwrap_or(0.0) + value);
    }

    pub fn is_empty(&self) -> bool {
        MetricField::ALL.iter().all(|f| self.get(*f).is_none())
    }

    /// Tracked `(field, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (MetricField, f64)> + '_ {
        MetricField::ALL
            .into_iter()
            .filter_map(|f| self.get(f).map(|v| (f, v)))
    }
}
