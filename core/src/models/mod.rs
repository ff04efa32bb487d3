use serde::{Deserialize, Serialize};

pub mod chain;
pub mod fields;
pub mod metrics;

pub use chain::{ChainSnapshot, OptionLeg, SideQuote, StrikeQuote};
pub use fields::{FieldValues, MetricField, UnknownField};
pub use metrics::{MetricsResult, SidePair, SpreadQuote, TotalsRecord};

/// Option side of a strike.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OptionSide {
    Call,
    Put,
}

impl OptionSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionSide::Call => "call",
            OptionSide::Put => "put",
        }
    }
}
