use serde::{Deserialize, Deserializer, Serialize};

use super::OptionSide;
use super::fields::MetricField;

/// Two-sided market data for one option leg.
///
/// Missing or `null` fields read as `0.0`; fields the engine does not use
/// (`ltp`, `close_price`, ...) are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SideQuote {
    #[serde(default, deserialize_with = "null_as_zero")]
    pub oi: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub volume: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub iv: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub bid_qty: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub ask_qty: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub bid_price: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub ask_price: f64,
}

impl SideQuote {
    pub fn get(&self, field: MetricField) -> f64 {
        match field {
            MetricField::Oi => self.oi,
            MetricField::Volume => self.volume,
            MetricField::Iv => self.iv,
            MetricField::BidQty => self.bid_qty,
            MetricField::AskQty => self.ask_qty,
            MetricField::BidPrice => self.bid_price,
            MetricField::AskPrice => self.ask_price,
        }
    }
}

fn null_as_zero<'de, D>(d: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(d)?.unwrap_or(0.0))
}

/// Provider envelope around a leg's market data (`"call_options": {"market_data": {..}}`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionLeg {
    #[serde(default)]
    pub market_data: SideQuote,
}

/// One strike of the chain with both legs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrikeQuote {
    pub strike_price: f64,
    #[serde(default)]
    pub call_options: OptionLeg,
    #[serde(default)]
    pub put_options: OptionLeg,
}

impl StrikeQuote {
    pub fn new(strike_price: f64, call: SideQuote, put: SideQuote) -> Self {
        Self {
            strike_price,
            call_options: OptionLeg { market_data: call },
            put_options: OptionLeg { market_data: put },
        }
    }

    pub fn side(&self, side: OptionSide) -> &SideQuote {
        match side {
            OptionSide::Call => &self.call_options.market_data,
            OptionSide::Put => &self.put_options.market_data,
        }
    }
}

/// Point-in-time capture of every strike for one (instrument, expiry).
///
/// Immutable input to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    /// Reference (spot) price of the underlying, if the provider sent one.
    #[serde(default)]
    pub underlying_spot_price: Option<f64>,

    #[serde(default)]
    pub data: Vec<StrikeQuote>,
}

impl ChainSnapshot {
    pub fn new(underlying_spot_price: Option<f64>, data: Vec<StrikeQuote>) -> Self {
        Self {
            underlying_spot_price,
            data,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn strikes(&self) -> Vec<f64> {
        self.data.iter().map(|q| q.strike_price).collect()
    }

    /// Copy of the snapshot with the reference price replaced.
    pub fn with_reference_price(&self, price: f64) -> Self {
        Self {
            underlying_spot_price: Some(price),
            data: self.data.clone(),
        }
    }
}
