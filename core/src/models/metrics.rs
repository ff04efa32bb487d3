use serde::{Deserialize, Serialize};

use super::OptionSide;
use super::fields::FieldValues;

/// A value per option side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SidePair<T> {
    pub call: T,
    pub put: T,
}

impl<T> SidePair<T> {
    pub fn new(call: T, put: T) -> Self {
        Self { call, put }
    }

    /// Builds both sides from the same function.
    pub fn from_fn(mut f: impl FnMut(OptionSide) -> T) -> Self {
        Self {
            call: f(OptionSide::Call),
            put: f(OptionSide::Put),
        }
    }

    pub fn get(&self, side: OptionSide) -> &T {
        match side {
            OptionSide::Call => &self.call,
            OptionSide::Put => &self.put,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> SidePair<U> {
        SidePair {
            call: f(&self.call),
            put: f(&self.put),
        }
    }

    pub fn zip<'a, U, R>(
        &'a self,
        other: &'a SidePair<U>,
        mut f: impl FnMut(&'a T, &'a U) -> R,
    ) -> SidePair<R> {
        SidePair {
            call: f(&self.call, &other.call),
            put: f(&self.put, &other.put),
        }
    }
}

/// Per-side field sums. Difference and difference-percent records share this shape.
pub type TotalsRecord = SidePair<FieldValues>;

/// Average bid/ask prices over the tight near-the-money window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpreadQuote {
    pub bid_avg: f64,
    pub ask_avg: f64,
}

/// Engine output for one chain snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsResult {
    pub current_price: f64,
    pub totals: TotalsRecord,
    pub difference: TotalsRecord,
    pub difference_percent: TotalsRecord,
    pub bid_ask_imbalance: SidePair<f64>,
    pub bid_ask_spread: SidePair<SpreadQuote>,
}

impl MetricsResult {
    /// Defined response for a chain with no strikes.
    pub fn empty(current_price: f64) -> Self {
        Self {
            current_price,
            totals: TotalsRecord::default(),
            difference: TotalsRecord::default(),
            difference_percent: TotalsRecord::default(),
            bid_ask_imbalance: SidePair::default(),
            bid_ask_spread: SidePair::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_result_matches_output_boundary() {
        let v = serde_json::to_value(MetricsResult::empty(0.0)).unwrap();
        assert_eq!(
            v,
            json!({
                "current_price": 0.0,
                "totals": {"call": {}, "put": {}},
                "difference": {"call": {}, "put": {}},
                "difference_percent": {"call": {}, "put": {}},
                "bid_ask_imbalance": {"call": 0.0, "put": 0.0},
                "bid_ask_spread": {
                    "call": {"bid_avg": 0.0, "ask_avg": 0.0},
                    "put": {"bid_avg": 0.0, "ask_avg": 0.0}
                }
            })
        );
    }

    #[test]
    fn side_pair_zip_and_map() {
        let a = SidePair::new(3.0, 5.0);
        let b = SidePair::new(1.0, 2.0);
        assert_eq!(a.zip(&b, |x, y| x - y), SidePair::new(2.0, 3.0));
        assert_eq!(a.map(|x| x * 2.0), SidePair::new(6.0, 10.0));
        assert_eq!(*a.get(OptionSide::Put), 5.0);
        assert_eq!(
            SidePair::from_fn(|s| s.as_str()),
            SidePair::new("call", "put")
        );
    }
}
