use corelib::MetricField;

use crate::metrics::imbalance::DEFAULT_IMBALANCE_WEIGHT;
use crate::window::WindowSpec;

/// Engine tuning. `Default` reproduces the production constants.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Fields summed into totals and diffed against the baseline.
    pub fields: Vec<MetricField>,

    /// Window for totals and imbalance.
    pub liquidity_window: WindowSpec,

    /// Window for the bid/ask spread averages.
    pub spread_window: WindowSpec,

    /// Fixed per-strike weight applied to each imbalance contribution.
    pub imbalance_weight: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fields: MetricField::TOTALS.to_vec(),
            liquidity_window: WindowSpec::LIQUIDITY,
            spread_window: WindowSpec::SPREAD,
            imbalance_weight: DEFAULT_IMBALANCE_WEIGHT,
        }
    }
}

impl EngineConfig {
    pub fn with_fields(mut self, fields: Vec<MetricField>) -> Self {
        self.fields = fields;
        self
    }
}
