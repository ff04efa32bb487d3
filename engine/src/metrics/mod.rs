pub mod diff;
pub mod imbalance;
pub mod spread;
pub mod totals;

use corelib::{ChainSnapshot, MetricsResult, TotalsRecord};
use tracing::{Span, debug, field, instrument};

use crate::classify::{StrikeClassification, classify};
use crate::config::EngineConfig;
use crate::error::EngineError;

pub use diff::{compute_difference, compute_difference_percent};
pub use imbalance::bid_ask_imbalance;
pub use spread::bid_ask_spread;
pub use totals::aggregate_totals;

/// Stateless metrics engine. Safe to share and call concurrently.
///
/// Baseline handling is split in two steps so the caller can persist the
/// first totals for a series before diffing against them:
///
/// ```text
/// let analysis = engine.analyze(&snapshot)?;
/// let baseline = store.insert_baseline_if_absent(key, analysis.totals())?; // atomic
/// let result = analysis.finish(&baseline);
/// ```
///
/// The engine cannot enforce one-baseline-per-series itself; the store's
/// insert-if-absent must be atomic.
#[derive(Debug, Clone, Default)]
pub struct MetricsEngine {
    config: EngineConfig,
}

impl MetricsEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Classify strikes and compute totals.
    ///
    /// An empty chain yields a degenerate analysis that finishes to
    /// [`MetricsResult::empty`]. A non-empty chain without a reference price is
    /// rejected; callers substitute a price beforehand.
    #[instrument(
        target = "engine",
        level = "debug",
        skip_all,
        fields(strikes = chain.data.len(), atm = field::Empty)
    )]
    pub fn analyze<'a>(&'a self, chain: &'a ChainSnapshot) -> Result<ChainAnalysis<'a>, EngineError> {
        if chain.is_empty() {
            let price = chain
                .underlying_spot_price
                .filter(|p| p.is_finite())
                .unwrap_or(0.0);

            debug!(price, "empty chain; returning degenerate analysis");

            return Ok(ChainAnalysis {
                config: &self.config,
                chain,
                current_price: price,
                classification: None,
                totals: TotalsRecord::default(),
            });
        }

        let price = chain
            .underlying_spot_price
            .ok_or(EngineError::MissingReferencePrice)?;

        let classification = classify(price, &chain.strikes())?;
        Span::current().record("atm", classification.atm);

        let totals = aggregate_totals(
            chain,
            &classification,
            &self.config.fields,
            self.config.liquidity_window,
        );

        Ok(ChainAnalysis {
            config: &self.config,
            chain,
            current_price: price,
            classification: Some(classification),
            totals,
        })
    }

    /// One-shot computation. With no baseline the fresh totals act as their own
    /// baseline, so difference and percent come out as zero.
    pub fn compute(
        &self,
        chain: &ChainSnapshot,
        baseline: Option<&TotalsRecord>,
    ) -> Result<MetricsResult, EngineError> {
        let analysis = self.analyze(chain)?;
        Ok(match baseline {
            Some(b) => analysis.finish(b),
            None => analysis.finish(analysis.totals()),
        })
    }
}

/// Classified chain with totals, awaiting a baseline.
#[derive(Debug, Clone)]
pub struct ChainAnalysis<'a> {
    config: &'a EngineConfig,
    chain: &'a ChainSnapshot,
    current_price: f64,
    classification: Option<StrikeClassification>,
    totals: TotalsRecord,
}

impl ChainAnalysis<'_> {
    pub fn current_price(&self) -> f64 {
        self.current_price
    }

    /// `None` for an empty chain.
    pub fn classification(&self) -> Option<&StrikeClassification> {
        self.classification.as_ref()
    }

    pub fn is_degenerate(&self) -> bool {
        self.classification.is_none()
    }

    pub fn totals(&self) -> &TotalsRecord {
        &self.totals
    }

    /// Diff against `baseline` and compute imbalance and spread.
    pub fn finish(&self, baseline: &TotalsRecord) -> MetricsResult {
        let Some(classification) = &self.classification else {
            return MetricsResult::empty(self.current_price);
        };

        let cfg = self.config;
        let difference = compute_difference(&self.totals, baseline, &cfg.fields);
        let difference_percent = compute_difference_percent(&difference, &self.totals, &cfg.fields);

        MetricsResult {
            current_price: self.current_price,
            totals: self.totals,
            difference,
            difference_percent,
            bid_ask_imbalance: bid_ask_imbalance(
                self.chain,
                classification,
                cfg.liquidity_window,
                cfg.imbalance_weight,
            ),
            bid_ask_spread: bid_ask_spread(self.chain, classification, cfg.spread_window),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use corelib::{ChainSnapshot, SideQuote, StrikeQuote};

    use crate::classify::StrikeClassification;

    fn leg(oi: f64, volume: f64, iv: f64, bid_qty: f64, ask_qty: f64, bid: f64, ask: f64) -> SideQuote {
        SideQuote {
            oi,
            volume,
            iv,
            bid_qty,
            ask_qty,
            bid_price: bid,
            ask_price: ask,
        }
    }

    /// Two strikes, 100 and 105.
    pub(crate) fn reference_chain() -> ChainSnapshot {
        ChainSnapshot::new(
            Some(100.0),
            vec![
                StrikeQuote::new(
                    100.0,
                    leg(10.0, 100.0, 0.2, 5.0, 3.0, 1.0, 2.0),
                    leg(20.0, 200.0, 0.3, 7.0, 4.0, 1.5, 2.5),
                ),
                StrikeQuote::new(
                    105.0,
                    leg(15.0, 150.0, 0.25, 6.0, 2.0, 1.1, 2.1),
                    leg(25.0, 250.0, 0.35, 8.0, 5.0, 1.6, 2.6),
                ),
            ],
        )
    }

    pub(crate) fn reference_classification() -> StrikeClassification {
        StrikeClassification {
            atm: 100.0,
            call_itm: vec![],
            call_otm: vec![105.0],
            put_itm: vec![105.0],
            put_otm: vec![],
        }
    }
}
