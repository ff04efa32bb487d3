use corelib::OptionSide;
use tracing::{debug, instrument};

use crate::error::EngineError;
use crate::window::{StrikeWindow, WindowSpec, select_window};

/// Strikes partitioned around the at-the-money strike.
///
/// Every non-ATM strike sits in exactly one of call ITM/OTM and exactly one of
/// put ITM/OTM, and the put partition mirrors the call one:
/// `call_itm == put_otm` (below ATM) and `call_otm == put_itm` (above ATM).
/// The ATM strike is in none of the four sets. All sets are ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct StrikeClassification {
    pub atm: f64,
    pub call_itm: Vec<f64>,
    pub call_otm: Vec<f64>,
    pub put_itm: Vec<f64>,
    pub put_otm: Vec<f64>,
}

impl StrikeClassification {
    pub fn itm(&self, side: OptionSide) -> &[f64] {
        match side {
            OptionSide::Call => &self.call_itm,
            OptionSide::Put => &self.put_itm,
        }
    }

    pub fn otm(&self, side: OptionSide) -> &[f64] {
        match side {
            OptionSide::Call => &self.call_otm,
            OptionSide::Put => &self.put_otm,
        }
    }

    /// Window of strikes for one side, built from that side's ITM/OTM sets.
    pub fn window(&self, side: OptionSide, spec: WindowSpec) -> StrikeWindow {
        select_window(self.itm(side), self.atm, self.otm(side), spec)
    }
}

/// Classify `strikes` against `reference_price`.
///
/// ATM is the strike nearest the reference price; equidistant strikes resolve to
/// the lower one. Duplicate strike values are collapsed.
#[instrument(
    target = "engine::classify",
    level = "debug",
    skip(strikes),
    fields(strike_count = strikes.len())
)]
pub fn classify(reference_price: f64, strikes: &[f64]) -> Result<StrikeClassification, EngineError> {
    if !reference_price.is_finite() {
        return Err(EngineError::NonFinite {
            what: "reference price",
            value: reference_price,
        });
    }

    if strikes.is_empty() {
        return Err(EngineError::EmptyStrikes);
    }

    if let Some(&bad) = strikes.iter().find(|s| !s.is_finite()) {
        return Err(EngineError::NonFinite {
            what: "strike",
            value: bad,
        });
    }

    let mut sorted = strikes.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();

    // Ascending scan with a strict comparison keeps the lower strike on ties.
    let mut atm = sorted[0];
    let mut best = (atm - reference_price).abs();
    for &s in &sorted[1..] {
        let d = (s - reference_price).abs();
        if d < best {
            atm = s;
            best = d;
        }
    }

    let mut below = Vec::new();
    let mut above = Vec::new();
    for &s in &sorted {
        if s < atm {
            below.push(s);
        } else if s > atm {
            above.push(s);
        }
    }

    debug!(
        atm,
        below = below.len(),
        above = above.len(),
        "strikes classified"
    );

    Ok(StrikeClassification {
        atm,
        call_itm: below.clone(),
        call_otm: above.clone(),
        put_itm: above,
        put_otm: below,
    })
}
