use corelib::{ChainSnapshot, SidePair};

use crate::classify::StrikeClassification;
use crate::window::WindowSpec;

/// Fixed scaling applied to every contributing strike.
///
/// This is a constant weight, not `1 / window_size`: a window with fewer
/// strikes still weighs each of them at 0.2.
pub const DEFAULT_IMBALANCE_WEIGHT: f64 = 0.2;

/// Signed bid/ask quantity pressure per side.
///
/// Each strike in the side's window contributes
/// `(bid_qty - ask_qty) / (bid_qty + ask_qty) * weight`, or nothing when both
/// quantities sum to zero. The side value is the sum of contributions.
pub fn bid_ask_imbalance(
    chain: &ChainSnapshot,
    classification: &StrikeClassification,
    window: WindowSpec,
    weight: f64,
) -> SidePair<f64> {
    SidePair::from_fn(|side| {
        let selected = classification.window(side, window);

        chain
            .data
            .iter()
            .filter(|q| selected.contains(q.strike_price))
            .map(|q| {
                let m = q.side(side);
                let depth = m.bid_qty + m.ask_qty;
                if depth != 0.0 {
                    (m.bid_qty - m.ask_qty) / depth * weight
                } else {
                    0.0
                }
            })
            .sum()
    })
}
