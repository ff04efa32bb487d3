use corelib::{ChainSnapshot, SidePair, SpreadQuote};

use crate::classify::StrikeClassification;
use crate::window::WindowSpec;

/// Mean bid and ask price per side over the strikes present in the side's window.
///
/// The divisor is the number of matching strikes, not the window size. A side
/// with no matching strikes reports `0.0` for both averages.
pub fn bid_ask_spread(
    chain: &ChainSnapshot,
    classification: &StrikeClassification,
    window: WindowSpec,
) -> SidePair<SpreadQuote> {
    SidePair::from_fn(|side| {
        let selected = classification.window(side, window);

        let (bid_sum, ask_sum, count) = chain
            .data
            .iter()
            .filter(|q| selected.contains(q.strike_price))
            .map(|q| q.side(side))
            .fold((0.0, 0.0, 0usize), |(b, a, n), m| {
                (b + m.bid_price, a + m.ask_price, n + 1)
            });

        if count == 0 {
            return SpreadQuote::default();
        }

        SpreadQuote {
            bid_avg: bid_sum / count as f64,
            ask_avg: ask_sum / count as f64,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::metrics::fixtures::{reference_chain, reference_classification};
    use corelib::{SideQuote, StrikeQuote};

    fn px(bid: f64, ask: f64) -> SideQuote {
        SideQuote {
            bid_price: bid,
            ask_price: ask,
            ..Default::default()
        }
    }

    #[test]
    fn reference_fixture_spread() {
        let s = bid_ask_spread(&reference_chain(), &reference_classification(), WindowSpec::SPREAD);

        assert!((s.call.bid_avg - 1.05).abs() < 1e-12);
        assert!((s.call.ask_avg - 2.05).abs() < 1e-12);
        assert!((s.put.bid_avg - 1.55).abs() < 1e-12);
        assert!((s.put.ask_avg - 2.55).abs() < 1e-12);
    }

    #[test]
    fn averages_over_tight_window_only() {
        // Strikes 80..=120 step 5, ATM 100: window is 90, 95, 100, 105, 110.
        let data: Vec<StrikeQuote> = (16..=24)
            .map(|i| {
                let k = i as f64 * 5.0;
                StrikeQuote::new(k, px(k, k + 1.0), px(k, k + 2.0))
            })
            .collect();
        let chain = ChainSnapshot::new(Some(100.0), data);
        let c = classify(100.0, &chain.strikes()).unwrap();

        let s = bid_ask_spread(&chain, &c, WindowSpec::SPREAD);
        assert_eq!(s.call.bid_avg, 100.0);
        assert_eq!(s.call.ask_avg, 101.0);
        assert_eq!(s.put.ask_avg, 102.0);
    }

    #[test]
    fn divisor_counts_present_strikes() {
        let chain = ChainSnapshot::new(
            Some(100.0),
            vec![
                StrikeQuote::new(100.0, px(2.0, 4.0), px(1.0, 1.0)),
                StrikeQuote::new(105.0, px(4.0, 6.0), px(1.0, 1.0)),
            ],
        );
        let c = classify(100.0, &chain.strikes()).unwrap();

        let s = bid_ask_spread(&chain, &c, WindowSpec::SPREAD);
        assert_eq!(s.call, SpreadQuote { bid_avg: 3.0, ask_avg: 5.0 });
    }

    #[test]
    fn no_matching_strikes_defaults_to_zero() {
        let c = reference_classification();
        let s = bid_ask_spread(&ChainSnapshot::default(), &c, WindowSpec::SPREAD);
        assert_eq!(s, SidePair::default());
    }
}
