use corelib::{ChainSnapshot, FieldValues, MetricField, SidePair, TotalsRecord};

use crate::classify::StrikeClassification;
use crate::window::WindowSpec;

/// Sum `fields` per side over that side's window.
///
/// Call and put windows are built from their own ITM/OTM sets, so they usually
/// cover different strikes. Fields appear in a side's record once any strike of
/// its window has been accumulated.
pub fn aggregate_totals(
    chain: &ChainSnapshot,
    classification: &StrikeClassification,
    fields: &[MetricField],
    window: WindowSpec,
) -> TotalsRecord {
    SidePair::from_fn(|side| {
        let selected = classification.window(side, window);
        let mut acc = FieldValues::default();

        for quote in chain.data.iter().filter(|q| selected.contains(q.strike_price)) {
            let market = quote.side(side);
            for f in fields {
                acc.add(*f, market.get(*f));
            }
        }

        acc
    })
}
