use corelib::{FieldValues, MetricField, TotalsRecord};

/// `current - baseline` per side and field; absent fields count as zero.
pub fn compute_difference(
    current: &TotalsRecord,
    baseline: &TotalsRecord,
    fields: &[MetricField],
) -> TotalsRecord {
    current.zip(baseline, |cur, base| {
        let mut out = FieldValues::default();
        for f in fields {
            out.set(*f, cur.value_or_zero(*f) - base.value_or_zero(*f));
        }
        out
    })
}

/// Drift as a percentage of the *current* total: `diff / current * 100`.
///
/// The denominator is today's total, not the baseline. A zero current total
/// yields exactly `0.0`.
pub fn compute_difference_percent(
    diff: &TotalsRecord,
    current: &TotalsRecord,
    fields: &[MetricField],
) -> TotalsRecord {
    diff.zip(current, |d, cur| {
        let mut out = FieldValues::default();
        for f in fields {
            let total = cur.value_or_zero(*f);
            let pct = if total != 0.0 {
                d.value_or_zero(*f) / total * 100.0
            } else {
                0.0
            };
            out.set(*f, pct);
        }
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::SidePair;

    fn oi(call: f64, put: f64) -> TotalsRecord {
        let mut c = FieldValues::default();
        c.set(MetricField::Oi, call);
        let mut p = FieldValues::default();
        p.set(MetricField::Oi, put);
        SidePair::new(c, p)
    }

    #[test]
    fn difference_is_current_minus_baseline() {
        let diff = compute_difference(&oi(30.0, 50.0), &oi(20.0, 40.0), &[MetricField::Oi]);
        assert_eq!(diff.call.get(MetricField::Oi), Some(10.0));
        assert_eq!(diff.put.get(MetricField::Oi), Some(10.0));
    }

    #[test]
    fn percent_uses_current_total_as_denominator() {
        let current = oi(30.0, 50.0);
        let diff = compute_difference(&current, &oi(20.0, 40.0), &[MetricField::Oi]);
        let pct = compute_difference_percent(&diff, &current, &[MetricField::Oi]);

        // 10 / 30, not 10 / 20.
        assert!((pct.call.value_or_zero(MetricField::Oi) - 100.0 / 3.0).abs() < 1e-9);
        assert!((pct.put.value_or_zero(MetricField::Oi) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn percent_fixture_values() {
        let pct = compute_difference_percent(&oi(10.0, 10.0), &oi(20.0, 40.0), &[MetricField::Oi]);
        assert_eq!(pct.call.get(MetricField::Oi), Some(50.0));
        assert_eq!(pct.put.get(MetricField::Oi), Some(25.0));
    }

    #[test]
    fn absent_fields_default_to_zero() {
        let current = oi(30.0, 0.0);
        let baseline = TotalsRecord::default();
        let fields = [MetricField::Oi, MetricField::Volume];

        let diff = compute_difference(&current, &baseline, &fields);
        assert_eq!(diff.call.get(MetricField::Oi), Some(30.0));
        assert_eq!(diff.call.get(MetricField::Volume), Some(0.0));

        let pct = compute_difference_percent(&diff, &current, &fields);
        assert_eq!(pct.call.get(MetricField::Oi), Some(100.0));
        // Zero current totals never divide.
        assert_eq!(pct.put.get(MetricField::Oi), Some(0.0));
        assert_eq!(pct.call.get(MetricField::Volume), Some(0.0));
    }

    #[test]
    fn negative_drift() {
        let current = oi(20.0, 40.0);
        let diff = compute_difference(&current, &oi(30.0, 40.0), &[MetricField::Oi]);
        let pct = compute_difference_percent(&diff, &current, &[MetricField::Oi]);
        assert_eq!(diff.call.get(MetricField::Oi), Some(-10.0));
        assert_eq!(pct.call.get(MetricField::Oi), Some(-50.0));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use corelib::SidePair;
    use proptest::prelude::*;

    fn totals_strategy() -> impl Strategy<Value = TotalsRecord> {
        (
            prop::collection::vec(prop::option::of(-1e9..1e9f64), 7),
            prop::collection::vec(prop::option::of(-1e9..1e9f64), 7),
        )
            .prop_map(|(c, p)| {
                let fill = |vals: Vec<Option<f64>>| {
                    let mut out = FieldValues::default();
                    for (f, v) in MetricField::ALL.into_iter().zip(vals) {
                        if let Some(v) = v {
                            out.set(f, v);
                        }
                    }
                    out
                };
                SidePair::new(fill(c), fill(p))
            })
    }

    proptest! {
        #[test]
        fn self_difference_is_zero(t in totals_strategy()) {
            let diff = compute_difference(&t, &t, &MetricField::ALL);
            for (_, v) in diff.call.iter().chain(diff.put.iter()) {
                prop_assert_eq!(v, 0.0);
            }
            let pct = compute_difference_percent(&diff, &t, &MetricField::ALL);
            for (_, v) in pct.call.iter().chain(pct.put.iter()) {
                prop_assert_eq!(v, 0.0);
            }
        }

        #[test]
        fn percent_is_always_finite(current in totals_strategy(), baseline in totals_strategy()) {
            let diff = compute_difference(&current, &baseline, &MetricField::ALL);
            let pct = compute_difference_percent(&diff, &current, &MetricField::ALL);
            for side in [&pct.call, &pct.put] {
                for (_, v) in side.iter() {
                    prop_assert!(v.is_finite());
                }
            }
        }
    }
}
