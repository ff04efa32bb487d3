/// How many strikes on each side of ATM a window keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    pub near_itm: usize,
    pub near_otm: usize,
}

impl WindowSpec {
    /// 5 ITM + ATM + 10 OTM. Used by totals and imbalance.
    pub const LIQUIDITY: WindowSpec = WindowSpec::new(5, 10);

    /// 2 ITM + ATM + 2 OTM. Used by spread.
    pub const SPREAD: WindowSpec = WindowSpec::new(2, 2);

    pub const fn new(near_itm: usize, near_otm: usize) -> Self {
        Self { near_itm, near_otm }
    }

    /// Upper bound on the number of strikes in a window.
    pub const fn capacity(&self) -> usize {
        self.near_itm + 1 + self.near_otm
    }
}

/// Bounded set of strikes, ascending, ATM always included.
#[derive(Debug, Clone, PartialEq)]
pub struct StrikeWindow {
    strikes: Vec<f64>,
}

impl StrikeWindow {
    pub fn contains(&self, strike: f64) -> bool {
        self.strikes.contains(&strike)
    }

    pub fn len(&self) -> usize {
        self.strikes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strikes.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.strikes
    }
}

/// Select the `near_itm` ITM strikes nearest `atm`, `atm` itself, and the
/// `near_otm` OTM strikes nearest `atm`.
///
/// Short sides yield whatever is available; nothing is padded.
pub fn select_window(itm: &[f64], atm: f64, otm: &[f64], spec: WindowSpec) -> StrikeWindow {
    let mut strikes = nearest(itm, atm, spec.near_itm);
    strikes.push(atm);
    strikes.extend(nearest(otm, atm, spec.near_otm));

    strikes.sort_by(f64::total_cmp);
    strikes.dedup();

    StrikeWindow { strikes }
}

fn nearest(pool: &[f64], atm: f64, n: usize) -> Vec<f64> {
    let mut by_distance = pool.to_vec();
    by_distance.sort_by(|a, b| {
        (a - atm)
            .abs()
            .total_cmp(&(b - atm).abs())
            .then(a.total_cmp(b))
    });
    by_distance.truncate(n);
    by_distance
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(from: u32, to: u32) -> Vec<f64> {
        (from..=to).map(|s| s as f64).collect()
    }

    #[test]
    fn call_side_takes_highest_itm_and_lowest_otm() {
        // Calls: ITM below ATM, OTM above.
        let w = select_window(&range(1, 9), 10.0, &range(11, 30), WindowSpec::LIQUIDITY);
        assert_eq!(w.len(), 16);
        assert_eq!(w.as_slice().first(), Some(&5.0));
        assert_eq!(w.as_slice().last(), Some(&20.0));
        assert!(w.contains(10.0));
        assert!(!w.contains(4.0));
        assert!(!w.contains(21.0));
    }

    #[test]
    fn put_side_mirrors_by_proximity() {
        // Puts: ITM above ATM, OTM below. Nearest-first on both sides.
        let w = select_window(&range(11, 30), 10.0, &range(1, 9), WindowSpec::LIQUIDITY);
        assert_eq!(w.as_slice(), range(1, 15).as_slice());
    }

    #[test]
    fn spread_window_is_tight() {
        let w = select_window(&[90.0, 95.0, 98.0], 100.0, &[102.0, 105.0, 110.0], WindowSpec::SPREAD);
        assert_eq!(w.as_slice(), &[95.0, 98.0, 100.0, 102.0, 105.0]);
    }

    #[test]
    fn short_sides_degrade_without_padding() {
        let w = select_window(&[], 100.0, &[105.0], WindowSpec::LIQUIDITY);
        assert_eq!(w.as_slice(), &[100.0, 105.0]);

        let w = select_window(&[], 100.0, &[], WindowSpec::SPREAD);
        assert_eq!(w.as_slice(), &[100.0]);
    }

    #[test]
    fn zero_sized_sides_keep_only_atm() {
        let w = select_window(&[95.0], 100.0, &[105.0], WindowSpec::new(0, 0));
        assert_eq!(w.as_slice(), &[100.0]);
        assert_eq!(WindowSpec::new(0, 0).capacity(), 1);
    }

    #[test]
    fn capacity_of_standard_windows() {
        assert_eq!(WindowSpec::LIQUIDITY.capacity(), 16);
        assert_eq!(WindowSpec::SPREAD.capacity(), 5);
    }
}
