use proptest::prelude::*;
use risk::BalanceLedger;

proptest! {
    /// Damage stays within [0, 100] as long as the balance stays non-negative,
    /// and the peak never falls below the balance.
    #[test]
    fn damage_is_bounded(
        initial in 1.0f64..1_000_000.0,
        fractions in prop::collection::vec(-0.5f64..0.5, 0..50),
    ) {
        let mut ledger = BalanceLedger::new(initial);
        for f in fractions {
            ledger.apply_realized(ledger.balance() * f);
            prop_assert!(ledger.peak() >= ledger.balance());
            let damage = ledger.damage_pct();
            prop_assert!((0.0..=100.0).contains(&damage), "damage out of range: {}", damage);
        }
    }

    /// The peak only ever moves up.
    #[test]
    fn peak_is_monotonic(pnls in prop::collection::vec(-1_000.0f64..1_000.0, 0..50)) {
        let mut ledger = BalanceLedger::new(10_000.0);
        let mut last_peak = ledger.peak();
        for pnl in pnls {
            ledger.apply_realized(pnl);
            prop_assert!(ledger.peak() >= last_peak);
            last_peak = ledger.peak();
        }
    }
}
