use tracing::info;

/// Session balance with peak tracking for drawdown ("damage") reporting.
///
/// Only realized P&L moves the balance; open positions are not marked to
/// market.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceLedger {
    balance: f64,
    peak: f64,
}

impl BalanceLedger {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            balance: initial_balance,
            peak: initial_balance,
        }
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Highest balance seen so far.
    pub fn peak(&self) -> f64 {
        self.peak
    }

    /// Book a realized profit (or loss) and track the new peak.
    pub fn apply_realized(&mut self, pnl: f64) {
        self.balance += pnl;
        if self.balance > self.peak {
            self.peak = self.balance;
        }
        info!(
            balance = self.balance,
            peak = self.peak,
            realized_pnl = pnl,
            "Balance updated"
        );
    }

    /// Drawdown from peak, in percent. Never negative; zero without a
    /// positive peak.
    pub fn damage_pct(&self) -> f64 {
        if self.peak <= 0.0 {
            return 0.0;
        }
        ((self.peak - self.balance) / self.peak * 100.0).max(0.0)
    }
}
