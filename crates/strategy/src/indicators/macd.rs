use super::moving_average::ema;

/// MACD (Moving Average Convergence/Divergence) line.
///
/// Computes `EMA(fast) − EMA(slow)` at the latest close. No signal line:
/// the entry gate only asks whether the fast average sits above the slow one.
#[derive(Debug, Clone)]
pub struct MacdIndicator {
    pub fast: usize,
    pub slow: usize,
}

impl MacdIndicator {
    pub fn new(fast: usize, slow: usize) -> Self {
        Self { fast, slow }
    }

    /// MACD value from a slice of close prices (oldest first).
    /// Returns `None` for an empty slice.
    pub fn compute(&self, closes: &[f64]) -> Option<f64> {
        Some(ema(closes, self.fast)? - ema(closes, self.slow)?)
    }

    /// True when the MACD line is strictly positive.
    pub fn is_bullish(&self, closes: &[f64]) -> bool {
        self.compute(closes).is_some_and(|macd| macd > 0.0)
    }
}
