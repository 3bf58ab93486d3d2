/// Relative Strength Index over close prices.
///
/// Simple-average variant: gain and loss are plain means over the last
/// `period` close-to-close changes, with no Wilder smoothing.
#[derive(Debug, Clone)]
pub struct RsiIndicator {
    pub period: usize,
}

impl RsiIndicator {
    /// Value reported when RSI cannot be computed.
    pub const NEUTRAL: f64 = 50.0;

    pub fn new(period: usize) -> Self {
        Self { period: period.max(1) }
    }

    /// RSI at the newest close in `closes` (oldest first).
    ///
    /// Returns `None` if there are fewer than `period + 1` values, or if the
    /// span holds no losing change (RS is not finite).
    pub fn compute(&self, closes: &[f64]) -> Option<f64> {
        let span = self.period.saturating_add(1);
        if closes.len() < span {
            return None;
        }

        let recent = &closes[closes.len() - span..];
        let (gains, losses) = recent
            .windows(2)
            .map(|w| w[1] - w[0])
            .fold((0.0, 0.0), |(g, l), change| {
                if change > 0.0 {
                    (g + change, l)
                } else {
                    (g, l - change)
                }
            });

        let avg_gain = gains / self.period as f64;
        let avg_loss = losses / self.period as f64;

        let strength = avg_gain / avg_loss;
        strength
            .is_finite()
            .then(|| 100.0 - 100.0 / (1.0 + strength))
    }

    /// Like [`compute`](Self::compute), but resolves the undefined cases to
    /// [`NEUTRAL`](Self::NEUTRAL).
    pub fn value_or_neutral(&self, closes: &[f64]) -> f64 {
        self.compute(closes).unwrap_or(Self::NEUTRAL)
    }
}
