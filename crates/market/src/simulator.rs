use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use common::Candle;

/// Per-candle volatility of the random walk.
const VOLATILITY: f64 = 0.003;
/// Amplitude of the slow sinusoidal drift.
const TREND_AMPLITUDE: f64 = 0.001;
/// Drift period divisor, in ticks.
const TREND_PERIOD: f64 = 20.0;

/// Random-walk candle generator with a slow sinusoidal trend.
///
/// Each candle opens at the previous close. Timestamps follow the wall clock
/// but are forced strictly increasing.
pub struct MarketSimulator {
    base_price: f64,
    tick: u64,
    last_timestamp: Option<i64>,
    rng: StdRng,
}

impl MarketSimulator {
    /// Start around 65k–70k, seeded from entropy.
    pub fn new() -> Self {
        let mut rng = StdRng::from_entropy();
        let base_price = 65_000.0 + rng.gen::<f64>() * 5_000.0;
        Self::with_rng(base_price, rng)
    }

    /// Deterministic simulator for replay and tests.
    pub fn seeded(base_price: f64, seed: u64) -> Self {
        Self::with_rng(base_price, StdRng::seed_from_u64(seed))
    }

    fn with_rng(base_price: f64, rng: StdRng) -> Self {
        Self {
            base_price,
            tick: 0,
            last_timestamp: None,
            rng,
        }
    }

    /// Close of the most recent candle (or the starting price).
    pub fn price(&self) -> f64 {
        self.base_price
    }

    pub fn next_candle(&mut self) -> Candle {
        let trend = (self.tick as f64 / TREND_PERIOD).sin() * TREND_AMPLITUDE;
        let change = (self.rng.gen::<f64>() - 0.5) * 2.0 * VOLATILITY + trend;

        let open = self.base_price;
        let close = open * (1.0 + change);
        let high = open.max(close) * (1.0 + self.rng.gen::<f64>() * VOLATILITY);
        let low = open.min(close) * (1.0 - self.rng.gen::<f64>() * VOLATILITY);
        let volume = self.rng.gen::<f64>() * 1_000.0;

        let now = Utc::now().timestamp_millis();
        let timestamp = match self.last_timestamp {
            Some(prev) if now <= prev => prev + 1,
            _ => now,
        };

        let candle = Candle {
            timestamp,
            open: round2(open),
            high: round2(high),
            low: round2(low),
            close: round2(close),
            volume: round2(volume),
        };

        self.base_price = candle.close;
        self.last_timestamp = Some(timestamp);
        self.tick += 1;
        candle
    }
}

impl Default for MarketSimulator {
    fn default() -> Self {
        Self::new()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candles_chain_open_to_previous_close() {
        let mut sim = MarketSimulator::seeded(65_000.0, 7);
        let first = sim.next_candle();
        let second = sim.next_candle();
        assert_eq!(first.open, 65_000.0);
        assert_eq!(second.open, first.close);
        assert_eq!(sim.price(), second.close);
    }

    #[test]
    fn ohlc_is_consistent() {
        let mut sim = MarketSimulator::seeded(65_000.0, 42);
        for _ in 0..500 {
            let c = sim.next_candle();
            assert!(c.low > 0.0);
            assert!(c.high >= c.open.max(c.close), "{c:?}");
            assert!(c.low <= c.open.min(c.close), "{c:?}");
            assert!((0.0..=1_000.0).contains(&c.volume));
        }
    }

    #[test]
    fn per_candle_move_is_bounded() {
        let mut sim = MarketSimulator::seeded(65_000.0, 3);
        for _ in 0..200 {
            let c = sim.next_candle();
            let change = (c.close - c.open).abs() / c.open;
            // volatility + trend amplitude, plus rounding slack
            assert!(change <= 0.0041, "change {change}");
        }
    }

    #[test]
    fn timestamps_strictly_increase_within_a_burst() {
        let mut sim = MarketSimulator::seeded(65_000.0, 1);
        let stamps: Vec<i64> = (0..100).map(|_| sim.next_candle().timestamp).collect();
        assert!(stamps.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn same_seed_same_prices() {
        let mut a = MarketSimulator::seeded(100.0, 99);
        let mut b = MarketSimulator::seeded(100.0, 99);
        for _ in 0..20 {
            assert_eq!(a.next_candle().close, b.next_candle().close);
        }
    }

    #[test]
    fn unseeded_start_price_in_range() {
        let sim = MarketSimulator::new();
        assert!((65_000.0..70_000.0).contains(&sim.price()));
    }
}
