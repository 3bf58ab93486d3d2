use std::collections::VecDeque;

use common::Candle;

/// Bounded rolling history of candles, oldest first.
#[derive(Debug, Clone)]
pub struct CandleWindow {
    candles: VecDeque<Candle>,
    max_len: usize,
}

impl CandleWindow {
    pub const DEFAULT_MAX_LEN: usize = 50;

    pub fn new(max_len: usize) -> Self {
        let max_len = max_len.max(1);
        Self {
            candles: VecDeque::with_capacity(max_len),
            max_len,
        }
    }

    /// Append a candle, evicting the oldest once full.
    pub fn push(&mut self, candle: Candle) {
        if self.candles.len() == self.max_len {
            self.candles.pop_front();
        }
        self.candles.push_back(candle);
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn latest(&self) -> Option<&Candle> {
        self.candles.back()
    }

    /// Contiguous snapshot for indicator evaluation.
    pub fn snapshot(&self) -> Vec<Candle> {
        self.candles.iter().copied().collect()
    }
}

impl Default for CandleWindow {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_LEN)
    }
}
