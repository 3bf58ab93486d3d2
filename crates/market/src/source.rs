use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use common::{Candle, Result};

use crate::simulator::MarketSimulator;
use crate::window::CandleWindow;

/// Abstraction over a live candle provider.
///
/// `BinanceKlines` implements this against the exchange REST API.
#[async_trait]
pub trait MarketFeed: Send + Sync {
    /// The most recent `limit` candles for `pair`, oldest first.
    async fn recent_candles(&self, pair: &str, limit: usize) -> Result<Vec<Candle>>;
}

/// Market data handed to a session for one evaluation tick.
#[derive(Debug, Clone)]
pub struct Tick {
    /// Window to evaluate, oldest first.
    pub window: Vec<Candle>,
    /// Newest candle of the window, streamed to the client.
    pub latest: Candle,
    /// True when the window came from the live feed.
    pub live: bool,
}

/// Per-session candle source: live feed when configured and reachable,
/// otherwise the simulator's rolling history.
pub struct MarketSource {
    pair: String,
    feed: Option<Arc<dyn MarketFeed>>,
    simulator: MarketSimulator,
    history: CandleWindow,
    history_len: usize,
}

impl MarketSource {
    pub fn new(
        pair: impl Into<String>,
        feed: Option<Arc<dyn MarketFeed>>,
        simulator: MarketSimulator,
        history_len: usize,
    ) -> Self {
        Self {
            pair: pair.into(),
            feed,
            simulator,
            history: CandleWindow::new(history_len),
            history_len,
        }
    }

    pub fn has_live_feed(&self) -> bool {
        self.feed.is_some()
    }

    /// Pre-fill the simulated history so indicators have data on the first tick.
    pub fn warm_up(&mut self, candles: usize) {
        for _ in 0..candles {
            let candle = self.simulator.next_candle();
            self.history.push(candle);
        }
        debug!(pair = %self.pair, candles = self.history.len(), "Simulated history warmed up");
    }

    /// Produce the next tick. Live feed failures degrade to simulation.
    pub async fn next_tick(&mut self) -> Tick {
        if let Some(feed) = &self.feed {
            match feed.recent_candles(&self.pair, self.history_len).await {
                Ok(window) => {
                    if let Some(&latest) = window.last() {
                        return Tick { window, latest, live: true };
                    }
                    warn!(pair = %self.pair, "Live feed returned no candles, simulating");
                }
                Err(e) => {
                    warn!(pair = %self.pair, error = %e, "Live feed unavailable, simulating");
                }
            }
        }

        let latest = self.simulator.next_candle();
        self.history.push(latest);
        Tick {
            window: self.history.snapshot(),
            latest,
            live: false,
        }
    }
}
