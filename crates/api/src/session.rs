use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use uuid::Uuid;

use commentary::{Analyst, AnalystComment, AnalystPanel, PerformanceContext};
use common::Candle;
use market::{MarketSimulator, MarketSource};
use risk::BalanceLedger;
use strategy::{Decision, StrategyConfig, StrategyEngine};

use crate::protocol::{StatusUpdate, StreamMessage};
use crate::AppState;

/// One deployed strategy bound to one client connection.
///
/// Owns its engine, balance and market source; nothing is shared with other
/// sessions except the read-only pieces of [`AppState`].
pub struct Session {
    id: Uuid,
    name: String,
    engine: StrategyEngine,
    ledger: BalanceLedger,
    market: MarketSource,
    panel: AnalystPanel,
    rng: StdRng,
}

impl Session {
    pub fn new(
        strategy: StrategyConfig,
        market: MarketSource,
        panel: AnalystPanel,
        initial_balance: f64,
        rng: StdRng,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: strategy.name,
            engine: StrategyEngine::new(strategy.blocks),
            ledger: BalanceLedger::new(initial_balance),
            market,
            panel,
            rng,
        }
    }

    /// Session wired from server state, with warmed-up simulated history.
    pub fn from_state(strategy: StrategyConfig, state: &AppState) -> Self {
        let config = &state.config;
        let mut market = MarketSource::new(
            config.market_pair.clone(),
            state.feed.clone(),
            MarketSimulator::new(),
            config.history_len,
        );
        market.warm_up(config.warmup_candles);

        Self::new(
            strategy,
            market,
            state.panel.clone(),
            config.initial_balance,
            StdRng::from_entropy(),
        )
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn engine(&self) -> &StrategyEngine {
        &self.engine
    }

    pub fn ledger(&self) -> &BalanceLedger {
        &self.ledger
    }

    fn performance(&self) -> PerformanceContext {
        PerformanceContext {
            pnl: self.engine.pnl(),
            trade_count: self.engine.trade_count(),
            balance: self.ledger.balance(),
        }
    }

    /// Advance the market and the engine by one tick. EXIT P&L is booked
    /// into the ledger before this returns.
    pub async fn advance(&mut self) -> TickStep {
        let tick = self.market.next_tick().await;
        let decision = self.engine.step(&tick.window, self.ledger.balance());
        if let Decision::Exit { pnl, .. } = &decision {
            self.ledger.apply_realized(*pnl);
        }
        if decision.is_trade() {
            info!(
                session = %self.id,
                name = %self.name,
                action = %decision.action(),
                live = tick.live,
                "Strategy traded"
            );
        }
        TickStep {
            latest: tick.latest,
            decision,
        }
    }

    /// Analysts reacting to `decision`; none for HOLD.
    pub fn reacting_analysts(&mut self, decision: &Decision) -> Vec<Analyst> {
        if decision.is_trade() {
            AnalystPanel::pick(&mut self.rng)
        } else {
            Vec::new()
        }
    }

    /// Produce one analyst's comment on `decision`. May call out to the
    /// commentary provider.
    pub async fn comment(&mut self, analyst: Analyst, decision: &Decision) -> AnalystComment {
        let context = self.performance();
        self.panel
            .comment(analyst, decision, &context, &mut self.rng)
            .await
    }

    /// Damage and status frames that close a tick.
    pub fn closing_frames(&self) -> [StreamMessage; 2] {
        [
            StreamMessage::DamageUpdate(BTreeMap::from([(
                self.name.clone(),
                self.ledger.damage_pct(),
            )])),
            StreamMessage::StatusUpdate(StatusUpdate {
                name: self.name.clone(),
                pnl: self.engine.pnl(),
                trade_count: self.engine.trade_count(),
                balance: self.ledger.balance(),
            }),
        ]
    }

    /// Run a whole tick and collect its frames in streaming order.
    pub async fn tick(&mut self) -> Vec<StreamMessage> {
        let step = self.advance().await;
        let mut messages = step.frames().to_vec();
        for analyst in self.reacting_analysts(&step.decision) {
            let comment = self.comment(analyst, &step.decision).await;
            messages.push(StreamMessage::AnalystComment(comment));
        }
        messages.extend(self.closing_frames());
        messages
    }
}

/// Result of [`Session::advance`]: the candle and decision of one tick.
#[derive(Debug, Clone)]
pub struct TickStep {
    pub latest: Candle,
    pub decision: Decision,
}

impl TickStep {
    /// Market and action frames, sent before any commentary.
    pub fn frames(&self) -> [StreamMessage; 2] {
        [
            StreamMessage::MarketUpdate(self.latest),
            StreamMessage::StrategyAction(self.decision.clone()),
        ]
    }
}
