use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use common::Candle;

use crate::blocks::Block;
use crate::rules::{self, ExitReason};

pub const GATHERING_MESSAGE: &str = "Gathering market intel...";
pub const ENTER_MESSAGE: &str = "Gates opened! Entering position...";
pub const HOLDING_MESSAGE: &str = "Holding strong...";

/// Discriminant of a [`Decision`], usable as a lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Hold,
    Enter,
    Exit,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Hold => write!(f, "HOLD"),
            Action::Enter => write!(f, "ENTER"),
            Action::Exit => write!(f, "EXIT"),
        }
    }
}

/// Outcome of one evaluation tick. Serializes flat, tagged by `action`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "UPPERCASE")]
pub enum Decision {
    Hold {
        message: String,
    },
    Enter {
        price: f64,
        size: f64,
        message: String,
    },
    Exit {
        reason: ExitReason,
        price: f64,
        pnl: f64,
        message: String,
    },
}

impl Decision {
    fn hold(message: &str) -> Self {
        Decision::Hold { message: message.to_string() }
    }

    pub fn action(&self) -> Action {
        match self {
            Decision::Hold { .. } => Action::Hold,
            Decision::Enter { .. } => Action::Enter,
            Decision::Exit { .. } => Action::Exit,
        }
    }

    pub fn reason(&self) -> Option<ExitReason> {
        match self {
            Decision::Exit { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Trade price for ENTER/EXIT; `None` for HOLD.
    pub fn price(&self) -> Option<f64> {
        match self {
            Decision::Enter { price, .. } | Decision::Exit { price, .. } => Some(*price),
            Decision::Hold { .. } => None,
        }
    }

    /// Realized profit of an EXIT, zero otherwise.
    pub fn realized_pnl(&self) -> f64 {
        match self {
            Decision::Exit { pnl, .. } => *pnl,
            _ => 0.0,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Decision::Hold { message }
            | Decision::Enter { message, .. }
            | Decision::Exit { message, .. } => message,
        }
    }

    pub fn is_trade(&self) -> bool {
        !matches!(self, Decision::Hold { .. })
    }
}

/// The single open position of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub entry_price: f64,
    /// Quote currency committed.
    pub size: f64,
    /// Timestamp (ms) of the candle the position was opened on.
    pub opened_at: i64,
}

/// Stateful strategy session: configured blocks plus the position, realized
/// P&L and trade count they produce.
///
/// One instance per session. Not meant to be shared between sessions.
#[derive(Debug, Clone)]
pub struct StrategyEngine {
    blocks: Vec<Block>,
    position: Option<Position>,
    pnl: f64,
    trade_count: u32,
}

impl StrategyEngine {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            position: None,
            pnl: 0.0,
            trade_count: 0,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Cumulative realized profit and loss.
    pub fn pnl(&self) -> f64 {
        self.pnl
    }

    /// Number of positions opened so far.
    pub fn trade_count(&self) -> u32 {
        self.trade_count
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn should_enter(&self, window: &[Candle]) -> bool {
        rules::should_enter(&self.blocks, window)
    }

    pub fn calculate_position_size(&self, balance: f64) -> f64 {
        rules::position_size(&self.blocks, balance)
    }

    /// Evaluate one tick against `window` (oldest first) with `balance`
    /// available for sizing.
    pub fn step(&mut self, window: &[Candle], balance: f64) -> Decision {
        let Some(last) = window.last().filter(|_| window.len() >= 2) else {
            return Decision::hold(GATHERING_MESSAGE);
        };
        let current_price = last.close;

        if self.position.is_none() && self.should_enter(window) {
            let size = self.calculate_position_size(balance);
            self.position = Some(Position {
                entry_price: current_price,
                size,
                opened_at: last.timestamp,
            });
            self.trade_count += 1;
            info!(
                price = current_price,
                size = size,
                trade_count = self.trade_count,
                "Position opened"
            );
            return Decision::Enter {
                price: current_price,
                size,
                message: ENTER_MESSAGE.to_string(),
            };
        }

        if let Some(position) = &self.position {
            let pnl_pct = rules::pnl_pct(position.entry_price, current_price);
            if let Some(reason) = rules::exit_reason(&self.blocks, pnl_pct) {
                let profit = position.size * (pnl_pct / 100.0);
                self.pnl += profit;
                self.position = None;
                info!(
                    reason = %reason,
                    price = current_price,
                    pnl_pct = pnl_pct,
                    profit = profit,
                    total_pnl = self.pnl,
                    "Position closed"
                );
                return Decision::Exit {
                    reason,
                    price: current_price,
                    pnl: profit,
                    message: format!("{}! P&L: ${profit:.2}", reason.title()),
                };
            }
        }

        debug!(price = current_price, in_position = self.position.is_some(), "Holding");
        Decision::hold(HOLDING_MESSAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{BlockCategory, BlockKind};

    fn candle(timestamp: i64, close: f64) -> Candle {
        Candle {
            timestamp,
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        }
    }

    fn window(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| candle(i as i64 * 60_000, c))
            .collect()
    }

    /// Enters on any window: the unknown entry block never vetoes.
    fn always_enter(exits: Vec<Block>) -> StrategyEngine {
        let mut blocks = vec![Block::new(
            BlockCategory::Entry,
            BlockKind::Unknown("always".into()),
        )];
        blocks.extend(exits);
        StrategyEngine::new(blocks)
    }

    fn exit(kind: BlockKind) -> Block {
        Block::new(BlockCategory::Exit, kind)
    }

    #[test]
    fn short_window_holds_without_mutation() {
        let mut engine = always_enter(vec![]);
        for w in [window(&[]), window(&[100.0])] {
            let decision = engine.step(&w, 1000.0);
            assert_eq!(decision, Decision::hold(GATHERING_MESSAGE));
        }
        assert_eq!(engine.trade_count(), 0);
        assert_eq!(engine.pnl(), 0.0);
        assert!(engine.position().is_none());
    }

    #[test]
    fn enters_at_last_close_with_default_size() {
        let mut engine = always_enter(vec![]);
        let decision = engine.step(&window(&[99.0, 100.0]), 1000.0);
        assert_eq!(
            decision,
            Decision::Enter {
                price: 100.0,
                size: 100.0,
                message: ENTER_MESSAGE.into()
            }
        );
        assert_eq!(engine.trade_count(), 1);
        let position = engine.position().unwrap();
        assert_eq!(position.entry_price, 100.0);
        assert_eq!(position.opened_at, 60_000);
    }

    #[test]
    fn does_not_reenter_while_open() {
        let mut engine = always_enter(vec![]);
        engine.step(&window(&[99.0, 100.0]), 1000.0);
        let decision = engine.step(&window(&[99.0, 100.0, 101.0]), 1000.0);
        assert_eq!(decision.action(), Action::Hold);
        assert_eq!(decision.message(), HOLDING_MESSAGE);
        assert_eq!(engine.trade_count(), 1);
    }

    #[test]
    fn stop_loss_exit_realizes_loss() {
        let mut engine = always_enter(vec![exit(BlockKind::StopLoss { percentage: 2.0 })]);
        engine.step(&window(&[100.0, 100.0]), 1000.0);

        let decision = engine.step(&window(&[100.0, 100.0, 97.0]), 1000.0);
        let Decision::Exit { reason, price, pnl, message } = decision else {
            panic!("expected exit, got {decision:?}");
        };
        assert_eq!(reason, ExitReason::StopLoss);
        assert_eq!(price, 97.0);
        assert!((pnl + 3.0).abs() < 1e-9, "pnl {pnl}");
        assert_eq!(message, "Stop Loss! P&L: $-3.00");
        assert!((engine.pnl() + 3.0).abs() < 1e-9);
        assert!(engine.position().is_none());
        assert_eq!(engine.trade_count(), 1);
    }

    #[test]
    fn take_profit_exit_realizes_gain() {
        let mut engine = always_enter(vec![
            Block::new(BlockCategory::Sizing, BlockKind::PositionSize { percentage: 50.0 }),
            exit(BlockKind::TakeProfit { percentage: 5.0 }),
        ]);
        engine.step(&window(&[100.0, 100.0]), 1000.0);
        assert_eq!(engine.position().unwrap().size, 500.0);

        let decision = engine.step(&window(&[100.0, 100.0, 106.0]), 1000.0);
        assert_eq!(decision.reason(), Some(ExitReason::TakeProfit));
        assert!((decision.realized_pnl() - 30.0).abs() < 1e-9);
        assert_eq!(decision.message(), "Take Profit! P&L: $30.00");
    }

    #[test]
    fn without_exit_blocks_position_is_held_forever() {
        let mut engine = always_enter(vec![]);
        engine.step(&window(&[100.0, 100.0]), 1000.0);
        let decision = engine.step(&window(&[100.0, 100.0, 1.0]), 1000.0);
        assert_eq!(decision.action(), Action::Hold);
        assert!(engine.position().is_some());
    }

    #[test]
    fn reenters_on_the_tick_after_an_exit() {
        let mut engine = always_enter(vec![exit(BlockKind::StopLoss { percentage: 2.0 })]);
        engine.step(&window(&[100.0, 100.0]), 1000.0);
        engine.step(&window(&[100.0, 90.0]), 1000.0);
        let decision = engine.step(&window(&[90.0, 90.0]), 1000.0);
        assert_eq!(decision.action(), Action::Enter);
        assert_eq!(engine.trade_count(), 2);
    }

    #[test]
    fn decision_wire_format() {
        let exit = Decision::Exit {
            reason: ExitReason::StopLoss,
            price: 97.0,
            pnl: -3.0,
            message: "Stop Loss! P&L: $-3.00".into(),
        };
        let json = serde_json::to_value(&exit).unwrap();
        assert_eq!(json["action"], "EXIT");
        assert_eq!(json["reason"], "stop_loss");
        assert_eq!(json["pnl"], -3.0);

        let hold = serde_json::to_value(Decision::hold(HOLDING_MESSAGE)).unwrap();
        assert_eq!(hold, serde_json::json!({"action": "HOLD", "message": "Holding strong..."}));
    }

    #[test]
    fn oversized_params_hold_instead_of_failing() {
        let config: crate::StrategyConfig = serde_json::from_str(
            r#"{"blocks": [
                {"id": "rsi-gate", "category": "entry", "params": {"period": 1e20}},
                {"id": "ma-cross", "category": "entry", "params": {"fast": 1e20, "slow": 1e20}},
                {"id": "macd-signal", "category": "entry", "params": {"fast": 1e20, "slow": 1e20}}
            ]}"#,
        )
        .unwrap();
        let mut engine = StrategyEngine::new(config.blocks);
        let closes: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();

        let decision = engine.step(&window(&closes), 1000.0);
        assert_eq!(decision.action(), Action::Hold);
        assert_eq!(engine.trade_count(), 0);
    }
}
