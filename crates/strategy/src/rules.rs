//! Stateless decision rules. Everything here is a pure function of the
//! configured blocks and the inputs it is handed.

use serde::{Deserialize, Serialize};
use tracing::debug;

use common::Candle;

use crate::blocks::{Block, BlockCategory, BlockKind};
use crate::indicators::{sma, MacdIndicator, RsiIndicator};

/// Share of the balance committed when no `position-size` block is configured.
pub const DEFAULT_SIZE_FRACTION: f64 = 0.1;

/// Why a position was closed. Serialized names are the wire reason keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    TrailingStop,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::TrailingStop => "trailing_stop",
        }
    }

    /// Human-readable form: underscores become spaces, words title-cased.
    pub fn title(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Close prices of a window, oldest first.
pub fn closes(window: &[Candle]) -> Vec<f64> {
    window.iter().map(|c| c.close).collect()
}

/// Entry gate: every entry-category block must allow entry.
///
/// A strategy without entry blocks never enters. Evaluation stops at the
/// first veto.
pub fn should_enter(blocks: &[Block], window: &[Candle]) -> bool {
    let mut entry_blocks = blocks
        .iter()
        .filter(|b| b.category == BlockCategory::Entry)
        .peekable();
    if entry_blocks.peek().is_none() {
        return false;
    }

    let closes = closes(window);
    entry_blocks.all(|block| {
        let allowed = allows_entry(&block.kind, &closes);
        if !allowed {
            debug!(block = %block.id(), "Entry vetoed");
        }
        allowed
    })
}

fn allows_entry(kind: &BlockKind, closes: &[f64]) -> bool {
    match kind {
        BlockKind::RsiGate { period, threshold } => {
            RsiIndicator::new(*period).value_or_neutral(closes) <= *threshold
        }
        // Undefined averages (short history) compare as no signal.
        BlockKind::MaCross { fast, slow } => match (sma(closes, *fast), sma(closes, *slow)) {
            (Some(fast_ma), Some(slow_ma)) => fast_ma > slow_ma,
            _ => false,
        },
        BlockKind::MacdSignal { fast, slow } => MacdIndicator::new(*fast, *slow).is_bullish(closes),
        BlockKind::PositionSize { .. }
        | BlockKind::StopLoss { .. }
        | BlockKind::TakeProfit { .. }
        | BlockKind::TrailingStop { .. }
        | BlockKind::Unknown(_) => true,
    }
}

/// Capital committed to a new position.
///
/// Uses the first `position-size` block; without one, 10% of the balance.
pub fn position_size(blocks: &[Block], balance: f64) -> f64 {
    blocks
        .iter()
        .find_map(|b| match b.kind {
            BlockKind::PositionSize { percentage } => Some(balance * percentage / 100.0),
            _ => None,
        })
        .unwrap_or(balance * DEFAULT_SIZE_FRACTION)
}

/// Percentage move from `entry_price` to `current_price`.
pub fn pnl_pct(entry_price: f64, current_price: f64) -> f64 {
    (current_price - entry_price) / entry_price * 100.0
}

/// First exit block, in configuration order, that fires at `pnl_pct`.
pub fn exit_reason(blocks: &[Block], pnl_pct: f64) -> Option<ExitReason> {
    blocks.iter().find_map(|b| match b.kind {
        BlockKind::StopLoss { percentage } if pnl_pct <= -percentage => Some(ExitReason::StopLoss),
        BlockKind::TakeProfit { percentage } if pnl_pct >= percentage => {
            Some(ExitReason::TakeProfit)
        }
        BlockKind::TrailingStop { percentage } if pnl_pct <= -percentage => {
            Some(ExitReason::TrailingStop)
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candles(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                timestamp: 1_000 + i as i64 * 60_000,
                open: close,
                high: close,
                low: close,
                close,
                volume: 1.0,
            })
            .collect()
    }

    fn entry(kind: BlockKind) -> Block {
        Block::new(BlockCategory::Entry, kind)
    }

    fn exit(kind: BlockKind) -> Block {
        Block::new(BlockCategory::Exit, kind)
    }

    fn falling(n: usize) -> Vec<f64> {
        (0..n).map(|i| 200.0 - i as f64).collect()
    }

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn no_entry_blocks_never_enters() {
        let blocks = vec![
            exit(BlockKind::StopLoss { percentage: 2.0 }),
            Block::new(BlockCategory::Sizing, BlockKind::PositionSize { percentage: 50.0 }),
            // Right kind, wrong category: not part of the gate.
            Block::new(BlockCategory::Other, BlockKind::RsiGate { period: 14, threshold: 100.0 }),
        ];
        assert!(!should_enter(&blocks, &candles(&falling(40))));
        assert!(!should_enter(&[], &candles(&falling(40))));
    }

    #[test]
    fn unknown_entry_block_does_not_veto() {
        let blocks = vec![entry(BlockKind::Unknown("vibes".into()))];
        assert!(should_enter(&blocks, &candles(&[1.0, 2.0])));
    }

    #[test]
    fn rsi_gate_allows_oversold_and_vetoes_otherwise() {
        let gate = vec![entry(BlockKind::RsiGate { period: 14, threshold: 30.0 })];
        // Straight decline → RSI 0 ≤ 30
        assert!(should_enter(&gate, &candles(&falling(20))));
        // Flat → neutral 50 > 30
        assert!(!should_enter(&gate, &candles(&[100.0; 20])));
        // Short history → neutral 50 > 30
        assert!(!should_enter(&gate, &candles(&falling(10))));
    }

    #[test]
    fn rsi_gate_neutral_passes_a_permissive_threshold() {
        let gate = vec![entry(BlockKind::RsiGate { period: 14, threshold: 50.0 })];
        assert!(should_enter(&gate, &candles(&[100.0; 5])));
    }

    #[test]
    fn ma_cross_requires_fast_above_slow() {
        let gate = vec![entry(BlockKind::MaCross { fast: 3, slow: 5 })];
        assert!(should_enter(&gate, &candles(&rising(10))));
        assert!(!should_enter(&gate, &candles(&falling(10))));
        // Equal averages veto.
        assert!(!should_enter(&gate, &candles(&[10.0; 10])));
    }

    #[test]
    fn ma_cross_vetoes_until_slow_average_exists() {
        let gate = vec![entry(BlockKind::MaCross { fast: 9, slow: 21 })];
        assert!(!should_enter(&gate, &candles(&rising(20))));
        assert!(should_enter(&gate, &candles(&rising(21))));
    }

    #[test]
    fn macd_signal_follows_trend() {
        let gate = vec![entry(BlockKind::MacdSignal { fast: 12, slow: 26 })];
        assert!(should_enter(&gate, &candles(&rising(30))));
        assert!(!should_enter(&gate, &candles(&falling(30))));
    }

    #[test]
    fn all_entry_blocks_must_agree() {
        let blocks = vec![
            entry(BlockKind::MacdSignal { fast: 12, slow: 26 }),
            entry(BlockKind::RsiGate { period: 14, threshold: 30.0 }),
        ];
        // Rising: MACD allows, RSI is neutral (no losses) and vetoes.
        assert!(!should_enter(&blocks, &candles(&rising(30))));
    }

    #[test]
    fn default_position_size_is_ten_percent() {
        assert_eq!(position_size(&[], 1000.0), 100.0);
    }

    #[test]
    fn first_position_size_block_wins() {
        let blocks = vec![
            Block::new(BlockCategory::Other, BlockKind::PositionSize { percentage: 25.0 }),
            Block::new(BlockCategory::Sizing, BlockKind::PositionSize { percentage: 50.0 }),
        ];
        assert_eq!(position_size(&blocks, 1000.0), 250.0);
    }

    #[test]
    fn stop_loss_fires_at_threshold() {
        let blocks = vec![exit(BlockKind::StopLoss { percentage: 2.0 })];
        let pct = pnl_pct(100.0, 97.0);
        assert!((pct + 3.0).abs() < 1e-12);
        assert_eq!(exit_reason(&blocks, pct), Some(ExitReason::StopLoss));
        assert_eq!(exit_reason(&blocks, -2.0), Some(ExitReason::StopLoss));
        assert_eq!(exit_reason(&blocks, -1.99), None);
    }

    #[test]
    fn take_profit_fires_at_threshold() {
        let blocks = vec![exit(BlockKind::TakeProfit { percentage: 5.0 })];
        let pct = pnl_pct(100.0, 106.0);
        assert!((pct - 6.0).abs() < 1e-12);
        assert_eq!(exit_reason(&blocks, pct), Some(ExitReason::TakeProfit));
        assert_eq!(exit_reason(&blocks, 4.9), None);
    }

    #[test]
    fn trailing_stop_is_a_fixed_drop_from_entry() {
        let blocks = vec![exit(BlockKind::TrailingStop { percentage: 3.0 })];
        assert_eq!(exit_reason(&blocks, -3.0), Some(ExitReason::TrailingStop));
        assert_eq!(exit_reason(&blocks, -2.5), None);
    }

    #[test]
    fn exit_order_breaks_ties() {
        // Negative thresholds make both rules fire on any move.
        let stop_first = vec![
            exit(BlockKind::StopLoss { percentage: -10.0 }),
            exit(BlockKind::TakeProfit { percentage: -10.0 }),
        ];
        let profit_first: Vec<Block> = stop_first.iter().rev().cloned().collect();
        assert_eq!(exit_reason(&stop_first, 0.0), Some(ExitReason::StopLoss));
        assert_eq!(exit_reason(&profit_first, 0.0), Some(ExitReason::TakeProfit));
    }

    #[test]
    fn exit_ignores_category() {
        let blocks = vec![entry(BlockKind::StopLoss { percentage: 2.0 })];
        assert_eq!(exit_reason(&blocks, -5.0), Some(ExitReason::StopLoss));
    }

    #[test]
    fn reason_titles() {
        assert_eq!(ExitReason::StopLoss.title(), "Stop Loss");
        assert_eq!(ExitReason::TakeProfit.title(), "Take Profit");
        assert_eq!(ExitReason::TrailingStop.title(), "Trailing Stop");
        assert_eq!(
            serde_json::to_value(ExitReason::TrailingStop).unwrap(),
            "trailing_stop"
        );
    }
}
