use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use commentary::AnalystComment;
use common::Candle;
use strategy::{Decision, StrategyConfig};

/// First frame a client sends on `/deployment`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeploymentRequest {
    #[serde(default)]
    pub strategy: StrategyConfig,
}

/// Frames streamed to the client, `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StreamMessage {
    MarketUpdate(Candle),
    StrategyAction(Decision),
    AnalystComment(AnalystComment),
    /// Drawdown percentage keyed by strategy name.
    DamageUpdate(BTreeMap<String, f64>),
    StatusUpdate(StatusUpdate),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub name: String,
    pub pnl: f64,
    pub trade_count: u32,
    pub balance: f64,
}
