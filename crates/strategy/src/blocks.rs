use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire record for one strategy block, as sent by the client or read from
/// a preset file. Params stay untyped here; [`Block`] resolves them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BlockConfig {
    /// Missing ids resolve to an unknown, ignored block.
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub params: HashMap<String, Value>,
}

/// Which part of the decision procedure a block belongs to.
///
/// Only `Entry` is consulted by the entry gate. Sizing and exit lookups go
/// by block kind and ignore the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockCategory {
    Entry,
    Exit,
    Sizing,
    Other,
}

impl BlockCategory {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::to_ascii_lowercase).as_deref() {
            Some("entry") => BlockCategory::Entry,
            // The builder UI files exit rules under "defense".
            Some("exit") | Some("defense") => BlockCategory::Exit,
            Some("sizing") => BlockCategory::Sizing,
            _ => BlockCategory::Other,
        }
    }
}

/// A known rule with its resolved parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    RsiGate { period: usize, threshold: f64 },
    MaCross { fast: usize, slow: usize },
    MacdSignal { fast: usize, slow: usize },
    PositionSize { percentage: f64 },
    StopLoss { percentage: f64 },
    TakeProfit { percentage: f64 },
    /// Fixed drop from the entry price. Does not follow a running peak.
    TrailingStop { percentage: f64 },
    /// Unrecognized id, kept so forward-compatible configs load silently.
    Unknown(String),
}

/// A configured block: category plus a typed rule.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "BlockConfig")]
pub struct Block {
    pub category: BlockCategory,
    pub kind: BlockKind,
}

impl Block {
    pub fn new(category: BlockCategory, kind: BlockKind) -> Self {
        Self { category, kind }
    }

    /// The wire id this block was configured with.
    pub fn id(&self) -> &str {
        match &self.kind {
            BlockKind::RsiGate { .. } => "rsi-gate",
            BlockKind::MaCross { .. } => "ma-cross",
            BlockKind::MacdSignal { .. } => "macd-signal",
            BlockKind::PositionSize { .. } => "position-size",
            BlockKind::StopLoss { .. } => "stop-loss",
            BlockKind::TakeProfit { .. } => "take-profit",
            BlockKind::TrailingStop { .. } => "trailing-stop",
            BlockKind::Unknown(id) => id,
        }
    }
}

impl From<BlockConfig> for Block {
    fn from(cfg: BlockConfig) -> Self {
        let category = BlockCategory::parse(cfg.category.as_deref());
        let id = cfg.id.as_str();
        let f = |key: &str| param_f64(&cfg.params, id, key);
        let n = |key: &str| param_len(&cfg.params, id, key);

        let kind = match id {
            "rsi-gate" => BlockKind::RsiGate {
                period: n("period"),
                threshold: f("threshold"),
            },
            "ma-cross" => BlockKind::MaCross {
                fast: n("fast"),
                slow: n("slow"),
            },
            "macd-signal" => BlockKind::MacdSignal {
                fast: n("fast"),
                slow: n("slow"),
            },
            "position-size" => BlockKind::PositionSize { percentage: f("percentage") },
            "stop-loss" => BlockKind::StopLoss { percentage: f("percentage") },
            "take-profit" => BlockKind::TakeProfit { percentage: f("percentage") },
            "trailing-stop" => BlockKind::TrailingStop { percentage: f("percentage") },
            other => BlockKind::Unknown(other.to_string()),
        };

        Block { category, kind }
    }
}

impl From<&Block> for BlockConfig {
    fn from(block: &Block) -> Self {
        let category = match block.category {
            BlockCategory::Entry => Some("entry"),
            BlockCategory::Exit => Some("exit"),
            BlockCategory::Sizing => Some("sizing"),
            BlockCategory::Other => None,
        };
        let params: Vec<(&str, f64)> = match &block.kind {
            BlockKind::RsiGate { period, threshold } => {
                vec![("period", *period as f64), ("threshold", *threshold)]
            }
            BlockKind::MaCross { fast, slow } | BlockKind::MacdSignal { fast, slow } => {
                vec![("fast", *fast as f64), ("slow", *slow as f64)]
            }
            BlockKind::PositionSize { percentage }
            | BlockKind::StopLoss { percentage }
            | BlockKind::TakeProfit { percentage }
            | BlockKind::TrailingStop { percentage } => vec![("percentage", *percentage)],
            BlockKind::Unknown(_) => Vec::new(),
        };

        BlockConfig {
            id: block.id().to_string(),
            category: category.map(str::to_string),
            params: params
                .into_iter()
                .map(|(k, v)| (k.to_string(), Value::from(v)))
                .collect(),
        }
    }
}

impl Serialize for Block {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        BlockConfig::from(self).serialize(serializer)
    }
}

// ─── Parameter defaults ───────────────────────────────────────────────────────

/// Default for every known `(block id, param)` pair.
pub const PARAM_DEFAULTS: &[(&str, &str, f64)] = &[
    ("rsi-gate", "period", 14.0),
    ("rsi-gate", "threshold", 30.0),
    ("ma-cross", "fast", 9.0),
    ("ma-cross", "slow", 21.0),
    ("macd-signal", "fast", 12.0),
    ("macd-signal", "slow", 26.0),
    ("position-size", "percentage", 10.0),
    ("stop-loss", "percentage", 2.0),
    ("take-profit", "percentage", 5.0),
    ("trailing-stop", "percentage", 3.0),
];

/// Upper bound for window-length params. Longer windows can never fill from
/// a session history and would only overflow index arithmetic.
pub const MAX_WINDOW_LEN: usize = 10_000;

/// Look up the default for a block param.
pub fn default_param(id: &str, key: &str) -> Option<f64> {
    PARAM_DEFAULTS
        .iter()
        .find(|(block, param, _)| *block == id && *param == key)
        .map(|(_, _, value)| *value)
}

/// Numeric param, falling back to the defaults table when absent or not a
/// finite number. Unknown pairs resolve to 0.
fn param_f64(params: &HashMap<String, Value>, id: &str, key: &str) -> f64 {
    params
        .get(key)
        .and_then(numeric)
        .filter(|v| v.is_finite())
        .or_else(|| default_param(id, key))
        .unwrap_or(0.0)
}

/// Window-length param. Values below 1 fall back to the default; values above
/// [`MAX_WINDOW_LEN`] are clamped.
fn param_len(params: &HashMap<String, Value>, id: &str, key: &str) -> usize {
    params
        .get(key)
        .and_then(numeric)
        .filter(|v| v.is_finite() && *v >= 1.0)
        .or_else(|| default_param(id, key))
        .map(|v| v.round().min(MAX_WINDOW_LEN as f64) as usize)
        .unwrap_or(1)
}

/// Accept numbers and numeric strings ("30") from loosely typed clients.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
