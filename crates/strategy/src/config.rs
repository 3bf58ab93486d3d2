use serde::{Deserialize, Serialize};

use common::{Error, Result};

use crate::blocks::Block;

/// Name used when a client deploys a strategy without one.
pub const UNNAMED_STRATEGY: &str = "Unknown";

/// Preset strategy file (TOML).
///
/// Example `config/strategies.toml`:
/// ```toml
/// [[strategy]]
/// name = "Cautious RSI"
///
/// [[strategy.blocks]]
/// id = "rsi-gate"
/// category = "entry"
/// params = { threshold = 25 }
///
/// [[strategy.blocks]]
/// id = "stop-loss"
/// category = "exit"
/// params = { percentage = 1.5 }
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StrategyFileConfig {
    #[serde(rename = "strategy", default)]
    pub strategies: Vec<StrategyConfig>,
}

/// A named, ordered block list. Same shape on the wire and in preset files.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyConfig {
    /// Human-readable name shown in logs and status updates.
    #[serde(default = "unnamed")]
    pub name: String,
    /// Ordered blocks. Exit blocks resolve ties by this order.
    #[serde(default)]
    pub blocks: Vec<Block>,
    /// Preset to borrow blocks from when `blocks` is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
}

fn unnamed() -> String {
    UNNAMED_STRATEGY.to_string()
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            name: unnamed(),
            blocks: Vec::new(),
            preset: None,
        }
    }
}

impl StrategyFileConfig {
    /// Load presets from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read strategy presets at '{path}': {e}"))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse strategy presets at '{path}': {e}")))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Case-insensitive preset lookup by name.
    pub fn find(&self, name: &str) -> Option<&StrategyConfig> {
        self.strategies
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Fill in a requested strategy's blocks from its preset, if it has none
    /// of its own. Unknown presets leave the request unchanged.
    pub fn resolve(&self, mut requested: StrategyConfig) -> StrategyConfig {
        if requested.blocks.is_empty() {
            if let Some(preset) = requested.preset.as_deref().and_then(|p| self.find(p)) {
                requested.blocks = preset.blocks.clone();
                if requested.name == UNNAMED_STRATEGY {
                    requested.name = preset.name.clone();
                }
            }
        }
        requested
    }
}
