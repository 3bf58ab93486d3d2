use std::str::FromStr;
use std::time::Duration;

use crate::{Error, MarketMode, Result};

pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-20240620";

/// All configuration loaded from environment variables at startup.
/// Every variable is optional; a present but unparsable value is an error.
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,
    /// Delay between two evaluation ticks of a deployment session.
    pub tick_interval: Duration,
    /// Pause between consecutive analyst comments.
    pub comment_delay: Duration,

    // Session
    pub initial_balance: f64,
    /// Rolling history kept per session (candles).
    pub history_len: usize,
    /// Simulated candles generated before the first tick.
    pub warmup_candles: usize,

    // Market data
    pub market_mode: MarketMode,
    pub market_pair: String,

    // Commentary
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,

    // Preset strategy file path
    pub strategy_presets_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            tick_interval: Duration::from_secs(5),
            comment_delay: Duration::from_millis(500),
            initial_balance: 10_000.0,
            history_len: 50,
            warmup_candles: 30,
            market_mode: MarketMode::Simulated,
            market_pair: "BTCUSDT".to_string(),
            anthropic_api_key: None,
            anthropic_model: DEFAULT_ANTHROPIC_MODEL.to_string(),
            strategy_presets_path: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    /// Loads `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        let defaults = Config::default();

        let initial_balance = parsed_env("INITIAL_BALANCE")?.unwrap_or(defaults.initial_balance);
        if !(initial_balance.is_finite() && initial_balance >= 0.0) {
            return Err(Error::Config(format!(
                "INITIAL_BALANCE must be a non-negative number, got: {initial_balance}"
            )));
        }

        let history_len = parsed_env("HISTORY_LEN")?.unwrap_or(defaults.history_len);
        if history_len < 2 {
            return Err(Error::Config(format!(
                "HISTORY_LEN must be at least 2, got: {history_len}"
            )));
        }

        Ok(Config {
            port: parsed_env("DEPLOY_PORT")?.unwrap_or(defaults.port),
            tick_interval: parsed_env("TICK_INTERVAL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick_interval),
            comment_delay: parsed_env("COMMENT_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.comment_delay),
            initial_balance,
            history_len,
            warmup_candles: parsed_env("WARMUP_CANDLES")?.unwrap_or(defaults.warmup_candles),
            market_mode: parsed_env("MARKET_MODE")?.unwrap_or(defaults.market_mode),
            market_pair: optional_env("MARKET_PAIR")
                .map(|p| p.to_uppercase())
                .unwrap_or(defaults.market_pair),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY").filter(|k| !k.is_empty()),
            anthropic_model: optional_env("ANTHROPIC_MODEL").unwrap_or(defaults.anthropic_model),
            strategy_presets_path: optional_env("STRATEGY_PRESETS_PATH"),
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string())
}

fn parsed_env<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_env(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| Error::Config(format!("{key}='{raw}' is invalid: {e}")))
        })
        .transpose()
}
