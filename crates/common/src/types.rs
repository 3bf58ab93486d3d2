use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV observation. Produced by the market source and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Candle open time, unix milliseconds.
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Timestamp as a UTC datetime. Out-of-range values clamp to the epoch.
    pub fn time(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.timestamp)
            .single()
            .unwrap_or_default()
    }
}

/// Where a session's candles come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MarketMode {
    /// Locally generated random-walk candles.
    #[default]
    Simulated,
    /// Exchange klines, falling back to simulation when the exchange is unreachable.
    Live,
}

impl std::fmt::Display for MarketMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketMode::Simulated => write!(f, "simulated"),
            MarketMode::Live => write!(f, "live"),
        }
    }
}

impl std::str::FromStr for MarketMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "simulated" | "sim" => Ok(MarketMode::Simulated),
            "live" => Ok(MarketMode::Live),
            other => Err(crate::Error::Config(format!(
                "MARKET_MODE must be 'simulated' or 'live', got: '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candle_serializes_with_millisecond_timestamp() {
        let candle = Candle {
            timestamp: 1_700_000_000_000,
            open: 100.0,
            high: 101.5,
            low: 99.25,
            close: 100.75,
            volume: 12.0,
        };
        let json = serde_json::to_value(candle).unwrap();
        assert_eq!(json["timestamp"], 1_700_000_000_000i64);
        assert_eq!(json["close"], 100.75);
        assert_eq!(candle.time().timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn market_mode_parses_case_insensitively() {
        assert_eq!("LIVE".parse::<MarketMode>().unwrap(), MarketMode::Live);
        assert_eq!(" simulated ".parse::<MarketMode>().unwrap(), MarketMode::Simulated);
        assert!("paper".parse::<MarketMode>().is_err());
    }
}
