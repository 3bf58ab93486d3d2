use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use common::{Candle, Error, Result};

use crate::source::MarketFeed;

const BASE_URL: &str = "https://api.binance.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Public (unsigned) Binance kline endpoint. Used as the live candle feed.
pub struct BinanceKlines {
    base_url: String,
    interval: String,
    http: Client,
}

impl BinanceKlines {
    /// 1-minute klines from the production endpoint.
    pub fn new() -> Result<Self> {
        Self::with_base_url(BASE_URL, "1m")
    }

    pub fn with_base_url(base_url: impl Into<String>, interval: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            interval: interval.into(),
            http,
        })
    }
}

#[async_trait]
impl MarketFeed for BinanceKlines {
    async fn recent_candles(&self, pair: &str, limit: usize) -> Result<Vec<Candle>> {
        let url = format!(
            "{}/api/v3/klines?symbol={pair}&interval={}&limit={limit}",
            self.base_url, self.interval
        );
        debug!(pair = %pair, limit = limit, "Fetching klines");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Exchange(format!("HTTP {status}: {body}")));
        }
        let candles = parse_klines(&body)?;
        if let Some(latest) = candles.last() {
            debug!(pair = %pair, count = candles.len(), latest = %latest.time(), "Klines received");
        }
        Ok(candles)
    }
}

// ─── Binance kline JSON parsing ──────────────────────────────────────────────

/// Parse the `/api/v3/klines` response: an array of rows
/// `[open_time, "open", "high", "low", "close", "volume", close_time, ...]`.
pub fn parse_klines(body: &str) -> Result<Vec<Candle>> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body)?;
    rows.iter().map(|row| parse_row(row)).collect()
}

fn parse_row(row: &[Value]) -> Result<Candle> {
    if row.len() < 6 {
        return Err(Error::Exchange(format!(
            "kline row has {} fields, expected at least 6",
            row.len()
        )));
    }
    let timestamp = row[0]
        .as_i64()
        .ok_or_else(|| Error::Exchange(format!("kline open time is not an integer: {}", row[0])))?;

    Ok(Candle {
        timestamp,
        open: decimal(&row[1], "open")?,
        high: decimal(&row[2], "high")?,
        low: decimal(&row[3], "low")?,
        close: decimal(&row[4], "close")?,
        volume: decimal(&row[5], "volume")?,
    })
}

/// Binance sends prices as decimal strings.
fn decimal(value: &Value, field: &str) -> Result<f64> {
    match value {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
    .ok_or_else(|| Error::Exchange(format!("kline {field} is not numeric: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        [1700000000000, "36500.10", "36550.00", "36480.55", "36520.01", "12.345",
         1700000059999, "450000.0", 310, "6.1", "222000.0", "0"],
        [1700000060000, "36520.01", "36600.00", "36510.00", "36590.99", "8.5",
         1700000119999, "310000.0", 200, "4.0", "146000.0", "0"]
    ]"#;

    #[test]
    fn parses_kline_rows() {
        let candles = parse_klines(SAMPLE).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].timestamp, 1_700_000_000_000);
        assert_eq!(candles[0].open, 36500.10);
        assert_eq!(candles[0].low, 36480.55);
        assert_eq!(candles[1].close, 36590.99);
        assert_eq!(candles[1].volume, 8.5);
    }

    #[test]
    fn rejects_short_rows() {
        let err = parse_klines(r#"[[1700000000000, "1.0", "1.0"]]"#).unwrap_err();
        assert!(matches!(err, Error::Exchange(_)));
    }

    #[test]
    fn rejects_non_numeric_prices() {
        let err =
            parse_klines(r#"[[1700000000000, "x", "1.0", "1.0", "1.0", "1.0"]]"#).unwrap_err();
        assert!(err.to_string().contains("open"), "got: {err}");
    }

    #[test]
    fn error_payload_is_not_a_kline_list() {
        let err = parse_klines(r#"{"code": -1121, "msg": "Invalid symbol."}"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        let feed = BinanceKlines::with_base_url("http://127.0.0.1:9", "1m").unwrap();
        assert!(feed.recent_candles("BTCUSDT", 5).await.is_err());
    }
}
