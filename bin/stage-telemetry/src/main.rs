use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use api::AppState;
use commentary::{AnalystPanel, AnthropicProvider};
use common::{Config, MarketMode, Result};
use market::{BinanceKlines, MarketFeed};
use strategy::StrategyFileConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env()?;
    info!(
        mode = %cfg.market_mode,
        pair = %cfg.market_pair,
        port = cfg.port,
        "Stage telemetry starting"
    );

    // ── Market feed (selected by MARKET_MODE) ─────────────────────────────────
    let feed: Option<Arc<dyn MarketFeed>> = match cfg.market_mode {
        MarketMode::Live => {
            info!("Live market mode, using Binance klines with simulated fallback");
            Some(Arc::new(BinanceKlines::new()?))
        }
        MarketMode::Simulated => {
            info!("Simulated market mode");
            None
        }
    };

    // ── Analyst commentary ────────────────────────────────────────────────────
    let panel = match cfg.anthropic_api_key.as_deref() {
        Some(key) => {
            info!(model = %cfg.anthropic_model, "Generative analyst commentary enabled");
            AnalystPanel::with_provider(Arc::new(AnthropicProvider::new(key, &cfg.anthropic_model)?))
        }
        None => {
            info!("No ANTHROPIC_API_KEY, analysts use scripted lines");
            AnalystPanel::scripted()
        }
    };

    // ── Strategy presets ──────────────────────────────────────────────────────
    let presets = match cfg.strategy_presets_path.as_deref() {
        Some(path) => {
            let file = StrategyFileConfig::load(path)?;
            info!(path, count = file.strategies.len(), "Strategy presets loaded");
            file
        }
        None => StrategyFileConfig::default(),
    };

    // ── Deployment server ─────────────────────────────────────────────────────
    let port = cfg.port;
    let state = AppState {
        config: Arc::new(cfg),
        feed,
        panel,
        presets: Arc::new(presets),
    };

    tokio::select! {
        res = api::serve(state, port) => {
            if let Err(e) = &res {
                warn!(error = %e, "Deployment server stopped");
            }
            res?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, stopping stage telemetry");
        }
    }

    Ok(())
}
