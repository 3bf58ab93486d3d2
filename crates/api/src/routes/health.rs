use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

pub fn health_router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Liveness probe. Also reports whether a live market feed is configured.
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "exchange_available": state.feed.is_some(),
        "market_mode": state.config.market_mode.to_string(),
        "generative_commentary": state.panel.is_generative(),
    }))
}
