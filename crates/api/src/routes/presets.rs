use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

pub fn presets_router() -> Router<AppState> {
    Router::new().route("/presets", get(list_presets))
}

/// Preset strategies a client may deploy by name.
async fn list_presets(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "presets": state.presets.strategies }))
}
