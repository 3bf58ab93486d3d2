pub mod protocol;
pub mod routes;
pub mod session;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use commentary::AnalystPanel;
use common::{Config, Result};
use market::MarketFeed;
use strategy::StrategyFileConfig;

pub use protocol::{DeploymentRequest, StatusUpdate, StreamMessage};
pub use session::{Session, TickStep};

/// Shared application state injected into every route handler.
/// Everything here is read-only; per-connection state lives in [`Session`].
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Live candle feed; `None` runs every session on simulated data.
    pub feed: Option<Arc<dyn MarketFeed>>,
    pub panel: AnalystPanel,
    pub presets: Arc<StrategyFileConfig>,
}

/// All routes with CORS and request tracing applied.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any);

    Router::new()
        .merge(routes::health_router())
        .merge(routes::presets_router())
        .merge(routes::deployment_router())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Bind and run the deployment server until it fails.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Deployment server listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
