use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::protocol::{DeploymentRequest, StreamMessage};
use crate::session::Session;
use crate::AppState;

pub fn deployment_router() -> Router<AppState> {
    Router::new().route("/deployment", get(deployment_handler))
}

/// WebSocket endpoint running one strategy session per connection.
/// The client's first text frame is the [`DeploymentRequest`].
async fn deployment_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| run_deployment(socket, state))
}

async fn run_deployment(mut socket: WebSocket, state: AppState) {
    let Some(request) = read_request(&mut socket).await else {
        if let Err(e) = socket.send(Message::Close(None)).await {
            debug!(error = %e, "Close frame not delivered");
        }
        return;
    };

    let strategy = state.presets.resolve(request.strategy);
    let mut session = Session::from_state(strategy, &state);
    info!(
        session = %session.id(),
        name = %session.name(),
        blocks = session.engine().blocks().len(),
        "Deployment session started"
    );

    let tick_interval = state.config.tick_interval;
    let comment_delay = state.config.comment_delay;

    'session: loop {
        let step = session.advance().await;
        for frame in step.frames() {
            if !send_frame(&mut socket, &frame).await {
                break 'session;
            }
        }
        for analyst in session.reacting_analysts(&step.decision) {
            let comment = session.comment(analyst, &step.decision).await;
            if !send_frame(&mut socket, &StreamMessage::AnalystComment(comment)).await {
                break 'session;
            }
            if !comment_delay.is_zero() {
                tokio::time::sleep(comment_delay).await;
            }
        }
        for frame in session.closing_frames() {
            if !send_frame(&mut socket, &frame).await {
                break 'session;
            }
        }

        if !wait_for_next_tick(&mut socket, tick_interval).await {
            break;
        }
    }

    info!(
        session = %session.id(),
        name = %session.name(),
        pnl = session.engine().pnl(),
        trade_count = session.engine().trade_count(),
        balance = session.ledger().balance(),
        "Deployment session ended"
    );
}

/// Encode and send one frame. `false` once the client is gone.
async fn send_frame(socket: &mut WebSocket, message: &StreamMessage) -> bool {
    let text = match serde_json::to_string(message) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Failed to encode frame");
            return true;
        }
    };
    match socket.send(Message::Text(text)).await {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "Frame send failed, ending session");
            false
        }
    }
}

/// Wait for the first text frame and parse it. `None` on disconnect or a
/// malformed request.
async fn read_request(socket: &mut WebSocket) -> Option<DeploymentRequest> {
    loop {
        match socket.recv().await? {
            Ok(Message::Text(text)) => {
                return match serde_json::from_str::<DeploymentRequest>(&text) {
                    Ok(request) => Some(request),
                    Err(e) => {
                        warn!(error = %e, "Rejecting malformed deployment request");
                        None
                    }
                };
            }
            Ok(Message::Close(_)) | Err(_) => return None,
            // Pings and binary frames before the request are ignored.
            Ok(_) => continue,
        }
    }
}

/// Sleep for `interval` while draining incoming frames. Returns `false` if
/// the client went away.
async fn wait_for_next_tick(socket: &mut WebSocket, interval: Duration) -> bool {
    let deadline = Instant::now() + interval;
    loop {
        tokio::select! {
            _ = sleep_until(deadline) => return true,
            incoming = socket.recv() => match incoming {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => return false,
                Some(Ok(_)) => {}
            },
        }
    }
}
