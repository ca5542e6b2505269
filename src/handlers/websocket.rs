/// WebSocket upgrade handlers.
///
/// Upgrade requests classify into exactly one protocol by route, before
/// any per-connection state exists: `/stream` registers a fan-out viewer,
/// `/terminal` runs the authentication state machine and terminal bridge.
use axum::{
    extract::State,
    extract::ws::WebSocketUpgrade,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::service::{handle_stream_socket, handle_terminal_socket};

/// Upgrade handler for the event-stream protocol
pub async fn stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_stream_socket(socket, state))
}

/// Upgrade handler for the terminal protocol.
///
/// The session identifier is minted here, once per upgrade, and names this
/// bridge for its entire lifetime.
pub async fn terminal_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let session_id = Uuid::new_v4().to_string();
    ws.on_upgrade(move |socket| handle_terminal_socket(socket, session_id, state))
}
