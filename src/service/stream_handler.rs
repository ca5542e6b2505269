/// Stream socket loop: one fan-out viewer from subscribe to unsubscribe.
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, error, info};

use crate::app_state::AppState;

/// Handle an event-stream WebSocket.
///
/// The viewer is seeded with the recent-event replay, then receives live
/// events until it disconnects. Viewers only listen; inbound frames other
/// than close are ignored.
pub async fn handle_stream_socket(socket: WebSocket, state: AppState) {
    let replay = state.events.recent(state.config.events.replay_limit).await;
    let (subscriber_id, mut events) = state.stream.subscribe(replay).await;
    info!("Stream viewer {} connected", subscriber_id);

    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            outbound = events.recv() => {
                let Some(message) = outbound else { break };
                match serde_json::to_string(&message) {
                    Ok(text) => {
                        if ws_tx.send(Message::Text(text)).await.is_err() {
                            // Implicit disconnect
                            break;
                        }
                    }
                    Err(e) => error!("Failed to encode stream message: {}", e),
                }
            }
            frame = ws_rx.next() => {
                match frame {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("Stream socket error for viewer {}: {}", subscriber_id, e);
                        break;
                    }
                }
            }
        }
    }

    state.stream.unsubscribe(subscriber_id).await;
    info!("Stream viewer {} disconnected", subscriber_id);
}
