/// Terminal socket loop: drives one WebSocket from upgrade to cleanup.
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::api::dto::TerminalServerMessage;
use crate::app_state::AppState;
use crate::pty::shell_pty_config;
use crate::service::connection::{Directive, TerminalConnection};

/// Handle a terminal WebSocket for its whole lifetime.
///
/// Protocol replies and PTY output leave through a single outbound channel
/// drained by this loop, so socket writes are serialized and frames never
/// interleave. Any exit from the loop, close or transport error alike,
/// funnels into the same idempotent teardown that kills the session.
pub async fn handle_terminal_socket(socket: WebSocket, session_id: String, state: AppState) {
    info!("Terminal connection opened: {}", session_id);

    let (mut ws_tx, mut ws_rx) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<TerminalServerMessage>();

    let (mut conn, directives) = TerminalConnection::open(
        session_id.clone(),
        state.config.terminal_password.clone(),
    );
    apply_directives(directives, &session_id, &state, &out_tx).await;

    loop {
        tokio::select! {
            outbound = out_rx.recv() => {
                // recv cannot yield None while out_tx lives in this scope
                let Some(message) = outbound else { break };
                match serde_json::to_string(&message) {
                    Ok(text) => {
                        if ws_tx.send(Message::Text(text)).await.is_err() {
                            // Send failure is connection loss
                            break;
                        }
                    }
                    Err(e) => error!("Failed to encode terminal message: {}", e),
                }
            }
            frame = ws_rx.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let directives = conn.on_frame(&text);
                        apply_directives(directives, &session_id, &state, &out_tx).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    // Binary/ping/pong frames are not part of the protocol
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("Terminal socket error for {}: {}", session_id, e);
                        break;
                    }
                }
            }
        }
    }

    if conn.on_close() {
        state.terminals.close(&session_id).await;
        info!("Terminal connection closed: {}", session_id);
    }
}

async fn apply_directives(
    directives: Vec<Directive>,
    session_id: &str,
    state: &AppState,
    out_tx: &mpsc::UnboundedSender<TerminalServerMessage>,
) {
    for directive in directives {
        match directive {
            Directive::Reply(message) => {
                let _ = out_tx.send(message);
            }
            Directive::StartSession => {
                let config = shell_pty_config(&state.config.shell);
                if let Err(e) = state
                    .terminals
                    .create(session_id, &config, out_tx.clone())
                    .await
                {
                    // A spawn failure reads as an immediately-terminated
                    // session rather than a silently hanging connection
                    error!("Failed to create terminal session {}: {}", session_id, e);
                    let _ = out_tx.send(TerminalServerMessage::Exit { code: -1 });
                }
            }
            Directive::WriteInput(data) => state.terminals.write(session_id, &data).await,
            Directive::Resize { cols, rows } => {
                state.terminals.resize(session_id, cols, rows).await
            }
        }
    }
}
