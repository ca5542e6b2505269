/// Data Transfer Objects for the WebSocket protocols and REST endpoints
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Client-to-server messages on the terminal WebSocket.
///
/// JSON text frames tagged by `type`:
/// `{"type":"auth","password":"..."}`, `{"type":"input","data":"..."}`,
/// `{"type":"resize","cols":120,"rows":30}`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TerminalClientMessage {
    /// Authentication attempt with the shared secret
    Auth {
        #[serde(default)]
        password: String,
    },

    /// Raw keystrokes to forward to the shell
    Input { data: String },

    /// New terminal geometry
    Resize { cols: u16, rows: u16 },
}

/// Server-to-client messages on the terminal WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TerminalServerMessage {
    /// Sent once on connect when a password is configured
    AuthRequired,

    /// Authentication passed (or was not required); a session follows
    AuthSuccess,

    /// Wrong password; the client may retry
    AuthFailed,

    /// A chunk of raw terminal output
    Output { data: String },

    /// The shell process terminated; no further output follows
    Exit { code: i32 },
}

/// Server-to-client messages on the event-stream WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamServerMessage {
    /// Recent-event replay, sent exactly once on connect, most-recent-last
    Initial { data: Vec<Value> },

    /// One live ingested event
    Event { data: Value },
}

/// Response DTO for the event ingestion endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Success flag
    pub success: bool,

    /// Number of events accepted
    pub count: usize,
}
