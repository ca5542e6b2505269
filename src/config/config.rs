/// Configuration data structures for rs_observe
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Terminal size configuration
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    /// Number of columns
    pub columns: u16,

    /// Number of rows
    pub rows: u16,
}

impl Default for TerminalSize {
    fn default() -> Self {
        // Geometry every new session starts with; clients resize afterwards
        Self {
            columns: 120,
            rows: 30,
        }
    }
}

/// Shell configuration for terminal sessions
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ShellConfig {
    /// Command to execute (optional, defaults to the platform shell)
    pub command: Option<Vec<String>>,

    /// Working directory (optional, defaults to $HOME)
    pub working_directory: Option<PathBuf>,

    /// Initial terminal size
    #[serde(default)]
    pub size: TerminalSize,
}

/// Event stream configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EventsConfig {
    /// Maximum number of events retained in memory
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Number of recent events replayed to a newly connected viewer
    #[serde(default = "default_replay_limit")]
    pub replay_limit: usize,
}

fn default_capacity() -> usize {
    1000
}

fn default_replay_limit() -> usize {
    50
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            replay_limit: default_replay_limit(),
        }
    }
}

/// Server configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// HTTP/WebSocket listen port (`PORT` env var)
    #[serde(default = "default_port")]
    pub http_port: u16,

    /// Terminal-access secret (`TERMINAL_PASSWORD` env var).
    /// `None` means the authentication step is skipped entirely.
    #[serde(skip)]
    pub terminal_password: Option<String>,

    /// Shell configuration for terminal sessions
    #[serde(default)]
    pub shell: ShellConfig,

    /// Event stream configuration
    #[serde(default)]
    pub events: EventsConfig,
}

fn default_port() -> u16 {
    4000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: default_port(),
            terminal_password: None,
            shell: ShellConfig::default(),
            events: EventsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Whether terminal connections must authenticate before a session
    /// is created.
    pub fn password_required(&self) -> bool {
        self.terminal_password.is_some()
    }
}
