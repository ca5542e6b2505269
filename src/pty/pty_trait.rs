use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Configuration for spawning a PTY-backed process
#[derive(Debug, Clone)]
pub struct PtyConfig {
    pub command: String,
    pub args: Vec<String>,
    pub cols: u16,
    pub rows: u16,
    /// Environment overrides on top of the inherited environment
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum PtyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Process spawn failed: {0}")]
    SpawnFailed(String),
    #[error("Resize failed: {0}")]
    ResizeFailed(String),
    #[error("Background task error: {0}")]
    BackgroundTask(String),
}

/// Asynchronous notifications from a spawned process.
///
/// Output chunks arrive in order with no buffering beyond the OS PTY.
/// `Exit` is delivered exactly once, after the final output chunk; nothing
/// follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PtyEvent {
    /// A chunk of raw terminal output
    Output(Vec<u8>),
    /// The process terminated with the given exit code
    Exit(i32),
}

/// A live PTY-backed process.
#[async_trait]
pub trait PtyProcess: Send + Sync {
    /// Write input bytes to the process
    fn write(&self, data: &[u8]) -> Result<(), PtyError>;

    /// Resize the terminal
    async fn resize(&self, cols: u16, rows: u16) -> Result<(), PtyError>;

    /// Terminate the process. Idempotent: killing an already-exited or
    /// already-killed process is a no-op, never an error.
    async fn kill(&self) -> Result<(), PtyError>;

    /// Check whether the process is still running
    fn is_alive(&self) -> bool;
}

/// PTY factory trait
#[async_trait]
pub trait PtySpawner: Send + Sync {
    /// Spawn a new process attached to a pseudo-terminal. The receiver
    /// yields output chunks as they arrive and ends with a single `Exit`.
    async fn spawn(
        &self,
        config: &PtyConfig,
    ) -> Result<(Box<dyn PtyProcess>, mpsc::UnboundedReceiver<PtyEvent>), PtyError>;

    /// Factory name
    fn name(&self) -> &'static str;
}
