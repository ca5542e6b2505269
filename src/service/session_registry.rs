/// Terminal session registry: session id -> owned PTY process.
///
/// Sessions are created lazily once authentication succeeds and destroyed
/// when the owning socket closes or the process exits, whichever happens
/// first. Output and exit events are wrapped as typed messages and pushed
/// into the owning connection's outbound channel.
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tracing::{info, warn};

use crate::api::dto::TerminalServerMessage;
use crate::pty::{PtyConfig, PtyError, PtyEvent, PtyProcess, PtySpawner};

#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<String, Arc<dyn PtyProcess>>>>,
    spawner: Arc<dyn PtySpawner>,
}

impl SessionRegistry {
    pub fn new(spawner: Arc<dyn PtySpawner>) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            spawner,
        }
    }

    /// Spawn the shell and register the session.
    ///
    /// Called at most once per session id (the connection state machine
    /// enforces single-create). The forwarding task owns the event
    /// receiver: output becomes `output` messages; the exit notification
    /// removes the registry entry and becomes the final `exit` message.
    pub async fn create(
        &self,
        session_id: &str,
        config: &PtyConfig,
        outbound: mpsc::UnboundedSender<TerminalServerMessage>,
    ) -> Result<(), PtyError> {
        let (pty, mut events) = self.spawner.spawn(config).await?;
        let pty: Arc<dyn PtyProcess> = Arc::from(pty);

        {
            let mut sessions = self.sessions.lock().await;
            if sessions.insert(session_id.to_string(), pty).is_some() {
                warn!("Replaced a live session entry for {}", session_id);
            }
        }
        info!("Created terminal session {}", session_id);

        let registry = self.clone();
        let session_id = session_id.to_string();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    PtyEvent::Output(bytes) => {
                        let data = String::from_utf8_lossy(&bytes).into_owned();
                        if outbound
                            .send(TerminalServerMessage::Output { data })
                            .is_err()
                        {
                            // Owning socket is gone; its close path kills us
                            break;
                        }
                    }
                    PtyEvent::Exit(code) => {
                        registry.remove(&session_id).await;
                        info!("Terminal session {} exited with code {}", session_id, code);
                        let _ = outbound.send(TerminalServerMessage::Exit { code });
                        break;
                    }
                }
            }
        });

        Ok(())
    }

    /// Forward input to the session; no-op for unknown ids (the session may
    /// have already exited).
    pub async fn write(&self, session_id: &str, data: &str) {
        if let Some(pty) = self.get(session_id).await {
            if let Err(e) = pty.write(data.as_bytes()) {
                warn!("Write to terminal session {} failed: {}", session_id, e);
            }
        }
    }

    /// Forward a resize to the session; no-op for unknown ids.
    pub async fn resize(&self, session_id: &str, cols: u16, rows: u16) {
        if let Some(pty) = self.get(session_id).await {
            if let Err(e) = pty.resize(cols, rows).await {
                warn!("Resize of terminal session {} failed: {}", session_id, e);
            }
        }
    }

    /// Kill the process and drop the entry; no-op for unknown ids, so a
    /// close racing a natural exit is harmless.
    pub async fn close(&self, session_id: &str) {
        if let Some(pty) = self.remove(session_id).await {
            if let Err(e) = pty.kill().await {
                warn!("Kill of terminal session {} failed: {}", session_id, e);
            }
            info!("Closed terminal session {}", session_id);
        }
    }

    /// Number of live sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn contains(&self, session_id: &str) -> bool {
        self.sessions.lock().await.contains_key(session_id)
    }

    async fn get(&self, session_id: &str) -> Option<Arc<dyn PtyProcess>> {
        self.sessions.lock().await.get(session_id).cloned()
    }

    async fn remove(&self, session_id: &str) -> Option<Arc<dyn PtyProcess>> {
        self.sessions.lock().await.remove(session_id)
    }
}
