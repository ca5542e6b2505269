/// In-memory PTY implementation for testing.
///
/// Behaves like a terminal with local echo: written bytes come straight
/// back as output. An `exit [code]` line terminates the fake process the
/// way `exit` terminates a real shell.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::pty::pty_trait::{PtyConfig, PtyError, PtyEvent, PtyProcess, PtySpawner};

struct MockState {
    alive: AtomicBool,
    size: Mutex<(u16, u16)>,
    events: mpsc::UnboundedSender<PtyEvent>,
}

impl MockState {
    /// Mark the fake process dead and emit the single exit event.
    fn finish(&self, code: i32) {
        if self.alive.swap(false, Ordering::SeqCst) {
            let _ = self.events.send(PtyEvent::Exit(code));
        }
    }
}

/// Echo-style mock PTY
pub struct MockPty {
    state: Arc<MockState>,
}

#[async_trait]
impl PtyProcess for MockPty {
    fn write(&self, data: &[u8]) -> Result<(), PtyError> {
        if !self.state.alive.load(Ordering::SeqCst) {
            return Ok(());
        }

        let _ = self.state.events.send(PtyEvent::Output(data.to_vec()));

        let text = String::from_utf8_lossy(data);
        let trimmed = text.trim();
        if trimmed == "exit" {
            self.state.finish(0);
        } else if let Some(code) = trimmed.strip_prefix("exit ") {
            self.state.finish(code.parse().unwrap_or(0));
        }
        Ok(())
    }

    async fn resize(&self, cols: u16, rows: u16) -> Result<(), PtyError> {
        if let Ok(mut size) = self.state.size.lock() {
            *size = (cols, rows);
        }
        Ok(())
    }

    async fn kill(&self) -> Result<(), PtyError> {
        self.state.finish(0);
        Ok(())
    }

    fn is_alive(&self) -> bool {
        self.state.alive.load(Ordering::SeqCst)
    }
}

/// Read-only view of a spawned mock, for assertions
pub struct MockPtyProbe {
    state: Arc<MockState>,
}

impl MockPtyProbe {
    pub fn is_alive(&self) -> bool {
        self.state.alive.load(Ordering::SeqCst)
    }

    pub fn size(&self) -> (u16, u16) {
        self.state.size.lock().map(|s| *s).unwrap_or((0, 0))
    }
}

/// Factory for mock PTYs; records every spawn for inspection
#[derive(Default)]
pub struct MockPtyFactory {
    spawned: Mutex<Vec<Arc<MockState>>>,
}

impl MockPtyFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many processes this factory has spawned
    pub fn spawn_count(&self) -> usize {
        self.spawned.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Probe the nth spawned process
    pub fn probe(&self, index: usize) -> Option<MockPtyProbe> {
        self.spawned
            .lock()
            .ok()
            .and_then(|s| s.get(index).cloned())
            .map(|state| MockPtyProbe { state })
    }
}

#[async_trait]
impl PtySpawner for MockPtyFactory {
    async fn spawn(
        &self,
        config: &PtyConfig,
    ) -> Result<(Box<dyn PtyProcess>, mpsc::UnboundedReceiver<PtyEvent>), PtyError> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let state = Arc::new(MockState {
            alive: AtomicBool::new(true),
            size: Mutex::new((config.cols, config.rows)),
            events: event_tx,
        });
        if let Ok(mut spawned) = self.spawned.lock() {
            spawned.push(state.clone());
        }
        Ok((Box::new(MockPty { state }), event_rx))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
