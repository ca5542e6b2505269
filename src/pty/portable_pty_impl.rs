use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use portable_pty::{Child, CommandBuilder, MasterPty, PtySize, native_pty_system};
use tokio::sync::mpsc;
use tokio::task::spawn_blocking;
use tracing::{debug, error};

use crate::pty::pty_trait::{PtyConfig, PtyError, PtyEvent, PtyProcess, PtySpawner};

/// PTY implementation backed by `portable-pty`.
///
/// A dedicated reader thread drains the master side and forwards output
/// chunks over the event channel; when the reader hits EOF it reaps the
/// child and emits the single `Exit` event. Blocking spawn/resize/kill
/// calls run on the blocking pool.
pub struct PortablePty {
    master: Arc<Mutex<Box<dyn MasterPty + Send>>>,
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    child: Arc<Mutex<Box<dyn Child + Send + Sync>>>,
    exited: Arc<AtomicBool>,
}

impl PortablePty {
    fn open(config: &PtyConfig) -> Result<(Self, mpsc::UnboundedReceiver<PtyEvent>), PtyError> {
        let pty_system = native_pty_system();

        let pair = pty_system
            .openpty(PtySize {
                rows: config.rows,
                cols: config.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| PtyError::SpawnFailed(format!("failed to open PTY: {e}")))?;

        let mut cmd = CommandBuilder::new(&config.command);
        cmd.args(&config.args);
        // Copy the parent environment explicitly; config entries override
        for (key, value) in std::env::vars() {
            cmd.env(key, value);
        }
        for (key, value) in &config.env {
            cmd.env(key, value);
        }
        if let Some(cwd) = &config.cwd {
            cmd.cwd(cwd);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| PtyError::SpawnFailed(format!("failed to spawn command: {e}")))?;

        let writer = pair
            .master
            .take_writer()
            .map_err(|e| PtyError::SpawnFailed(format!("failed to take writer: {e}")))?;
        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| PtyError::SpawnFailed(format!("failed to clone reader: {e}")))?;

        let child = Arc::new(Mutex::new(child));
        let exited = Arc::new(AtomicBool::new(false));

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        spawn_reader_thread(reader, event_tx, child.clone(), exited.clone());

        Ok((
            Self {
                master: Arc::new(Mutex::new(pair.master)),
                writer: Arc::new(Mutex::new(writer)),
                child,
                exited,
            },
            event_rx,
        ))
    }
}

/// Drain PTY output until EOF, then reap the child and emit `Exit` once.
fn spawn_reader_thread(
    mut reader: Box<dyn Read + Send>,
    event_tx: mpsc::UnboundedSender<PtyEvent>,
    child: Arc<Mutex<Box<dyn Child + Send + Sync>>>,
    exited: Arc<AtomicBool>,
) {
    std::thread::spawn(move || {
        let mut buf = [0u8; 4096];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if event_tx.send(PtyEvent::Output(buf[..n].to_vec())).is_err() {
                        // Receiver gone; keep draining so the child can exit
                        continue;
                    }
                }
                Err(e) => {
                    debug!("PTY reader finished: {}", e);
                    break;
                }
            }
        }

        // EOF on the master side means the child is gone or going. Poll for
        // the exit status; the lock is held only per poll so kill() cannot
        // deadlock against us.
        let code = loop {
            let status = {
                let Ok(mut child) = child.lock() else { break -1 };
                child.try_wait()
            };
            match status {
                Ok(Some(status)) => break status.exit_code() as i32,
                Ok(None) => std::thread::sleep(std::time::Duration::from_millis(20)),
                Err(e) => {
                    error!("Failed to reap PTY child: {}", e);
                    break -1;
                }
            }
        };

        exited.store(true, Ordering::SeqCst);
        let _ = event_tx.send(PtyEvent::Exit(code));
    });
}

#[async_trait]
impl PtyProcess for PortablePty {
    fn write(&self, data: &[u8]) -> Result<(), PtyError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| PtyError::BackgroundTask(format!("writer lock poisoned: {e}")))?;
        writer.write_all(data)?;
        writer.flush()?;
        Ok(())
    }

    async fn resize(&self, cols: u16, rows: u16) -> Result<(), PtyError> {
        let master = self.master.clone();
        spawn_blocking(move || {
            let master = master
                .lock()
                .map_err(|e| PtyError::BackgroundTask(format!("master lock poisoned: {e}")))?;
            master
                .resize(PtySize {
                    rows,
                    cols,
                    pixel_width: 0,
                    pixel_height: 0,
                })
                .map_err(|e| PtyError::ResizeFailed(e.to_string()))
        })
        .await
        .map_err(|e| PtyError::BackgroundTask(e.to_string()))?
    }

    async fn kill(&self) -> Result<(), PtyError> {
        if self.exited.load(Ordering::SeqCst) {
            return Ok(());
        }

        let child = self.child.clone();
        spawn_blocking(move || {
            let mut child = child
                .lock()
                .map_err(|e| PtyError::BackgroundTask(format!("child lock poisoned: {e}")))?;
            // Already reaped (or reapable): nothing to kill
            if matches!(child.try_wait(), Ok(Some(_))) {
                return Ok(());
            }
            match child.kill() {
                Ok(()) => Ok(()),
                Err(e) => {
                    // Lost the race against the child exiting on its own
                    if matches!(child.try_wait(), Ok(Some(_))) {
                        Ok(())
                    } else {
                        Err(PtyError::Io(e))
                    }
                }
            }
        })
        .await
        .map_err(|e| PtyError::BackgroundTask(e.to_string()))?
    }

    fn is_alive(&self) -> bool {
        !self.exited.load(Ordering::SeqCst)
    }
}

/// Factory for `portable-pty` backed processes
pub struct PortablePtyFactory;

#[async_trait]
impl PtySpawner for PortablePtyFactory {
    async fn spawn(
        &self,
        config: &PtyConfig,
    ) -> Result<(Box<dyn PtyProcess>, mpsc::UnboundedReceiver<PtyEvent>), PtyError> {
        // Opening the PTY and forking the shell block on OS calls; keep them
        // off the async dispatch path
        let config = config.clone();
        let (pty, events) = spawn_blocking(move || PortablePty::open(&config))
            .await
            .map_err(|e| PtyError::BackgroundTask(e.to_string()))??;
        Ok((Box::new(pty), events))
    }

    fn name(&self) -> &'static str {
        "portable-pty"
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn sh_config() -> PtyConfig {
        PtyConfig {
            command: "/bin/sh".to_string(),
            args: vec![],
            cols: 80,
            rows: 24,
            env: vec![("TERM".to_string(), "xterm-256color".to_string())],
            cwd: None,
        }
    }

    async fn collect_until<F: Fn(&str) -> bool>(
        events: &mut mpsc::UnboundedReceiver<PtyEvent>,
        pred: F,
    ) -> String {
        let mut output = String::new();
        loop {
            let event = timeout(Duration::from_secs(5), events.recv())
                .await
                .expect("timed out waiting for PTY output")
                .expect("PTY event channel closed early");
            match event {
                PtyEvent::Output(bytes) => {
                    output.push_str(&String::from_utf8_lossy(&bytes));
                    if pred(&output) {
                        return output;
                    }
                }
                PtyEvent::Exit(code) => panic!("unexpected exit {code}, output so far: {output}"),
            }
        }
    }

    async fn wait_for_exit(events: &mut mpsc::UnboundedReceiver<PtyEvent>) -> i32 {
        loop {
            let event = timeout(Duration::from_secs(5), events.recv())
                .await
                .expect("timed out waiting for exit")
                .expect("PTY event channel closed without exit");
            if let PtyEvent::Exit(code) = event {
                return code;
            }
        }
    }

    #[tokio::test]
    async fn echo_output_arrives_in_order() {
        let (pty, mut events) = PortablePtyFactory.spawn(&sh_config()).await.unwrap();
        pty.write(b"echo RS_OBSERVE_OK\n").unwrap();
        let output = collect_until(&mut events, |o| o.contains("RS_OBSERVE_OK")).await;
        assert!(output.contains("RS_OBSERVE_OK"));
        pty.kill().await.unwrap();
    }

    #[tokio::test]
    async fn exit_delivers_code_exactly_once() {
        let (pty, mut events) = PortablePtyFactory.spawn(&sh_config()).await.unwrap();
        pty.write(b"exit 7\n").unwrap();
        assert_eq!(wait_for_exit(&mut events).await, 7);
        assert!(!pty.is_alive());
        // Channel closes after the single exit event
        let trailing = timeout(Duration::from_secs(5), events.recv()).await.unwrap();
        assert_eq!(trailing, None);
    }

    #[tokio::test]
    async fn kill_is_idempotent() {
        let (pty, mut events) = PortablePtyFactory.spawn(&sh_config()).await.unwrap();
        pty.kill().await.unwrap();
        wait_for_exit(&mut events).await;
        // Both an exited handle and a repeated kill are no-ops
        pty.kill().await.unwrap();
        pty.kill().await.unwrap();
        let trailing = timeout(Duration::from_secs(5), events.recv()).await.unwrap();
        assert_eq!(trailing, None);
    }

    #[tokio::test]
    async fn resize_succeeds_on_live_session() {
        let (pty, _events) = PortablePtyFactory.spawn(&sh_config()).await.unwrap();
        pty.resize(132, 43).await.unwrap();
        pty.kill().await.unwrap();
    }

    #[tokio::test]
    async fn missing_command_fails_or_exits_immediately() {
        let config = PtyConfig {
            command: "/nonexistent/definitely-not-a-shell".to_string(),
            ..sh_config()
        };
        // Depending on the platform the exec failure surfaces as a spawn
        // error or as an immediate nonzero exit
        match PortablePtyFactory.spawn(&config).await {
            Err(_) => {}
            Ok((_pty, mut events)) => {
                let code = wait_for_exit(&mut events).await;
                assert_ne!(code, 0);
            }
        }
    }
}
