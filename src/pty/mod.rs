/// PTY (pseudo-terminal) handling for the terminal bridge.
///
/// A trait seam separates the session registry from the concrete PTY
/// backend: `portable-pty` in production, an in-memory echo implementation
/// for tests. Output and exit notifications travel over a channel so the
/// backend's threading never touches socket write serialization.
mod mock_pty;
mod portable_pty_impl;
mod pty_trait;

pub use mock_pty::{MockPty, MockPtyFactory, MockPtyProbe};
pub use portable_pty_impl::{PortablePty, PortablePtyFactory};
pub use pty_trait::*;

use crate::config::ShellConfig;

/// Build the PTY configuration for an interactive shell session.
///
/// Command, working directory, and geometry come from the shell config with
/// platform defaults; the environment is inherited from this process and
/// augmented to advertise a color-capable terminal.
pub fn shell_pty_config(shell: &ShellConfig) -> PtyConfig {
    let (command, args) = match &shell.command {
        Some(parts) if !parts.is_empty() => (parts[0].clone(), parts[1..].to_vec()),
        _ => (default_shell(), vec![]),
    };

    let cwd = shell
        .working_directory
        .clone()
        .or_else(|| std::env::var_os("HOME").map(Into::into))
        .or_else(|| std::env::current_dir().ok());

    PtyConfig {
        command,
        args,
        cols: shell.size.columns,
        rows: shell.size.rows,
        env: vec![
            ("TERM".to_string(), "xterm-256color".to_string()),
            ("COLORTERM".to_string(), "truecolor".to_string()),
        ],
        cwd,
    }
}

/// The platform's interactive shell.
#[cfg(unix)]
pub fn default_shell() -> String {
    std::env::var("SHELL").unwrap_or_else(|_| "/bin/bash".to_string())
}

#[cfg(windows)]
pub fn default_shell() -> String {
    "powershell.exe".to_string()
}
