/// Per-socket authentication and dispatch state machine for the terminal
/// bridge.
///
/// The machine is pure: it consumes raw client frames and produces
/// `Directive` values for the socket loop to interpret, which keeps every
/// transition testable without a socket or a process.
use tracing::{debug, warn};

use crate::api::dto::{TerminalClientMessage, TerminalServerMessage};

/// Authentication phase of one terminal connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// A password is configured and has not been supplied yet
    AwaitingAuth,
    /// Credential accepted (or none required); session traffic flows
    Authenticated,
    /// Socket closed or errored; all further events are ignored
    Closed,
}

/// An effect the socket loop must carry out
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Send a protocol message to the client
    Reply(TerminalServerMessage),
    /// Create the terminal session for this connection
    StartSession,
    /// Forward input verbatim to the session
    WriteInput(String),
    /// Forward a geometry change to the session
    Resize { cols: u16, rows: u16 },
}

/// State for one terminal WebSocket
pub struct TerminalConnection {
    session_id: String,
    secret: Option<String>,
    phase: AuthPhase,
}

impl TerminalConnection {
    /// On-open transition.
    ///
    /// With no secret configured (or an empty one) the connection starts
    /// authenticated and the session is created immediately; otherwise the
    /// client is told to authenticate and no session exists yet.
    pub fn open(session_id: String, secret: Option<String>) -> (Self, Vec<Directive>) {
        let secret = secret.filter(|s| !s.is_empty());
        let (phase, directives) = match secret {
            Some(_) => (
                AuthPhase::AwaitingAuth,
                vec![Directive::Reply(TerminalServerMessage::AuthRequired)],
            ),
            None => (
                AuthPhase::Authenticated,
                vec![
                    Directive::Reply(TerminalServerMessage::AuthSuccess),
                    Directive::StartSession,
                ],
            ),
        };
        (
            Self {
                session_id,
                secret,
                phase,
            },
            directives,
        )
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn phase(&self) -> AuthPhase {
        self.phase
    }

    /// Handle one raw text frame from the client.
    ///
    /// Malformed frames are logged and dropped; they never close the
    /// connection. Messages arriving before authentication (other than
    /// `auth`) are discarded, not queued.
    pub fn on_frame(&mut self, raw: &str) -> Vec<Directive> {
        let message = match serde_json::from_str::<TerminalClientMessage>(raw) {
            Ok(message) => message,
            Err(e) => {
                warn!(
                    "Dropping malformed terminal message for {}: {}",
                    self.session_id, e
                );
                return vec![];
            }
        };

        match (self.phase, message) {
            (AuthPhase::AwaitingAuth, TerminalClientMessage::Auth { password }) => {
                if self.secret.as_deref() == Some(password.as_str()) {
                    // Session creation must follow the transition, never
                    // precede it
                    self.phase = AuthPhase::Authenticated;
                    vec![
                        Directive::Reply(TerminalServerMessage::AuthSuccess),
                        Directive::StartSession,
                    ]
                } else {
                    // Retries are unlimited
                    vec![Directive::Reply(TerminalServerMessage::AuthFailed)]
                }
            }
            (AuthPhase::AwaitingAuth, _) => vec![],
            (AuthPhase::Authenticated, TerminalClientMessage::Input { data }) => {
                vec![Directive::WriteInput(data)]
            }
            (AuthPhase::Authenticated, TerminalClientMessage::Resize { cols, rows })
                if cols > 0 && rows > 0 =>
            {
                vec![Directive::Resize { cols, rows }]
            }
            (AuthPhase::Authenticated, TerminalClientMessage::Resize { cols, rows }) => {
                debug!(
                    "Ignoring resize to {}x{} for {}",
                    cols, rows, self.session_id
                );
                vec![]
            }
            // A second auth cannot create a second session
            (AuthPhase::Authenticated, TerminalClientMessage::Auth { .. }) => vec![],
            (AuthPhase::Closed, _) => vec![],
        }
    }

    /// Close transition. Idempotent: returns true only the first time, so
    /// duplicate close/error events cannot double-run cleanup.
    pub fn on_close(&mut self) -> bool {
        if self.phase == AuthPhase::Closed {
            false
        } else {
            self.phase = AuthPhase::Closed;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_with_secret(secret: &str) -> (TerminalConnection, Vec<Directive>) {
        TerminalConnection::open("test-session".into(), Some(secret.to_string()))
    }

    #[test]
    fn no_secret_starts_authenticated_with_immediate_session() {
        let (conn, directives) = TerminalConnection::open("s".into(), None);
        assert_eq!(conn.phase(), AuthPhase::Authenticated);
        assert_eq!(
            directives,
            vec![
                Directive::Reply(TerminalServerMessage::AuthSuccess),
                Directive::StartSession,
            ]
        );
    }

    #[test]
    fn empty_secret_is_treated_as_no_secret() {
        let (conn, directives) = TerminalConnection::open("s".into(), Some(String::new()));
        assert_eq!(conn.phase(), AuthPhase::Authenticated);
        assert!(directives.contains(&Directive::StartSession));
    }

    #[test]
    fn secret_starts_awaiting_with_auth_required_only() {
        let (conn, directives) = open_with_secret("abc");
        assert_eq!(conn.phase(), AuthPhase::AwaitingAuth);
        assert_eq!(
            directives,
            vec![Directive::Reply(TerminalServerMessage::AuthRequired)]
        );
    }

    #[test]
    fn wrong_password_fails_any_number_of_times_without_a_session() {
        let (mut conn, _) = open_with_secret("abc");
        for _ in 0..5 {
            let directives = conn.on_frame(r#"{"type":"auth","password":"wrong"}"#);
            assert_eq!(
                directives,
                vec![Directive::Reply(TerminalServerMessage::AuthFailed)]
            );
            assert_eq!(conn.phase(), AuthPhase::AwaitingAuth);
        }
    }

    #[test]
    fn correct_password_authenticates_and_starts_exactly_one_session() {
        let (mut conn, _) = open_with_secret("abc");
        let directives = conn.on_frame(r#"{"type":"auth","password":"abc"}"#);
        assert_eq!(
            directives,
            vec![
                Directive::Reply(TerminalServerMessage::AuthSuccess),
                Directive::StartSession,
            ]
        );
        assert_eq!(conn.phase(), AuthPhase::Authenticated);

        // A repeated auth is ignored rather than creating a second session
        let directives = conn.on_frame(r#"{"type":"auth","password":"abc"}"#);
        assert!(directives.is_empty());
    }

    #[test]
    fn input_before_auth_is_silently_dropped() {
        let (mut conn, _) = open_with_secret("abc");
        assert!(conn.on_frame(r#"{"type":"input","data":"ls\n"}"#).is_empty());
        assert!(
            conn.on_frame(r#"{"type":"resize","cols":80,"rows":24}"#)
                .is_empty()
        );
        // Dropped means dropped: authenticating now does not replay them
        let directives = conn.on_frame(r#"{"type":"auth","password":"abc"}"#);
        assert_eq!(directives.len(), 2);
    }

    #[test]
    fn authenticated_input_forwards_verbatim() {
        let (mut conn, _) = TerminalConnection::open("s".into(), None);
        let directives = conn.on_frame(r#"{"type":"input","data":"echo hi\n"}"#);
        assert_eq!(directives, vec![Directive::WriteInput("echo hi\n".into())]);
    }

    #[test]
    fn resize_requires_positive_geometry() {
        let (mut conn, _) = TerminalConnection::open("s".into(), None);
        assert!(
            conn.on_frame(r#"{"type":"resize","cols":0,"rows":24}"#)
                .is_empty()
        );
        assert!(
            conn.on_frame(r#"{"type":"resize","cols":80,"rows":0}"#)
                .is_empty()
        );
        let directives = conn.on_frame(r#"{"type":"resize","cols":80,"rows":24}"#);
        assert_eq!(directives, vec![Directive::Resize { cols: 80, rows: 24 }]);
    }

    #[test]
    fn malformed_frames_are_dropped_without_closing() {
        let (mut conn, _) = TerminalConnection::open("s".into(), None);
        assert!(conn.on_frame("not json at all").is_empty());
        assert!(conn.on_frame(r#"{"type":"unknown"}"#).is_empty());
        assert_eq!(conn.phase(), AuthPhase::Authenticated);
    }

    #[test]
    fn close_is_idempotent_and_final() {
        let (mut conn, _) = TerminalConnection::open("s".into(), None);
        assert!(conn.on_close());
        assert!(!conn.on_close());
        assert!(conn.on_frame(r#"{"type":"input","data":"x"}"#).is_empty());
    }
}
