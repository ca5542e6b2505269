/// Connection-management and terminal-session core
mod broadcast;
mod connection;
mod event_store;
mod session_handler;
mod session_registry;
mod stream_handler;

pub use broadcast::{BroadcastRegistry, SubscriberId};
pub use connection::{AuthPhase, Directive, TerminalConnection};
pub use event_store::EventStore;
pub use session_handler::handle_terminal_socket;
pub use session_registry::SessionRegistry;
pub use stream_handler::handle_stream_socket;
