//! stdio-bridge: proxy a TCP connection over standard input/output.
//!
//! Two pieces do the work:
//! - [`StdioHandler`] dials a destination and forwards it to a reader/writer
//!   pair (normally the process's stdin/stdout).
//! - [`SyntheticListener`] stands in for a socket listener so the generic
//!   [`Server`] loop and its shutdown path run unchanged in stdio mode.

// Core subsystems
pub mod context;
pub mod gate;
pub mod handler;
pub mod net;
pub mod server;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::BridgeConfig;
pub use context::{Context, ContextError};
pub use handler::{BridgeError, StdioHandler};
pub use lifecycle::Shutdown;
pub use net::{Listener, ListenerError, SyntheticListener};
pub use server::Server;
