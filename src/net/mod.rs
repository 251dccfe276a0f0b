//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound:
//!     dialer.rs (TcpDialer, context-bounded connect)
//!     → BoxedConnection handed to the forwarder
//!
//! Inbound (server loop):
//!     listener.rs (Listener trait; TcpAcceptor with connection limits)
//!     synthetic.rs (SyntheticListener: parks until close, never accepts)
//!     → connection.rs (session IDs, drain tracking)
//!
//! Stdio:
//!     stream.rs (StdioStream joins a reader and a writer into one connection)
//! ```
//!
//! # Design Decisions
//! - Real and synthetic listeners share one trait; the accept loop cannot tell them apart
//! - A closed listener always reports `ListenerError::Closed`
//! - Every type-erased stream is a `BoxedConnection`

pub mod addr;
pub mod connection;
pub mod dialer;
pub mod listener;
pub mod stream;
pub mod synthetic;

pub use addr::{NetworkAddr, SyntheticAddr, TcpAddr};
pub use dialer::{Dialer, TcpDialer};
pub use listener::{Accepted, Listener, ListenerError, TcpAcceptor};
pub use stream::{BoxedConnection, Connection, StdioStream};
pub use synthetic::SyntheticListener;
