//! Session handlers.
//!
//! # Data Flow
//! ```text
//! StdioHandler::handle(ctx, reader, writer, destination)
//!     → log the session (fixed stdio labels)
//!     → Dialer::dial("tcp", destination)      [ctx-bounded]
//!     → StdioStream::new(reader, writer)
//!     → Forwarder::forward(stdio, target)     [ctx-bounded]
//!     → shut down and drop the dialed connection
//! ```
//!
//! # Design Decisions
//! - Dial failures are wrapped with the destination; forwarder errors are not
//! - No retries at this layer; callers own recovery policy
//! - Dialer and forwarder are injected, so tests run without sockets

pub mod error;
pub mod forward;
pub mod stdio;

pub use error::BridgeError;
pub use forward::{CopyForwarder, Forwarder};
pub use stdio::StdioHandler;
