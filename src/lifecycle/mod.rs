//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() → cancel shared Context → server closes its listener
//!     → accept loop sees ListenerError::Closed → drain sessions → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop accept, drain, close
//! - Shutdown has timeout: sessions still running after the deadline are abandoned

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
