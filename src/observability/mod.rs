//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (destination, peer_addr, error)
//!
//! Consumers:
//!     → logging.rs (fmt layer on stderr, EnvFilter)
//! ```

pub mod logging;

pub use logging::init_logging;
