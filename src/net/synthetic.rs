//! A listener that never produces connections.
//!
//! Servers whose traffic does not arrive through a socket (stdio mode) still
//! run the generic accept loop and shutdown path. [`SyntheticListener`] gives
//! that loop something to wait on: `accept` parks until `close`, then reports
//! [`ListenerError::Closed`] exactly like a real listener would.
//!
//! # States
//! ```text
//! Open ──close()──▶ Closed (terminal)
//! ```

use async_trait::async_trait;

use crate::gate::CloseGate;
use crate::net::addr::{NetworkAddr, SyntheticAddr};
use crate::net::listener::{Accepted, Listener, ListenerError};

/// Listener stub bound to no socket.
#[derive(Debug)]
pub struct SyntheticListener {
    address: SyntheticAddr,
    closed: CloseGate,
}

impl SyntheticListener {
    /// Create an open listener reporting the given labels as its address.
    pub fn new(network: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            address: SyntheticAddr::new(network, address),
            closed: CloseGate::new(),
        }
    }

    /// Whether [`close`](Listener::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.is_closed()
    }
}

/// Shorthand for [`SyntheticListener::new`], shaped like a bind call.
pub fn listen(network: &str, address: &str) -> SyntheticListener {
    SyntheticListener::new(network, address)
}

#[async_trait]
impl Listener for SyntheticListener {
    async fn accept(&self) -> Result<Accepted, ListenerError> {
        self.closed.closed().await;
        Err(ListenerError::Closed)
    }

    fn close(&self) -> Result<(), ListenerError> {
        if self.closed.close() {
            tracing::debug!(
                network = self.address.network(),
                address = %self.address,
                "Synthetic listener closed"
            );
        }
        Ok(())
    }

    fn addr(&self) -> &dyn NetworkAddr {
        &self.address
    }
}
