//! Listener abstraction and the TCP listener with backpressure.
//!
//! # Responsibilities
//! - Define the [`Listener`] capability set (accept, close, addr)
//! - Bind a real TCP socket behind that trait ([`TcpAcceptor`])
//! - Enforce max_connections limit via semaphore
//! - Report a closed listener the same way for every implementation

use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

use crate::config::ListenerConfig;
use crate::gate::CloseGate;
use crate::net::addr::{NetworkAddr, TcpAddr};
use crate::net::stream::BoxedConnection;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("failed to bind: {0}")]
    Bind(#[source] std::io::Error),

    /// Failed to accept connection.
    #[error("failed to accept: {0}")]
    Accept(#[source] std::io::Error),

    /// The listener was closed. No more connections will arrive.
    #[error("listener closed")]
    Closed,
}

impl ListenerError {
    /// Whether this is the terminal closed signal rather than a fault.
    pub fn is_closed(&self) -> bool {
        matches!(self, ListenerError::Closed)
    }
}

/// A connection handed out by [`Listener::accept`].
pub struct Accepted {
    /// The connection itself.
    pub stream: BoxedConnection,
    /// Peer label for logging (a socket address for TCP).
    pub peer: String,
    /// Slot held for the connection's lifetime, if the listener limits them.
    pub permit: Option<ConnectionPermit>,
}

impl std::fmt::Debug for Accepted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Accepted")
            .field("peer", &self.peer)
            .field("permit", &self.permit)
            .finish_non_exhaustive()
    }
}

/// Something a server accept loop can run on.
#[async_trait]
pub trait Listener: Send + Sync {
    /// Wait for the next connection.
    ///
    /// Returns [`ListenerError::Closed`] once [`close`](Listener::close) has
    /// been called, both for pending and for later calls.
    async fn accept(&self) -> Result<Accepted, ListenerError>;

    /// Close the listener. Idempotent.
    fn close(&self) -> Result<(), ListenerError>;

    /// The address the listener was created with.
    fn addr(&self) -> &dyn NetworkAddr;
}

/// A bounded TCP listener that limits concurrent connections.
///
/// Uses a semaphore to enforce `max_connections`. When the limit is reached,
/// new connections will wait until a slot becomes available.
pub struct TcpAcceptor {
    /// The underlying TCP listener.
    inner: TcpListener,
    /// Address the socket is bound to.
    local_addr: TcpAddr,
    /// Semaphore to limit concurrent connections.
    connection_limit: Arc<Semaphore>,
    /// Configured maximum connections.
    max_connections: usize,
    /// Fires when the listener is closed.
    closed: CloseGate,
}

impl TcpAcceptor {
    /// Bind to the configured address with connection limits.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
            ListenerError::Bind(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        })?;

        let listener = TcpListener::bind(addr).await.map_err(ListenerError::Bind)?;
        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(
            address = %local_addr,
            max_connections = config.max_connections,
            "Listener bound"
        );

        Ok(Self {
            inner: listener,
            local_addr: TcpAddr(local_addr),
            connection_limit: Arc::new(Semaphore::new(config.max_connections)),
            max_connections: config.max_connections,
            closed: CloseGate::new(),
        })
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr.0
    }

    /// Get current available connection slots.
    pub fn available_permits(&self) -> usize {
        self.connection_limit.available_permits()
    }

    /// Get configured maximum connections.
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    async fn accept_inner(&self) -> Result<Accepted, ListenerError> {
        // Acquire permit first (backpressure)
        let permit = self
            .connection_limit
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ListenerError::Closed)?;

        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;

        tracing::debug!(
            peer_addr = %addr,
            available_permits = self.connection_limit.available_permits(),
            "Connection accepted"
        );

        Ok(Accepted {
            stream: Box::new(stream),
            peer: addr.to_string(),
            permit: Some(ConnectionPermit { _permit: permit }),
        })
    }
}

#[async_trait]
impl Listener for TcpAcceptor {
    async fn accept(&self) -> Result<Accepted, ListenerError> {
        if self.closed.is_closed() {
            return Err(ListenerError::Closed);
        }
        tokio::select! {
            biased;
            _ = self.closed.closed() => Err(ListenerError::Closed),
            res = self.accept_inner() => res,
        }
    }

    fn close(&self) -> Result<(), ListenerError> {
        if self.closed.close() {
            self.connection_limit.close();
            tracing::info!(address = %self.local_addr, "Listener closed");
        }
        Ok(())
    }

    fn addr(&self) -> &dyn NetworkAddr {
        &self.local_addr
    }
}

/// A permit representing a connection slot.
///
/// When dropped, the connection slot is released back to the pool.
/// This ensures backpressure is maintained even if the connection handler panics.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: tokio::sync::OwnedSemaphorePermit,
}
