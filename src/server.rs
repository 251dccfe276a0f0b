//! Generic accept loop.
//!
//! # Responsibilities
//! - Pull connections from any [`Listener`] (real or synthetic)
//! - Run each on its own task under a tracked guard
//! - On shutdown: close the listener, let the loop observe `Closed`, drain
//!
//! The loop never asks which listener it holds. A [`SyntheticListener`]
//! simply never yields a connection, so in stdio mode the loop parks until
//! shutdown closes it.
//!
//! [`SyntheticListener`]: crate::net::SyntheticListener

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use crate::context::Context;
use crate::handler::{BridgeError, StdioHandler};
use crate::lifecycle::Shutdown;
use crate::net::connection::ConnectionTracker;
use crate::net::listener::{Accepted, Listener, ListenerError};

/// Handles one accepted connection.
#[async_trait]
pub trait SessionHandler: Send + Sync {
    async fn handle(&self, ctx: Context, accepted: Accepted) -> Result<(), BridgeError>;
}

/// Bridges every accepted connection to one fixed destination.
#[derive(Debug, Clone)]
pub struct ForwardToDestination {
    bridge: StdioHandler,
    destination: String,
}

impl ForwardToDestination {
    pub fn new(bridge: StdioHandler, destination: impl Into<String>) -> Self {
        Self {
            bridge,
            destination: destination.into(),
        }
    }
}

#[async_trait]
impl SessionHandler for ForwardToDestination {
    async fn handle(&self, ctx: Context, accepted: Accepted) -> Result<(), BridgeError> {
        let Accepted { stream, permit, .. } = accepted;
        let (reader, mut writer) = tokio::io::split(stream);

        let result = self.bridge.handle(&ctx, reader, &mut writer, &self.destination).await;

        // The bridge leaves the client side open; close it once the session is over.
        if let Err(e) = writer.shutdown().await {
            tracing::trace!(error = %e, "Shutdown of client connection failed");
        }
        drop(permit);
        result
    }
}

/// Accept loop bound to one listener.
pub struct Server {
    listener: Arc<dyn Listener>,
    handler: Arc<dyn SessionHandler>,
    tracker: ConnectionTracker,
    session_timeout: Option<Duration>,
    drain_timeout: Duration,
}

impl Server {
    pub fn new(listener: Arc<dyn Listener>, handler: Arc<dyn SessionHandler>) -> Self {
        Self {
            listener,
            handler,
            tracker: ConnectionTracker::new(),
            session_timeout: None,
            drain_timeout: Duration::from_secs(5),
        }
    }

    /// Bound every session by `timeout`.
    pub fn with_session_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.session_timeout = timeout;
        self
    }

    /// How long shutdown waits for in-flight sessions.
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Session counter, for observing drain progress.
    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Run until `shutdown` fires, then close the listener and drain.
    pub async fn run(&self, shutdown: Shutdown) {
        let addr = self.listener.addr();
        tracing::info!(network = addr.network(), address = %addr, "Serving");

        let closer = {
            let listener = Arc::clone(&self.listener);
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                shutdown.wait().await;
                if let Err(e) = listener.close() {
                    tracing::warn!(error = %e, "Failed to close listener");
                }
            })
        };

        self.accept_loop(shutdown.context()).await;
        closer.abort();

        // The loop can only end on Closed; make sure the close really happened
        // even if the listener closed on its own.
        if let Err(e) = self.listener.close() {
            tracing::debug!(error = %e, "Listener close after accept loop failed");
        }

        self.drain().await;
        tracing::info!(address = %addr, "Server stopped");
    }

    async fn accept_loop(&self, ctx: Context) {
        loop {
            match self.listener.accept().await {
                Ok(accepted) => self.spawn_session(ctx.clone(), accepted),
                Err(ListenerError::Closed) => {
                    tracing::debug!("Listener closed, accept loop exiting");
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Accept failed");
                    // Avoid a hot loop on persistent errors like EMFILE.
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
            }
        }
    }

    fn spawn_session(&self, ctx: Context, accepted: Accepted) {
        let guard = self.tracker.track();
        let handler = Arc::clone(&self.handler);
        let ctx = match self.session_timeout {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx,
        };

        tokio::spawn(async move {
            let peer = accepted.peer.clone();
            tracing::debug!(connection_id = %guard.id(), peer_addr = %peer, "Session started");
            match handler.handle(ctx, accepted).await {
                Ok(()) => tracing::debug!(connection_id = %guard.id(), "Session finished"),
                Err(e) => tracing::warn!(connection_id = %guard.id(), peer_addr = %peer, error = %e, "Session failed"),
            }
        });
    }

    async fn drain(&self) {
        let active = self.tracker.active_count();
        if active == 0 {
            return;
        }
        tracing::info!(active, "Draining sessions");
        if tokio::time::timeout(self.drain_timeout, self.tracker.wait_idle())
            .await
            .is_err()
        {
            tracing::warn!(
                remaining = self.tracker.active_count(),
                "Drain timeout reached, abandoning sessions"
            );
        }
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("addr", &self.listener.addr().to_string())
            .field("session_timeout", &self.session_timeout)
            .field("drain_timeout", &self.drain_timeout)
            .finish_non_exhaustive()
    }
}
