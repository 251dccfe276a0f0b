//! The stdio bridge.
//!
//! Turns a reader/writer pair into one leg of a forwarded TCP session: dial
//! the destination, join the pair into a [`StdioStream`], and let the
//! [`Forwarder`] relay between the two.

use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use super::error::BridgeError;
use super::forward::Forwarder;
use crate::context::Context;
use crate::net::dialer::Dialer;
use crate::net::stream::{BoxedConnection, StdioStream};

/// Placeholder endpoint label logged for both sides of a stdio session.
pub const STDIO_ENDPOINT: &str = "<stdio>";

/// Protocol label logged for stdio sessions.
pub const STDIO_PROTOCOL: &str = "STDIO";

/// Dials a destination and forwards it to a reader/writer pair.
#[derive(Clone)]
pub struct StdioHandler {
    dialer: Arc<dyn Dialer>,
    forwarder: Arc<dyn Forwarder>,
}

impl StdioHandler {
    pub fn new(dialer: Arc<dyn Dialer>, forwarder: Arc<dyn Forwarder>) -> Self {
        Self { dialer, forwarder }
    }

    /// Run one session between `reader`/`writer` and `destination`.
    ///
    /// The dialed connection is shut down and dropped before this returns,
    /// whatever the outcome. Every dial failure, including the context ending
    /// while dialing, is a [`BridgeError::Connect`]. Forwarder errors come
    /// back as [`BridgeError::Forward`] with the original error inside.
    pub async fn handle<R, W>(
        &self,
        ctx: &Context,
        reader: R,
        writer: W,
        destination: &str,
    ) -> Result<(), BridgeError>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        tracing::debug!(
            local = STDIO_ENDPOINT,
            remote = STDIO_ENDPOINT,
            user = "",
            protocol = STDIO_PROTOCOL,
            method = "CONNECT",
            destination,
            "Request"
        );

        if destination.is_empty() {
            return Err(BridgeError::EmptyDestination);
        }

        // A context that ends mid-dial is still a failed connect.
        let dialed = match ctx.run(self.dialer.dial(ctx, "tcp", destination)).await {
            Ok(dialed) => dialed,
            Err(e) => Err(e.into()),
        };
        let mut target = dialed.map_err(|source| BridgeError::Connect {
            address: destination.to_string(),
            source,
        })?;

        let mut local = StdioStream::new(reader, writer);
        let result = ctx
            .run(self.forwarder.forward(ctx, "", &mut local, &mut *target))
            .await;

        release(target, destination).await;

        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(BridgeError::Forward(e)),
            Err(e) => Err(BridgeError::Context(e)),
        }
    }
}

impl std::fmt::Debug for StdioHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdioHandler").finish_non_exhaustive()
    }
}

/// Close the dialed connection. A failed shutdown still drops the socket.
async fn release(mut target: BoxedConnection, destination: &str) {
    if let Err(e) = target.shutdown().await {
        tracing::trace!(destination, error = %e, "Shutdown of dialed connection failed");
    }
}
