//! Byte forwarding between two connections.
//!
//! The bridge treats forwarding as a capability: it hands two connections to
//! a [`Forwarder`] and waits for the result. [`CopyForwarder`] is the default,
//! a thin wrapper around `tokio::io::copy_bidirectional`.

use async_trait::async_trait;
use std::io;

use crate::context::Context;
use crate::net::stream::Connection;

/// Relays bytes in both directions until either side finishes or fails.
#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Forward between `left` and `right`.
    ///
    /// `label` names the session in diagnostics and may be empty.
    async fn forward(
        &self,
        ctx: &Context,
        label: &str,
        left: &mut dyn Connection,
        right: &mut dyn Connection,
    ) -> io::Result<()>;
}

/// Forwards with `tokio::io::copy_bidirectional`.
///
/// A peer hanging up mid-stream (connection reset, broken pipe, unexpected
/// EOF) ends the relay with `Ok(())`. Every other I/O error is returned as
/// is, and the bridge hands it to its caller unchanged. Wrap or replace this
/// forwarder to see disconnects as errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyForwarder;

#[async_trait]
impl Forwarder for CopyForwarder {
    async fn forward(
        &self,
        ctx: &Context,
        label: &str,
        left: &mut dyn Connection,
        right: &mut dyn Connection,
    ) -> io::Result<()> {
        match ctx.run(tokio::io::copy_bidirectional(left, right)).await? {
            Ok((left_to_right, right_to_left)) => {
                tracing::debug!(
                    session = label,
                    left_to_right,
                    right_to_left,
                    "Forwarding finished"
                );
                Ok(())
            }
            Err(e) if is_disconnect(&e) => {
                tracing::debug!(session = label, error = %e, "Peer disconnected");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn is_disconnect(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof
    )
}
