//! Outbound connection establishment.
//!
//! # Responsibilities
//! - Define the [`Dialer`] seam the bridge dials through
//! - Provide [`TcpDialer`], the plain TCP implementation
//! - Respect the caller's context and the configured connect timeout

use async_trait::async_trait;
use std::io;
use std::time::Duration;
use tokio::net::TcpStream;

use crate::context::Context;
use crate::net::stream::BoxedConnection;

/// Opens reliable stream connections.
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Connect to `address` over `network`.
    ///
    /// Implementations must give up when `ctx` ends.
    async fn dial(&self, ctx: &Context, network: &str, address: &str) -> io::Result<BoxedConnection>;
}

/// Dials plain TCP connections.
#[derive(Debug, Clone)]
pub struct TcpDialer {
    connect_timeout: Option<Duration>,
}

impl TcpDialer {
    /// Create a dialer with no timeout of its own; only the context bounds it.
    pub fn new() -> Self {
        Self { connect_timeout: None }
    }

    /// Bound every connection attempt by `timeout`.
    pub fn with_connect_timeout(timeout: Duration) -> Self {
        Self {
            connect_timeout: Some(timeout),
        }
    }
}

impl Default for TcpDialer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Dialer for TcpDialer {
    async fn dial(&self, ctx: &Context, network: &str, address: &str) -> io::Result<BoxedConnection> {
        if !matches!(network, "tcp" | "tcp4" | "tcp6") {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("unsupported network {network:?}"),
            ));
        }

        let ctx = match self.connect_timeout {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx.clone(),
        };

        let stream = ctx.run(TcpStream::connect(address)).await??;

        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(address, error = %e, "Failed to set TCP_NODELAY");
        }

        tracing::trace!(
            address,
            peer_addr = ?stream.peer_addr().ok(),
            "Outbound connection established"
        );

        Ok(Box::new(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn dials_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"hi").await.unwrap();
        });

        let dialer = TcpDialer::with_connect_timeout(Duration::from_secs(5));
        let mut conn = dialer.dial(&Context::background(), "tcp", &addr).await.unwrap();

        let mut buf = [0u8; 2];
        conn.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hi");
    }

    #[tokio::test]
    async fn rejects_unknown_network() {
        let dialer = TcpDialer::new();
        let err = dialer
            .dial(&Context::background(), "udp", "127.0.0.1:53")
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }

    #[tokio::test]
    async fn cancelled_context_stops_dial() {
        let (ctx, canceller) = Context::with_cancel();
        canceller.cancel();

        let dialer = TcpDialer::new();
        let err = dialer.dial(&ctx, "tcp", "127.0.0.1:9").await.err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::Interrupted);
    }
}
