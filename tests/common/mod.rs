//! Shared fakes and backends for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::io::{AsyncWriteExt, DuplexStream};
use tokio::net::TcpListener;

use stdio_bridge::context::Context;
use stdio_bridge::handler::Forwarder;
use stdio_bridge::net::{BoxedConnection, Connection, Dialer};

/// Start an echo backend on an ephemeral local port.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    tokio::spawn(async move {
                        let (mut reader, mut writer) = socket.into_split();
                        let _ = tokio::io::copy(&mut reader, &mut writer).await;
                        let _ = writer.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Dialer that hands out in-memory pipes and keeps the far ends.
#[derive(Default)]
pub struct PipeDialer {
    dialed: Mutex<Vec<String>>,
    remotes: Mutex<Vec<DuplexStream>>,
}

impl PipeDialer {
    /// Addresses dialed so far, in order.
    pub fn dialed(&self) -> Vec<String> {
        self.dialed.lock().unwrap().clone()
    }

    /// Take the far ends of every pipe handed out so far.
    pub fn take_remotes(&self) -> Vec<DuplexStream> {
        std::mem::take(&mut *self.remotes.lock().unwrap())
    }
}

#[async_trait]
impl Dialer for PipeDialer {
    async fn dial(&self, _ctx: &Context, network: &str, address: &str) -> io::Result<BoxedConnection> {
        assert_eq!(network, "tcp");
        let (near, far) = tokio::io::duplex(1024);
        self.dialed.lock().unwrap().push(address.to_string());
        self.remotes.lock().unwrap().push(far);
        Ok(Box::new(near))
    }
}

/// Dialer that always fails with the given cause.
pub struct FailingDialer {
    pub kind: io::ErrorKind,
    pub message: &'static str,
}

#[async_trait]
impl Dialer for FailingDialer {
    async fn dial(&self, _ctx: &Context, _network: &str, _address: &str) -> io::Result<BoxedConnection> {
        Err(io::Error::new(self.kind, self.message))
    }
}

/// Forwarder that writes a marker to the dialed side and returns a fixed outcome.
#[derive(Default)]
pub struct MarkerForwarder {
    calls: AtomicUsize,
    failure: Option<(io::ErrorKind, &'static str)>,
}

pub const MARKER: &[u8] = b"forwarded";

impl MarkerForwarder {
    pub fn failing(kind: io::ErrorKind, message: &'static str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failure: Some((kind, message)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Forwarder for MarkerForwarder {
    async fn forward(
        &self,
        _ctx: &Context,
        _label: &str,
        _left: &mut dyn Connection,
        right: &mut dyn Connection,
    ) -> io::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        right.write_all(MARKER).await?;
        right.flush().await?;
        match self.failure {
            Some((kind, message)) => Err(io::Error::new(kind, message)),
            None => Ok(()),
        }
    }
}

/// Forwarder that never finishes on its own.
#[derive(Default)]
pub struct StuckForwarder {
    calls: AtomicUsize,
}

impl StuckForwarder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Forwarder for StuckForwarder {
    async fn forward(
        &self,
        _ctx: &Context,
        _label: &str,
        _left: &mut dyn Connection,
        _right: &mut dyn Connection,
    ) -> io::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}
