//! Bridge handler behaviour against fake and real collaborators.

use std::error::Error as _;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

use stdio_bridge::context::{Context, ContextError};
use stdio_bridge::handler::{BridgeError, CopyForwarder, StdioHandler};
use stdio_bridge::net::TcpDialer;

mod common;

use common::{FailingDialer, MarkerForwarder, PipeDialer, StuckForwarder, MARKER};

/// Read everything until EOF, failing the test if it takes too long.
async fn read_to_eof(remote: &mut DuplexStream) -> Vec<u8> {
    let mut buf = Vec::new();
    tokio::time::timeout(Duration::from_secs(1), remote.read_to_end(&mut buf))
        .await
        .expect("dialed connection was not closed")
        .unwrap();
    buf
}

#[tokio::test]
async fn forwards_once_over_dialed_connection_then_closes_it() {
    let dialer = Arc::new(PipeDialer::default());
    let forwarder = Arc::new(MarkerForwarder::default());
    let handler = StdioHandler::new(dialer.clone(), forwarder.clone());

    handler
        .handle(&Context::background(), tokio::io::empty(), tokio::io::sink(), "db.internal:5432")
        .await
        .unwrap();

    assert_eq!(forwarder.calls(), 1);
    assert_eq!(dialer.dialed(), vec!["db.internal:5432".to_string()]);

    let mut remotes = dialer.take_remotes();
    assert_eq!(remotes.len(), 1);
    assert_eq!(read_to_eof(&mut remotes[0]).await, MARKER);
}

#[tokio::test]
async fn forwarder_error_is_returned_unchanged_and_connection_closed() {
    let dialer = Arc::new(PipeDialer::default());
    let forwarder = Arc::new(MarkerForwarder::failing(io::ErrorKind::Other, "relay exploded"));
    let handler = StdioHandler::new(dialer.clone(), forwarder.clone());

    let err = handler
        .handle(&Context::background(), tokio::io::empty(), tokio::io::sink(), "10.0.0.1:22")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "relay exploded");
    let inner = err.as_forward().expect("expected a forwarding error");
    assert_eq!(inner.kind(), io::ErrorKind::Other);
    assert_eq!(forwarder.calls(), 1);

    let mut remotes = dialer.take_remotes();
    assert_eq!(read_to_eof(&mut remotes[0]).await, MARKER);
}

#[tokio::test]
async fn dial_failure_reports_destination_and_cause() {
    let forwarder = Arc::new(MarkerForwarder::default());
    let handler = StdioHandler::new(
        Arc::new(FailingDialer {
            kind: io::ErrorKind::ConnectionRefused,
            message: "connection refused",
        }),
        forwarder.clone(),
    );

    let err = handler
        .handle(&Context::background(), tokio::io::empty(), tokio::io::sink(), "example.invalid:9999")
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("example.invalid:9999"), "{message}");
    assert!(message.contains("connection refused"), "{message}");

    match &err {
        BridgeError::Connect { address, source } => {
            assert_eq!(address, "example.invalid:9999");
            assert_eq!(source.kind(), io::ErrorKind::ConnectionRefused);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.source().unwrap().to_string(), "connection refused");
    assert_eq!(forwarder.calls(), 0);
}

#[tokio::test]
async fn cancellation_during_forwarding_tears_down_connection() {
    let dialer = Arc::new(PipeDialer::default());
    let forwarder = Arc::new(StuckForwarder::default());
    let handler = StdioHandler::new(dialer.clone(), forwarder.clone());
    let (ctx, canceller) = Context::with_cancel();

    let session = tokio::spawn(async move {
        handler
            .handle(&ctx, tokio::io::empty(), tokio::io::sink(), "stuck.example:80")
            .await
    });

    // Wait until the forwarder is running.
    while forwarder.calls() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    canceller.cancel();

    let err = tokio::time::timeout(Duration::from_secs(1), session)
        .await
        .expect("handler ignored cancellation")
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, BridgeError::Context(ContextError::Cancelled)));

    let mut remotes = dialer.take_remotes();
    assert!(read_to_eof(&mut remotes[0]).await.is_empty());
}

#[tokio::test]
async fn relays_stdio_pair_through_real_tcp() {
    let backend = common::start_echo_backend().await;
    let handler = StdioHandler::new(
        Arc::new(TcpDialer::with_connect_timeout(Duration::from_secs(5))),
        Arc::new(CopyForwarder),
    );

    let (mut stdin_feed, stdin) = tokio::io::duplex(1024);
    let (stdout, mut stdout_sink) = tokio::io::duplex(1024);
    let destination = backend.to_string();

    let session = tokio::spawn(async move {
        handler
            .handle(&Context::background(), stdin, stdout, &destination)
            .await
    });

    stdin_feed.write_all(b"hello over stdio").await.unwrap();
    let mut buf = [0u8; 16];
    tokio::time::timeout(Duration::from_secs(2), stdout_sink.read_exact(&mut buf))
        .await
        .expect("no echo")
        .unwrap();
    assert_eq!(&buf, b"hello over stdio");

    // Closing stdin ends the session cleanly.
    drop(stdin_feed);
    tokio::time::timeout(Duration::from_secs(2), session)
        .await
        .expect("session did not finish")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn refused_tcp_connection_surfaces_connect_error() {
    // Grab a free port, then release it so nothing listens there.
    let port = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let destination = format!("127.0.0.1:{port}");

    let handler = StdioHandler::new(Arc::new(TcpDialer::new()), Arc::new(CopyForwarder));
    let err = handler
        .handle(&Context::background(), tokio::io::empty(), tokio::io::sink(), &destination)
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::Connect { .. }));
    assert!(err.to_string().contains(&destination));
}
