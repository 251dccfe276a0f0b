//! Connection abstraction and the reader/writer adapter.
//!
//! Forwarders work on full-duplex connections. A process's stdio is a bare
//! reader plus a bare writer, so [`StdioStream`] joins the two into a single
//! value that reads from one and writes to the other.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// A full-duplex byte stream.
///
/// Implemented for every `AsyncRead + AsyncWrite + Unpin + Send` type, so a
/// `TcpStream` and a [`StdioStream`] are both connections.
pub trait Connection: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> Connection for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// An owned, type-erased connection.
pub type BoxedConnection = Box<dyn Connection>;

/// Joins a reader and a writer into one duplex stream.
///
/// Shutdown only flushes the writer. The pair usually cannot be half-closed
/// independently (closing stdout would end the whole session), so the write
/// side is left open.
#[derive(Debug)]
pub struct StdioStream<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> StdioStream<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Split back into the original halves.
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl<R, W> AsyncRead for StdioStream<R, W>
where
    R: AsyncRead + Unpin,
    W: Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().reader).poll_read(cx, buf)
    }
}

impl<R, W> AsyncWrite for StdioStream<R, W>
where
    R: Unpin,
    W: AsyncWrite + Unpin,
{
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().writer).poll_write(cx, buf)
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().writer).poll_write_vectored(cx, bufs)
    }

    fn is_write_vectored(&self) -> bool {
        self.writer.is_write_vectored()
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().writer).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        // Best effort: push out buffered bytes, never close the writer.
        match Pin::new(&mut self.get_mut().writer).poll_flush(cx) {
            Poll::Ready(Err(e)) => {
                tracing::trace!(error = %e, "Flush on stdio shutdown failed");
                Poll::Ready(Ok(()))
            }
            other => other,
        }
    }
}
