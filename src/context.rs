//! Cancellable execution context.
//!
//! A [`Context`] carries an optional cancellation signal and an optional
//! deadline. Long-running operations race against [`Context::done`] so that a
//! cancelled session never blocks forever.
//!
//! # Data Flow
//! ```text
//! Context::with_cancel() → (ctx, Canceller)
//!     ctx.with_timeout(d)   → child: parent's cancel + earlier deadline
//!     ctx.run(fut)          → fut's output, or ContextError when ctx ends first
//! Canceller::cancel()       → every derived context observes done()
//! ```

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::gate::{CloseGate, GateWatcher};

/// Why a context ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The context was cancelled explicitly.
    #[error("context cancelled")]
    Cancelled,

    /// The context's deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

impl From<ContextError> for std::io::Error {
    fn from(err: ContextError) -> Self {
        let kind = match err {
            ContextError::Cancelled => std::io::ErrorKind::Interrupted,
            ContextError::DeadlineExceeded => std::io::ErrorKind::TimedOut,
        };
        std::io::Error::new(kind, err)
    }
}

/// Execution context passed to handlers, dialers and forwarders.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancel: Option<GateWatcher>,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that ends when the returned [`Canceller`] fires.
    pub fn with_cancel() -> (Self, Canceller) {
        let gate = CloseGate::new();
        let ctx = Self {
            cancel: Some(gate.watcher()),
            deadline: None,
        };
        (ctx, Canceller { gate })
    }

    /// Derive a child context that also ends after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a child context that also ends at `deadline`.
    ///
    /// The earlier of the parent's and the new deadline wins.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing <= deadline => existing,
            _ => deadline,
        };
        Self {
            cancel: self.cancel.clone(),
            deadline: Some(deadline),
        }
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the context has ended, or `None` while it is still live.
    pub fn err(&self) -> Option<ContextError> {
        if self.cancel.as_ref().is_some_and(GateWatcher::is_closed) {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Wait until the context ends and report why.
    ///
    /// A background context never ends.
    pub async fn done(&self) -> ContextError {
        let cancelled = async {
            match &self.cancel {
                Some(watcher) => watcher.closed().await,
                None => std::future::pending().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => ContextError::Cancelled,
            _ = expired => ContextError::DeadlineExceeded,
        }
    }

    /// Run `fut` until it completes or the context ends, whichever is first.
    ///
    /// A context that has already ended does not poll `fut` at all.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, ContextError> {
        if let Some(err) = self.err() {
            return Err(err);
        }
        tokio::select! {
            biased;
            err = self.done() => Err(err),
            out = fut => Ok(out),
        }
    }
}

/// Cancels the context it was created with, and every context derived from it.
#[derive(Debug, Clone)]
pub struct Canceller {
    gate: CloseGate,
}

impl Canceller {
    /// Cancel the context. Safe to call more than once.
    pub fn cancel(&self) {
        self.gate.close();
    }

    /// Whether `cancel` has been called.
    pub fn is_cancelled(&self) -> bool {
        self.gate.is_closed()
    }
}
