//! Broadcast-once close gate.
//!
//! A gate starts open and can be closed exactly once. Any number of tasks can
//! wait for the closure; all of them are released by the single transition,
//! and waiters that arrive later return immediately.
//!
//! # Design Decisions
//! - Backed by a `watch` channel holding a `bool`, not a semaphore or counter
//! - `send_if_modified` makes the `false -> true` flip atomic, so concurrent
//!   `close` calls cannot double-fire
//! - The sender is shared through an `Arc`, so every clone sees one state

use std::sync::Arc;
use tokio::sync::watch;

/// A clonable handle to a one-shot broadcast gate.
#[derive(Debug, Clone)]
pub struct CloseGate {
    tx: Arc<watch::Sender<bool>>,
}

impl CloseGate {
    /// Create a new, open gate.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Close the gate.
    ///
    /// Returns `true` only for the call that performed the transition.
    /// Every later call is a no-op returning `false`.
    pub fn close(&self) -> bool {
        self.tx.send_if_modified(|closed| {
            if *closed {
                false
            } else {
                *closed = true;
                true
            }
        })
    }

    /// Whether the gate has been closed.
    pub fn is_closed(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the gate is closed.
    pub async fn closed(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot be dropped while
        // we wait; an error here is unreachable.
        let _ = rx.wait_for(|closed| *closed).await;
    }

    /// A receiver that observes the gate without being able to close it.
    pub fn watcher(&self) -> GateWatcher {
        GateWatcher {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for CloseGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of a [`CloseGate`].
#[derive(Debug, Clone)]
pub struct GateWatcher {
    rx: watch::Receiver<bool>,
}

impl GateWatcher {
    /// Whether the gate has been closed.
    pub fn is_closed(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until the gate is closed.
    ///
    /// If every [`CloseGate`] handle has been dropped without closing, the
    /// gate can never close and this waits forever.
    pub async fn closed(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|closed| *closed).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn close_fires_once() {
        let gate = CloseGate::new();
        assert!(!gate.is_closed());
        assert!(gate.close());
        assert!(!gate.close());
        assert!(!gate.clone().close());
        assert!(gate.is_closed());
    }

    #[tokio::test]
    async fn closed_returns_immediately_after_close() {
        let gate = CloseGate::new();
        gate.close();
        tokio::time::timeout(Duration::from_millis(100), gate.closed())
            .await
            .expect("closed gate should not block");
    }

    #[tokio::test]
    async fn watcher_sees_close() {
        let gate = CloseGate::new();
        let watcher = gate.watcher();
        assert!(!watcher.is_closed());

        let waiter = tokio::spawn(async move { watcher.closed().await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        gate.close();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("watcher not released")
            .unwrap();
    }

    #[tokio::test]
    async fn orphaned_watcher_keeps_waiting() {
        let gate = CloseGate::new();
        let watcher = gate.watcher();
        drop(gate);

        let result = tokio::time::timeout(Duration::from_millis(50), watcher.closed()).await;
        assert!(result.is_err());
    }
}
