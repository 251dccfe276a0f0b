//! Shutdown coordination.

use crate::context::{Canceller, Context};

/// Coordinator for graceful shutdown.
///
/// Every task that should stop on shutdown runs under [`Shutdown::context`].
/// Triggering cancels that context once; later triggers are no-ops.
#[derive(Debug, Clone)]
pub struct Shutdown {
    ctx: Context,
    canceller: Canceller,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (ctx, canceller) = Context::with_cancel();
        Self { ctx, canceller }
    }

    /// A context that ends when shutdown is triggered.
    pub fn context(&self) -> Context {
        self.ctx.clone()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.canceller.cancel();
    }

    /// Whether shutdown has been triggered.
    pub fn is_triggered(&self) -> bool {
        self.canceller.is_cancelled()
    }

    /// Wait for the shutdown signal.
    pub async fn wait(&self) {
        self.ctx.done().await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
