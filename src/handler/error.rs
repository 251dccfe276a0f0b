//! Bridge handler errors.

use thiserror::Error;

use crate::context::ContextError;

/// Errors returned by [`StdioHandler::handle`](super::StdioHandler::handle).
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No destination was given.
    #[error("empty destination address")]
    EmptyDestination,

    /// Dialing the destination failed. Never retried here.
    #[error("connect to {address:?} failed: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The forwarder failed; its error is passed through untouched.
    #[error(transparent)]
    Forward(std::io::Error),

    /// The context ended before the session finished.
    #[error(transparent)]
    Context(#[from] ContextError),
}

impl BridgeError {
    /// The forwarder's error, if this is a forwarding failure.
    pub fn as_forward(&self) -> Option<&std::io::Error> {
        match self {
            BridgeError::Forward(e) => Some(e),
            _ => None,
        }
    }
}
