//! Listener addresses.

use std::fmt;
use std::net::SocketAddr;

/// An address a listener is reachable at.
///
/// `Display` renders the address itself (e.g. `"0.0.0.0:8080"`); the network
/// kind is reported separately.
pub trait NetworkAddr: fmt::Display + fmt::Debug + Send + Sync {
    /// Network kind label, e.g. `"tcp"`.
    fn network(&self) -> &str;
}

/// An address that does not belong to any socket.
///
/// Carries a network-kind label and an address label verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyntheticAddr {
    network: String,
    address: String,
}

impl SyntheticAddr {
    pub fn new(network: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            address: address.into(),
        }
    }
}

impl NetworkAddr for SyntheticAddr {
    fn network(&self) -> &str {
        &self.network
    }
}

impl fmt::Display for SyntheticAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

/// Local address of a bound TCP socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TcpAddr(pub SocketAddr);

impl NetworkAddr for TcpAddr {
    fn network(&self) -> &str {
        "tcp"
    }
}

impl fmt::Display for TcpAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_addr_labels() {
        let addr = SyntheticAddr::new("tcp", "0.0.0.0:0");
        assert_eq!(addr.network(), "tcp");
        assert_eq!(addr.to_string(), "0.0.0.0:0");

        // Labels are not parsed.
        let addr = SyntheticAddr::new("stdio", "<stdio>");
        assert_eq!(addr.network(), "stdio");
        assert_eq!(addr.to_string(), "<stdio>");
    }

    #[test]
    fn tcp_addr_labels() {
        let addr = TcpAddr("127.0.0.1:9000".parse().unwrap());
        assert_eq!(addr.network(), "tcp");
        assert_eq!(addr.to_string(), "127.0.0.1:9000");
    }
}
