//! Endpoint abstraction for transport-agnostic socket addressing.
//!
//! Provides unified addressing for the stream and datagram transports with
//! parsing support.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// Transport endpoint address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Stream transport: `tcp://host:port`
    Tcp(SocketAddr),
    /// Datagram transport: `udp://host:port`
    Udp(SocketAddr),
}

impl Endpoint {
    /// Parse an endpoint from a string.
    ///
    /// Supported formats:
    /// - `tcp://127.0.0.1:5555`
    /// - `tcp://[::1]:5555` (IPv6)
    /// - `udp://127.0.0.1:5555`
    ///
    /// # Examples
    ///
    /// ```
    /// use newb_core::endpoint::Endpoint;
    ///
    /// let endpoint = Endpoint::parse("tcp://127.0.0.1:5555").unwrap();
    /// assert!(endpoint.is_tcp());
    ///
    /// let endpoint = Endpoint::parse("udp://127.0.0.1:5555").unwrap();
    /// assert!(endpoint.is_udp());
    /// ```
    pub fn parse(s: &str) -> Result<Self, EndpointError> {
        s.parse()
    }

    /// Returns true if this is a TCP endpoint.
    pub fn is_tcp(&self) -> bool {
        matches!(self, Endpoint::Tcp(_))
    }

    /// Returns true if this is a UDP endpoint.
    pub fn is_udp(&self) -> bool {
        matches!(self, Endpoint::Udp(_))
    }

    /// The socket address this endpoint names.
    pub fn addr(&self) -> SocketAddr {
        match self {
            Endpoint::Tcp(addr) | Endpoint::Udp(addr) => *addr,
        }
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(addr) = s.strip_prefix("tcp://") {
            let socket_addr = addr
                .parse::<SocketAddr>()
                .map_err(|_| EndpointError::InvalidAddress(addr.to_string()))?;
            Ok(Endpoint::Tcp(socket_addr))
        } else if let Some(addr) = s.strip_prefix("udp://") {
            let socket_addr = addr
                .parse::<SocketAddr>()
                .map_err(|_| EndpointError::InvalidAddress(addr.to_string()))?;
            Ok(Endpoint::Udp(socket_addr))
        } else {
            Err(EndpointError::InvalidScheme(s.to_string()))
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tcp(addr) => write!(f, "tcp://{}", addr),
            Endpoint::Udp(addr) => write!(f, "udp://{}", addr),
        }
    }
}

/// Errors that can occur when parsing or using endpoints.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("Invalid scheme in endpoint: {0} (expected tcp:// or udp://)")]
    InvalidScheme(String),

    #[error("Invalid socket address: {0}")]
    InvalidAddress(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tcp_ipv4() {
        let endpoint = Endpoint::parse("tcp://127.0.0.1:5555").unwrap();
        assert!(matches!(endpoint, Endpoint::Tcp(_)));
        assert_eq!(endpoint.to_string(), "tcp://127.0.0.1:5555");
    }

    #[test]
    fn test_parse_tcp_ipv6() {
        let endpoint = Endpoint::parse("tcp://[::1]:5555").unwrap();
        assert!(matches!(endpoint, Endpoint::Tcp(_)));
    }

    #[test]
    fn test_parse_udp() {
        let endpoint = Endpoint::parse("udp://127.0.0.1:7777").unwrap();
        assert!(matches!(endpoint, Endpoint::Udp(_)));
        assert_eq!(endpoint.to_string(), "udp://127.0.0.1:7777");
    }

    #[test]
    fn test_invalid_scheme() {
        let result = Endpoint::parse("http://127.0.0.1:5555");
        assert!(matches!(result, Err(EndpointError::InvalidScheme(_))));
    }

    #[test]
    fn test_invalid_address() {
        let result = Endpoint::parse("tcp://invalid:port");
        assert!(matches!(result, Err(EndpointError::InvalidAddress(_))));
    }
}
