//! Accept side: yields one transport per inbound connection.
//!
//! The acceptor owns the listening socket only. Wiring an accepted
//! transport into a fresh endpoint (and installing per-connection state)
//! is the runtime's job.

use std::net::{SocketAddr, TcpListener};

use socket2::{Domain, Protocol as SockProtocol, Socket, Type};
use tracing::debug;

use crate::error::Result;
use crate::options::NewbOptions;
use crate::tcp::TcpTransport;

/// Listening socket producing [`TcpTransport`]s.
pub struct TcpAcceptor {
    listener: TcpListener,
    options: NewbOptions,
}

impl TcpAcceptor {
    /// Bind a listener on `addr`.
    ///
    /// The listening socket is configured from `options` (SO_REUSEADDR,
    /// backlog) before it starts accepting.
    pub fn bind(addr: SocketAddr, options: NewbOptions) -> Result<Self> {
        let domain = Domain::for_address(addr);
        let socket = Socket::new(domain, Type::STREAM, Some(SockProtocol::TCP))?;
        socket.set_reuse_address(options.reuse_address)?;
        socket.bind(&addr.into())?;
        socket.listen(options.backlog)?;
        let listener: TcpListener = socket.into();
        debug!(%addr, "acceptor listening");
        Ok(Self { listener, options })
    }

    /// The address the listener actually bound (resolves port 0).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept one pending connection.
    ///
    /// Returns the peer address and a transport owning the accepted
    /// socket, configured like every other stream transport.
    pub fn accept(&mut self) -> Result<(SocketAddr, TcpTransport)> {
        let (stream, peer) = self.listener.accept()?;
        debug!(%peer, "accepted connection");
        let transport = TcpTransport::new(stream, &self.options)?;
        Ok((peer, transport))
    }
}
