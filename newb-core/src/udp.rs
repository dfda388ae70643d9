//! Datagram transport over a connected UDP socket.
//!
//! One `read_some` receives exactly one datagram and one `write_some`
//! sends the whole send buffer as one datagram, so frame boundaries come
//! for free. Reassembly stacks rely on this one-frame-per-event shape.

use std::net::{SocketAddr, UdpSocket};

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use crate::error::Result;
use crate::options::NewbOptions;
use crate::transport::Transport;

/// Connected UDP datagram transport.
pub struct UdpTransport {
    socket: UdpSocket,
    recv: BytesMut,
    send: BytesMut,
    read_chunk: usize,
}

impl UdpTransport {
    /// Bind an ephemeral local socket and connect it to `peer`.
    pub fn connect(peer: SocketAddr, options: &NewbOptions) -> Result<Self> {
        let local: SocketAddr = if peer.is_ipv4() {
            "0.0.0.0:0".parse().expect("fixed wildcard address")
        } else {
            "[::]:0".parse().expect("fixed wildcard address")
        };
        let socket = UdpSocket::bind(local)?;
        socket.connect(peer)?;
        debug!(%peer, "udp transport connected");
        Ok(Self::from_socket(socket, options))
    }

    /// Wrap an already bound and connected socket.
    pub fn from_socket(socket: UdpSocket, options: &NewbOptions) -> Self {
        Self {
            socket,
            recv: BytesMut::with_capacity(options.read_buffer_size),
            send: BytesMut::with_capacity(options.write_buffer_size),
            read_chunk: options.read_buffer_size,
        }
    }

    /// Local socket address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}

impl Transport for UdpTransport {
    fn read_some(&mut self) -> Result<()> {
        self.recv.clear();
        self.recv.resize(self.read_chunk, 0);
        let n = self.socket.recv(&mut self.recv[..])?;
        self.recv.truncate(n);
        trace!(bytes = n, "udp transport received datagram");
        Ok(())
    }

    fn write_some(&mut self) -> Result<()> {
        if self.send.is_empty() {
            return Ok(());
        }
        self.socket.send(&self.send)?;
        trace!(bytes = self.send.len(), "udp transport sent datagram");
        self.send.clear();
        Ok(())
    }

    fn take_frame(&mut self) -> Bytes {
        self.recv.split().freeze()
    }

    fn send_buffer(&mut self) -> &mut BytesMut {
        &mut self.send
    }

    fn receive_buffer(&self) -> &[u8] {
        &self.recv
    }

    fn receive_buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.recv
    }
}
