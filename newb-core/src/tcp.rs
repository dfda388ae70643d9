//! Stream transport over TCP.
//!
//! No framing of its own: one `read_some` yields whatever the kernel had
//! buffered, so a stack running over TCP must self-delimit its frames.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use crate::error::{NewbError, Result};
use crate::options::NewbOptions;
use crate::transport::Transport;

/// TCP stream transport.
pub struct TcpTransport {
    stream: TcpStream,
    recv: BytesMut,
    send: BytesMut,
    read_chunk: usize,
}

impl TcpTransport {
    /// Wrap an already connected stream (accept side).
    pub fn new(stream: TcpStream, options: &NewbOptions) -> Result<Self> {
        stream.set_nodelay(options.nodelay)?;
        Ok(Self {
            stream,
            recv: BytesMut::with_capacity(options.read_buffer_size),
            send: BytesMut::with_capacity(options.write_buffer_size),
            read_chunk: options.read_buffer_size,
        })
    }

    /// Connect to a remote listener (client side).
    pub fn connect(addr: SocketAddr, options: &NewbOptions) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        debug!(%addr, "tcp transport connected");
        Self::new(stream, options)
    }

    /// Remote peer address.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        Ok(self.stream.peer_addr()?)
    }
}

impl Transport for TcpTransport {
    fn read_some(&mut self) -> Result<()> {
        self.recv.clear();
        self.recv.resize(self.read_chunk, 0);
        let n = self.stream.read(&mut self.recv[..])?;
        if n == 0 {
            debug!("tcp transport read eof");
            self.recv.clear();
            return Err(NewbError::PeerClosed);
        }
        self.recv.truncate(n);
        trace!(bytes = n, "tcp transport refilled receive buffer");
        Ok(())
    }

    fn write_some(&mut self) -> Result<()> {
        if self.send.is_empty() {
            return Ok(());
        }
        self.stream.write_all(&self.send)?;
        trace!(bytes = self.send.len(), "tcp transport flushed send buffer");
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
