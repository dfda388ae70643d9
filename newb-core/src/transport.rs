//! Transport trait: socket ownership plus the send/receive buffer pair.
//!
//! One transport == one connection. The surrounding runtime decides when a
//! socket is readable or writable and calls [`Transport::read_some`] /
//! [`Transport::write_some`]; the transport moves bytes between the kernel
//! and its buffers and never parses them.

use bytes::{Bytes, BytesMut};

use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::options::NewbOptions;
use crate::tcp::TcpTransport;
use crate::udp::UdpTransport;

/// Byte mover between a socket and the endpoint's buffer pair.
pub trait Transport {
    /// Refill the receive buffer from the socket, overwriting previous
    /// contents.
    ///
    /// A stream transport reports zero received bytes as
    /// [`NewbError::PeerClosed`](crate::error::NewbError::PeerClosed),
    /// distinct from transient failure.
    fn read_some(&mut self) -> Result<()>;

    /// Transmit the entire send buffer; on success, empty it.
    fn write_some(&mut self) -> Result<()>;

    /// Hand off the received bytes, leaving the receive buffer empty.
    ///
    /// The returned slice is refcounted; layers may keep pieces of it past
    /// the current event without copying.
    fn take_frame(&mut self) -> Bytes;

    /// Borrow of the send buffer for header and payload appends.
    fn send_buffer(&mut self) -> &mut BytesMut;

    /// Receive buffer contents (inspection).
    fn receive_buffer(&self) -> &[u8];

    /// Mutable receive buffer (test prefill).
    fn receive_buffer_mut(&mut self) -> &mut BytesMut;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn read_some(&mut self) -> Result<()> {
        (**self).read_some()
    }

    fn write_some(&mut self) -> Result<()> {
        (**self).write_some()
    }

    fn take_frame(&mut self) -> Bytes {
        (**self).take_frame()
    }

    fn send_buffer(&mut self) -> &mut BytesMut {
        (**self).send_buffer()
    }

    fn receive_buffer(&self) -> &[u8] {
        (**self).receive_buffer()
    }

    fn receive_buffer_mut(&mut self) -> &mut BytesMut {
        (**self).receive_buffer_mut()
    }
}

/// Open a transport for `endpoint` as a client.
///
/// # Examples
///
/// ```no_run
/// use newb_core::endpoint::Endpoint;
/// use newb_core::options::NewbOptions;
/// use newb_core::transport::dial;
///
/// # fn example() -> newb_core::error::Result<()> {
/// let transport = dial(&Endpoint::parse("tcp://127.0.0.1:5555").unwrap(),
///                      &NewbOptions::default())?;
/// # let _ = transport;
/// # Ok(())
/// # }
/// ```
pub fn dial(endpoint: &Endpoint, options: &NewbOptions) -> Result<Box<dyn Transport>> {
    match endpoint {
        Endpoint::Tcp(addr) => Ok(Box::new(TcpTransport::connect(*addr, options)?)),
        Endpoint::Udp(addr) => Ok(Box::new(UdpTransport::connect(*addr, options)?)),
    }
}
