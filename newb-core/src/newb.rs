//! Connection-local endpoint ("newb").
//!
//! One newb == one connection. It owns a transport and a protocol stack
//! and routes bytes between them:
//! - ingress: `read_event` refills the receive buffer, runs the stack
//!   outside-in, and dispatches the resulting application message
//! - egress: `wr_buf` reserves every layer's header in the send buffer and
//!   hands the caller a write handle to append payload; `write_event`
//!   flushes
//! - timers: layers arm timeouts through the runtime; fired tokens come
//!   back through `timeout_event`
//!
//! All methods run on the owning runtime's execution context; nothing here
//! is called concurrently.

use std::marker::PhantomData;
use std::time::Duration;

use bytes::BytesMut;
use tracing::trace;

use crate::error::{NewbError, Result};
use crate::protocol::{Events, Protocol};
use crate::transport::Transport;

/// Hooks the surrounding runtime provides for one endpoint: application
/// dispatch and timer scheduling.
///
/// A production runtime posts `set_timeout` tokens back as delayed
/// `timeout_event` calls; a test runtime records them in a list.
pub trait Runtime<P: Protocol> {
    /// Application handler for a fully parsed message.
    fn handle(&mut self, msg: P::Message);

    /// Schedule `token` for redelivery through
    /// [`Newb::timeout_event`] after `after` elapses.
    fn set_timeout(&mut self, after: Duration, token: P::Timeout);
}

/// Event capabilities handed to the stack for the duration of one call
/// chain. Borrows the runtime only, so the stack and transport stay free
/// for the event itself.
struct EventCtx<'a, P, R> {
    runtime: &'a mut R,
    _stack: PhantomData<fn(P)>,
}

impl<P: Protocol, R: Runtime<P>> Events<P::Message, P::Timeout> for EventCtx<'_, P, R> {
    fn deliver(&mut self, msg: P::Message) {
        self.runtime.handle(msg);
    }

    fn set_timeout(&mut self, after: Duration, token: P::Timeout) {
        self.runtime.set_timeout(after, token);
    }
}

/// Transient borrow of the send buffer, positioned past every reserved
/// header. Every byte appended through it is payload.
///
/// There is no flush on drop; [`Newb::write_event`] transmits explicitly.
#[derive(Debug)]
pub struct WriteHandle<'a> {
    buf: &'a mut BytesMut,
    header_offset: usize,
    payload_start: usize,
}

impl WriteHandle<'_> {
    /// Number of header bytes reserved ahead of the payload.
    pub fn header_offset(&self) -> usize {
        self.header_offset
    }

    /// The send buffer itself, headers already in place.
    pub fn buf(&mut self) -> &mut BytesMut {
        self.buf
    }

    /// Append payload bytes.
    pub fn append(&mut self, payload: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(payload);
        self
    }

    /// Payload bytes appended so far.
    pub fn payload_len(&self) -> usize {
        self.buf.len() - self.payload_start
    }
}

/// The endpoint: transport + protocol stack + runtime hooks.
pub struct Newb<T, P, R> {
    transport: T,
    stack: P,
    runtime: R,
}

impl<T, P, R> Newb<T, P, R>
where
    T: Transport,
    P: Protocol,
    R: Runtime<P>,
{
    pub fn new(transport: T, stack: P, runtime: R) -> Self {
        Self {
            transport,
            stack,
            runtime,
        }
    }

    /// The socket became readable: refill, parse, dispatch.
    ///
    /// `Err(UnexpectedMessage)` means this event delivered nothing (the
    /// stack deferred or dropped the frame); the connection stays usable.
    pub fn read_event(&mut self) -> Result<()> {
        self.transport.read_some()?;
        let frame = self.transport.take_frame();
        trace!(bytes = frame.len(), "read event");
        let mut ev = EventCtx {
            runtime: &mut self.runtime,
            _stack: PhantomData,
        };
        match self.stack.read(&mut ev, frame)? {
            Some(msg) => {
                self.runtime.handle(msg);
                Ok(())
            }
            None => Err(NewbError::UnexpectedMessage),
        }
    }

    /// A previously armed timer fired: hand the token to the stack.
    pub fn timeout_event(&mut self, token: P::Timeout) -> Result<()> {
        let mut ev = EventCtx {
            runtime: &mut self.runtime,
            _stack: PhantomData,
        };
        match self.stack.timeout(&mut ev, token)? {
            Some(msg) => {
                self.runtime.handle(msg);
                Ok(())
            }
            None => Err(NewbError::UnexpectedMessage),
        }
    }

    /// Flush the send buffer to the peer.
    pub fn write_event(&mut self) -> Result<()> {
        self.transport.write_some()
    }

    /// Begin one outgoing message: reserve every layer's header in the
    /// send buffer, filling the innermost application header through
    /// `header_writer`, and return a handle positioned for payload.
    pub fn wr_buf<F>(&mut self, mut header_writer: F) -> Result<WriteHandle<'_>>
    where
        F: FnMut(&mut BytesMut) -> Result<()>,
    {
        let buf = self.transport.send_buffer();
        let header_offset = self.stack.write_header(buf, &mut header_writer)?;
        let payload_start = buf.len();
        Ok(WriteHandle {
            buf,
            header_offset,
            payload_start,
        })
    }

    /// Arm a timer through the runtime collaborator.
    pub fn set_timeout(&mut self, after: Duration, token: P::Timeout) {
        self.runtime.set_timeout(after, token);
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn stack(&self) -> &P {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut P {
        &mut self.stack
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loopback::Loopback;
    use crate::protocol::HeaderWriter;
    use bytes::Bytes;

    /// Two-byte tag header, frame body passed through as the message.
    struct TagProto;

    impl Protocol for TagProto {
        type Message = Bytes;
        type Timeout = u32;

        fn read(
            &mut self,
            _ev: &mut dyn Events<Bytes, u32>,
            mut frame: Bytes,
        ) -> Result<Option<Bytes>> {
            if frame.len() < 2 {
                return Err(NewbError::MalformedHeader {
                    need: 2,
                    have: frame.len(),
                });
            }
            let _ = frame.split_to(2);
            Ok(Some(frame))
        }

        fn timeout(
            &mut self,
            _ev: &mut dyn Events<Bytes, u32>,
            _token: u32,
        ) -> Result<Option<Bytes>> {
            Ok(None)
        }

        fn write_header(
            &mut self,
            buf: &mut BytesMut,
            hw: &mut HeaderWriter<'_>,
        ) -> Result<usize> {
            let mark = buf.len();
            hw(buf)?;
            Ok(buf.len() - mark)
        }

        fn offset(&self) -> usize {
            2
        }
    }

    #[derive(Default)]
    struct Recorder {
        handled: Vec<Bytes>,
        timeouts: Vec<(Duration, u32)>,
    }

    impl Runtime<TagProto> for Recorder {
        fn handle(&mut self, msg: Bytes) {
            self.handled.push(msg);
        }

        fn set_timeout(&mut self, after: Duration, token: u32) {
            self.timeouts.push((after, token));
        }
    }

    fn newb() -> Newb<Loopback, TagProto, Recorder> {
        Newb::new(Loopback::new(), TagProto, Recorder::default())
    }

    #[test]
    fn read_event_dispatches_message() {
        let mut n = newb();
        n.transport_mut().feed(b"\x01\x02payload");
        n.read_event().unwrap();
        assert_eq!(n.runtime().handled, vec![Bytes::from_static(b"payload")]);
    }

    #[test]
    fn read_event_surfaces_malformed_input() {
        let mut n = newb();
        n.transport_mut().feed(b"\x01");
        let err = n.read_event().unwrap_err();
        assert!(matches!(err, NewbError::MalformedHeader { need: 2, have: 1 }));
        assert!(n.runtime().handled.is_empty());
    }

    #[test]
    fn timeout_event_without_owner_is_unexpected() {
        let mut n = newb();
        let err = n.timeout_event(7).unwrap_err();
        assert!(matches!(err, NewbError::UnexpectedMessage));
    }

    #[test]
    fn wr_buf_reserves_header_then_payload() {
        let mut n = newb();
        let mut handle = n
            .wr_buf(|buf: &mut BytesMut| {
                buf.extend_from_slice(b"\xAA\xBB");
                Ok(())
            })
            .unwrap();
        assert_eq!(handle.header_offset(), 2);
        handle.append(b"body");
        assert_eq!(handle.payload_len(), 4);
        assert_eq!(n.transport().sent(), b"\xAA\xBBbody");
    }

    #[test]
    fn set_timeout_reaches_runtime() {
        let mut n = newb();
        n.set_timeout(Duration::from_secs(1), 42);
        assert_eq!(n.runtime().timeouts, vec![(Duration::from_secs(1), 42)]);
    }
}
