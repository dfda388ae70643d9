//! BASP: binary actor system protocol, the innermost application layer.
//!
//! Wire layout of the header: `from` then `to`, raw little-endian u32 each,
//! no padding. Everything after the header is payload and stays a
//! refcounted slice of the receive buffer.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use newb_core::error::{NewbError, Result};
use newb_core::protocol::{Events, HeaderWriter};

use crate::layer::{Layer, TimeoutToken};

/// Actor identifier carried in the BASP header.
pub type ActorId = u32;

/// BASP application header: source and destination actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaspHeader {
    pub from: ActorId,
    pub to: ActorId,
}

impl BaspHeader {
    /// Serialized size on the wire.
    pub const SIZE: usize = 8;

    pub const fn new(from: ActorId, to: ActorId) -> Self {
        Self { from, to }
    }

    /// Append the wire form of this header.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.from);
        buf.put_u32_le(self.to);
    }

    /// A header writer closure for [`Newb::wr_buf`](newb_core::newb::Newb::wr_buf).
    pub fn writer(self) -> impl FnMut(&mut BytesMut) -> Result<()> {
        move |buf: &mut BytesMut| {
            self.write_to(buf);
            Ok(())
        }
    }
}

/// A fully parsed application message.
///
/// `payload` is a refcounted slice of the frame it arrived in; holding it
/// past the current event is fine and copies nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaspMessage {
    pub header: BaspHeader,
    pub payload: Bytes,
}

impl BaspMessage {
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }
}

/// The innermost layer: strips the application header, yields the message.
#[derive(Debug, Default)]
pub struct Basp;

impl Layer for Basp {
    type Message = BaspMessage;

    const HEADER_SIZE: usize = BaspHeader::SIZE;
    const OFFSET: usize = Self::HEADER_SIZE;

    fn read(
        &mut self,
        _ev: &mut dyn Events<BaspMessage, TimeoutToken>,
        mut bytes: Bytes,
    ) -> Result<Option<BaspMessage>> {
        if bytes.len() < Self::HEADER_SIZE {
            return Err(NewbError::MalformedHeader {
                need: Self::HEADER_SIZE,
                have: bytes.len(),
            });
        }
        let from = bytes.get_u32_le();
        let to = bytes.get_u32_le();
        Ok(Some(BaspMessage {
            header: BaspHeader { from, to },
            payload: bytes,
        }))
    }

    fn timeout(
        &mut self,
        _ev: &mut dyn Events<BaspMessage, TimeoutToken>,
        _token: TimeoutToken,
    ) -> Result<Option<BaspMessage>> {
        // owns no timers
        Ok(None)
    }

    fn write_header(
        &mut self,
        buf: &mut BytesMut,
        offset: usize,
        hw: &mut HeaderWriter<'_>,
    ) -> Result<usize> {
        let mark = buf.len();
        if let Err(e) = hw(buf) {
            buf.truncate(mark);
            return Err(e);
        }
        let wrote = buf.len() - mark;
        if wrote != Self::HEADER_SIZE {
            buf.truncate(mark);
            return Err(NewbError::HeaderSize {
                expected: Self::HEADER_SIZE,
                wrote,
            });
        }
        Ok(offset + Self::HEADER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoEvents;

    impl Events<BaspMessage, TimeoutToken> for NoEvents {
        fn deliver(&mut self, _msg: BaspMessage) {
            panic!("basp layer never delivers out of band");
        }

        fn set_timeout(&mut self, _after: std::time::Duration, _token: TimeoutToken) {
            panic!("basp layer owns no timers");
        }
    }

    #[test]
    fn read_strips_header_and_keeps_payload() {
        let mut frame = BytesMut::new();
        BaspHeader::new(13, 42).write_to(&mut frame);
        frame.extend_from_slice(&1337u32.to_le_bytes());

        let msg = Basp
            .read(&mut NoEvents, frame.freeze())
            .unwrap()
            .expect("in-order frame yields a message");
        assert_eq!(msg.header, BaspHeader::new(13, 42));
        assert_eq!(&msg.payload[..], 1337u32.to_le_bytes());
    }

    #[test]
    fn short_frame_is_malformed() {
        let err = Basp
            .read(&mut NoEvents, Bytes::from_static(&[1, 2, 3]))
            .unwrap_err();
        assert!(matches!(err, NewbError::MalformedHeader { need: 8, have: 3 }));
    }

    #[test]
    fn write_header_runs_the_caller_writer() {
        let mut buf = BytesMut::new();
        let mut hw = BaspHeader::new(7, 9).writer();
        let total = Basp.write_header(&mut buf, 4, &mut hw).unwrap();
        assert_eq!(total, 12);
        assert_eq!(&buf[..4], 7u32.to_le_bytes());
        assert_eq!(&buf[4..8], 9u32.to_le_bytes());
    }

    #[test]
    fn write_header_rejects_wrong_size() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(b"prefix");
        let err = Basp
            .write_header(&mut buf, 0, &mut |buf: &mut BytesMut| {
                buf.put_u8(0xFF);
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, NewbError::HeaderSize { expected: 8, wrote: 1 }));
        assert_eq!(&buf[..], b"prefix");
    }

    #[test]
    fn write_header_restores_buffer_on_writer_error() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(b"keep");
        let err = Basp
            .write_header(&mut buf, 0, &mut |buf: &mut BytesMut| {
                buf.put_u32_le(1);
                Err(NewbError::UnexpectedMessage)
            })
            .unwrap_err();
        assert!(matches!(err, NewbError::UnexpectedMessage));
        assert_eq!(&buf[..], b"keep");
    }
}
