//! Uniform protocol-policy interface consumed by the endpoint.
//!
//! A concrete protocol is a nest of layers composed statically in a
//! protocol crate; this module defines the single seam the endpoint sees:
//! - [`Protocol`]: read/timeout/write_header over a fully composed stack
//! - [`Events`]: the capabilities a stack may use while handling one event
//! - [`HeaderWriter`]: the caller-supplied callback that appends the
//!   innermost application header on the write path

use std::time::Duration;

use bytes::{Bytes, BytesMut};

use crate::error::Result;

/// Caller-supplied callback that appends the application header bytes.
///
/// Contract: append exactly the innermost layer's declared header size, in
/// the declared wire layout. Returning an error aborts the write-path call
/// and the send buffer is restored to its previous state.
pub type HeaderWriter<'a> = dyn FnMut(&mut BytesMut) -> Result<()> + 'a;

/// Capabilities a protocol stack may use while handling a read or timeout
/// event.
///
/// The endpoint hands an implementation of this trait into
/// [`Protocol::read`] and [`Protocol::timeout`]. Everything here runs on
/// the endpoint's own execution context; implementations never block.
pub trait Events<M, T> {
    /// Dispatch a message to the application handler right away.
    ///
    /// Used when one event releases more than one message: the extra
    /// messages are pushed here while the final one travels up the return
    /// path.
    fn deliver(&mut self, msg: M);

    /// Arm a timer that will redeliver `token` through the endpoint's
    /// timeout entry point after `after` elapses.
    fn set_timeout(&mut self, after: Duration, token: T);
}

/// A fully composed protocol stack viewed through one interface.
///
/// `Message` is defined by the innermost (application) layer and propagates
/// outward unchanged; `Timeout` is the opaque token type layers post
/// through [`Events::set_timeout`] and recognize when it comes back.
pub trait Protocol {
    /// Application message produced by the innermost layer.
    type Message;

    /// Opaque timeout token understood by the layers of this stack.
    type Timeout;

    /// Parse one received frame, stripping headers outside-in.
    ///
    /// Returns:
    /// - `Ok(Some(msg))` - a message reached the application layer
    /// - `Ok(None)` - a layer deferred the frame (buffered, timer armed)
    ///   or dropped it as stale
    /// - `Err` - the frame was malformed
    fn read(
        &mut self,
        ev: &mut dyn Events<Self::Message, Self::Timeout>,
        frame: Bytes,
    ) -> Result<Option<Self::Message>>;

    /// Hand a fired timer token back to the layer that armed it.
    ///
    /// `Ok(None)` means no layer had anything left to release for this
    /// token (it was already delivered in order before the timer fired).
    fn timeout(
        &mut self,
        ev: &mut dyn Events<Self::Message, Self::Timeout>,
        token: Self::Timeout,
    ) -> Result<Option<Self::Message>>;

    /// Append every layer's header to `buf`, outermost first, finishing
    /// with the caller's `hw` for the application header.
    ///
    /// Returns the total number of header bytes appended, which equals
    /// [`Protocol::offset`]. On error the buffer is left as it was.
    fn write_header(&mut self, buf: &mut BytesMut, hw: &mut HeaderWriter<'_>) -> Result<usize>;

    /// Sum of all layers' header sizes.
    fn offset(&self) -> usize;
}
