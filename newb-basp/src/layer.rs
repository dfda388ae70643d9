//! Layer composition: one tier of the protocol stack.
//!
//! Layers compose by value nesting: an outer layer holds its inner layer
//! as a field, so a whole stack is one concrete type
//! (e.g. `Ordering<Basp>`) and every delegation monomorphizes. Header
//! sizes sum at compile time through `OFFSET`, and the application message
//! type propagates outward unchanged through `Message`. The single dynamic
//! seam is the [`Events`] context handed in per event.

use bytes::{Bytes, BytesMut};
use newb_core::error::Result;
use newb_core::protocol::{Events, HeaderWriter};

/// Opaque token a layer posts through [`Events::set_timeout`] and
/// recognizes when the timer redelivers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeoutToken {
    /// Ordering layer: give up waiting for the gap ahead of `seq`.
    Ordering { seq: u32 },
}

/// One tier of a composed protocol stack.
///
/// On ingress a layer parses and strips its own header from the front of
/// the frame, then either defers (buffer + timer, `Ok(None)`) or delegates
/// the rest inward. On egress it appends its header and recurses inward,
/// the innermost tier finishing with the caller's header writer.
pub trait Layer {
    /// Application message type, defined by the innermost layer.
    type Message;

    /// Bytes this layer's own header occupies on the wire.
    const HEADER_SIZE: usize;

    /// Total header bytes from this layer inward.
    const OFFSET: usize;

    /// Parse and strip this layer's header, then delegate or defer.
    fn read(
        &mut self,
        ev: &mut dyn Events<Self::Message, TimeoutToken>,
        bytes: Bytes,
    ) -> Result<Option<Self::Message>>;

    /// Handle a fired timer token if it belongs to this layer, otherwise
    /// delegate inward.
    fn timeout(
        &mut self,
        ev: &mut dyn Events<Self::Message, TimeoutToken>,
        token: TimeoutToken,
    ) -> Result<Option<Self::Message>>;

    /// Append this layer's header at `buf`'s tail and recurse inward;
    /// `offset` is the number of header bytes outer layers already
    /// appended. Returns the total header bytes reserved once the
    /// innermost tier has run the caller's header writer.
    fn write_header(
        &mut self,
        buf: &mut BytesMut,
        offset: usize,
        hw: &mut HeaderWriter<'_>,
    ) -> Result<usize>;
}
