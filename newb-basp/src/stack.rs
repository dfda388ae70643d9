//! Stack adapter: a composed layer nest behind the endpoint's uniform
//! protocol interface.

use bytes::{Bytes, BytesMut};
use newb_core::error::Result;
use newb_core::protocol::{Events, HeaderWriter, Protocol};

use crate::layer::{Layer, TimeoutToken};

/// Adapter from a concrete layer nest to [`newb_core::protocol::Protocol`].
///
/// # Examples
///
/// ```
/// use newb_basp::basp::Basp;
/// use newb_basp::ordering::Ordering;
/// use newb_basp::stack::Stack;
/// use newb_core::protocol::Protocol;
///
/// let stack = Stack::new(Ordering::new(Basp));
/// assert_eq!(stack.offset(), 12);
/// ```
#[derive(Debug)]
pub struct Stack<L> {
    layers: L,
}

impl<L: Default> Default for Stack<L> {
    fn default() -> Self {
        Self::new(L::default())
    }
}

impl<L> Stack<L> {
    pub fn new(layers: L) -> Self {
        Self { layers }
    }

    /// The composed nest (state inspection).
    pub fn layers(&self) -> &L {
        &self.layers
    }
}

impl<L: Layer> Protocol for Stack<L> {
    type Message = L::Message;
    type Timeout = TimeoutToken;

    fn read(
        &mut self,
        ev: &mut dyn Events<L::Message, TimeoutToken>,
        frame: Bytes,
    ) -> Result<Option<L::Message>> {
        self.layers.read(ev, frame)
    }

    fn timeout(
        &mut self,
        ev: &mut dyn Events<L::Message, TimeoutToken>,
        token: TimeoutToken,
    ) -> Result<Option<L::Message>> {
        self.layers.timeout(ev, token)
    }

    fn write_header(&mut self, buf: &mut BytesMut, hw: &mut HeaderWriter<'_>) -> Result<usize> {
        // Running offset seeds at 0 at the outermost call; the layers
        // restore the buffer themselves on failure.
        self.layers.write_header(buf, 0, hw)
    }

    fn offset(&self) -> usize {
        L::OFFSET
    }
}
