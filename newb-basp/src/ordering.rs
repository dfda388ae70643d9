//! Ordering layer: sequence-number reassembly with timeout-driven flush.
//!
//! Every outgoing frame is stamped with a 32-bit sequence number; incoming
//! frames are released inward strictly in sequence order. A frame arriving
//! ahead of the expected sequence is buffered and a timer is armed; when
//! the timer fires before the gap closes, the expected sequence is forced
//! past the hole and the buffered frame is released. Sequence comparison
//! is modular, so a long-lived session wraps instead of sticking.

use std::time::Duration;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use hashbrown::HashMap;
use newb_core::error::{NewbError, Result};
use newb_core::protocol::{Events, HeaderWriter};
use tracing::{debug, trace};

use crate::layer::{Layer, TimeoutToken};

/// Reassembly timeout armed per buffered out-of-order frame.
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Upper bound on buffered out-of-order frames. Frames arriving with the
/// buffer full are dropped like any other datagram loss.
pub const MAX_PENDING: usize = 1024;

/// `a` strictly after `b` in modular u32 order.
const fn seq_after(a: u32, b: u32) -> bool {
    (a.wrapping_sub(b) as i32) > 0
}

/// Wrapper layer adding a `seq_nr` header over any inner layer.
#[derive(Debug)]
pub struct Ordering<L> {
    next: L,
    next_seq_read: u32,
    next_seq_write: u32,
    pending: HashMap<u32, Bytes>,
    flush_timeout: Duration,
}

impl<L: Default> Default for Ordering<L> {
    fn default() -> Self {
        Self::new(L::default())
    }
}

impl<L> Ordering<L> {
    pub fn new(next: L) -> Self {
        Self::with_timeout(next, DEFAULT_FLUSH_TIMEOUT)
    }

    pub fn with_timeout(next: L, flush_timeout: Duration) -> Self {
        Self {
            next,
            next_seq_read: 0,
            next_seq_write: 0,
            pending: HashMap::new(),
            flush_timeout,
        }
    }

    /// Sequence number the next in-order frame must carry.
    pub fn next_seq_read(&self) -> u32 {
        self.next_seq_read
    }

    /// Sequence number the next written frame will carry.
    pub fn next_seq_write(&self) -> u32 {
        self.next_seq_write
    }

    /// Number of buffered out-of-order frames.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl<L: Layer> Ordering<L> {
    /// Release consecutive buffered frames starting at `next_seq_read`.
    ///
    /// `last` is the message the current event already produced; while
    /// more buffered frames follow it, each produced message is pushed at
    /// the handler and its successor takes over the return slot, so the
    /// caller dispatches the final one and delivery order is preserved.
    fn drain(
        &mut self,
        ev: &mut dyn Events<L::Message, TimeoutToken>,
        mut last: Option<L::Message>,
    ) -> Result<Option<L::Message>> {
        while let Some(buf) = self.pending.remove(&self.next_seq_read) {
            trace!(seq = self.next_seq_read, "releasing buffered frame");
            if let Some(msg) = last.take() {
                ev.deliver(msg);
            }
            self.next_seq_read = self.next_seq_read.wrapping_add(1);
            last = self.next.read(ev, buf)?;
        }
        Ok(last)
    }

    /// Drop buffered frames a forced advance has overtaken.
    fn purge_overtaken(&mut self) {
        let expected = self.next_seq_read;
        self.pending.retain(|&seq, _| {
            let keep = seq == expected || seq_after(seq, expected);
            if !keep {
                debug!(seq, expected, "dropping overtaken buffered frame");
            }
            keep
        });
    }
}

impl<L: Layer> Layer for Ordering<L> {
    type Message = L::Message;

    const HEADER_SIZE: usize = 4;
    const OFFSET: usize = L::OFFSET + Self::HEADER_SIZE;

    fn read(
        &mut self,
        ev: &mut dyn Events<L::Message, TimeoutToken>,
        mut bytes: Bytes,
    ) -> Result<Option<L::Message>> {
        if bytes.len() < Self::HEADER_SIZE {
            return Err(NewbError::MalformedHeader {
                need: Self::HEADER_SIZE,
                have: bytes.len(),
            });
        }
        let seq = bytes.get_u32_le();

        if seq == self.next_seq_read {
            self.next_seq_read = self.next_seq_read.wrapping_add(1);
            let msg = self.next.read(ev, bytes)?;
            return self.drain(ev, msg);
        }

        if seq_after(seq, self.next_seq_read) {
            if self.pending.len() >= MAX_PENDING {
                debug!(seq, "pending buffer full, dropping frame");
                return Ok(None);
            }
            trace!(seq, expected = self.next_seq_read, "buffering out-of-order frame");
            self.pending.insert(seq, bytes);
            ev.set_timeout(self.flush_timeout, TimeoutToken::Ordering { seq });
            return Ok(None);
        }

        trace!(seq, expected = self.next_seq_read, "dropping stale frame");
        Ok(None)
    }

    fn timeout(
        &mut self,
        ev: &mut dyn Events<L::Message, TimeoutToken>,
        token: TimeoutToken,
    ) -> Result<Option<L::Message>> {
        let TimeoutToken::Ordering { seq } = token;
        match self.pending.remove(&seq) {
            Some(buf) => {
                debug!(
                    seq,
                    expected = self.next_seq_read,
                    "flush timeout fired, advancing past gap"
                );
                self.next_seq_read = seq.wrapping_add(1);
                self.purge_overtaken();
                let msg = self.next.read(ev, buf)?;
                self.drain(ev, msg)
            }
            // Delivered in order before the timer fired, or already
            // flushed by an earlier timeout.
            None => Ok(None),
        }
    }

    fn write_header(
        &mut self,
        buf: &mut BytesMut,
        offset: usize,
        hw: &mut HeaderWriter<'_>,
    ) -> Result<usize> {
        let mark = buf.len();
        buf.put_u32_le(self.next_seq_write);
        match self.next.write_header(buf, offset + Self::HEADER_SIZE, hw) {
            Ok(total) => {
                self.next_seq_write = self.next_seq_write.wrapping_add(1);
                Ok(total)
            }
            Err(e) => {
                buf.truncate(mark);
                Err(e)
            }
        }
    }
}
