//! In-memory transport for tests.
//!
//! `read_some` succeeds without touching the receive buffer, so tests
//! prefill it with [`Loopback::feed`] (or by swapping in a previously
//! written send buffer) before firing a read event.

use std::mem;

use bytes::{Bytes, BytesMut};

use crate::error::Result;
use crate::transport::Transport;

/// Loopback transport backed only by its buffer pair.
#[derive(Debug, Default)]
pub struct Loopback {
    recv: BytesMut,
    send: BytesMut,
}

impl Loopback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the receive buffer contents with `bytes`, as if one frame
    /// had just arrived.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.recv.clear();
        self.recv.extend_from_slice(bytes);
    }

    /// Exchange send and receive buffers, turning written output into the
    /// next incoming frame.
    pub fn swap_buffers(&mut self) {
        mem::swap(&mut self.recv, &mut self.send);
    }

    /// Send buffer contents (inspection).
    pub fn sent(&self) -> &[u8] {
        &self.send
    }
}

impl Transport for Loopback {
    fn read_some(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_some(&mut self) -> Result<()> {
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
