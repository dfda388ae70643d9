//! Endpoint configuration options
//!
//! This module provides configuration options shared by the transport
//! implementations and the acceptor.

/// Transport and acceptor configuration.
///
/// # Examples
///
/// ```
/// use newb_core::options::NewbOptions;
///
/// let opts = NewbOptions::default()
///     .with_read_buffer_size(4096)
///     .with_nodelay(true);
/// ```
#[derive(Debug, Clone)]
pub struct NewbOptions {
    /// Read buffer size (bytes)
    ///
    /// Capacity used when refilling the receive buffer from a socket.
    /// - Default: 8192 (8KB) - balanced for most workloads
    /// - Small: 4096 (4KB) - for low-latency with small messages
    /// - Large: 16384 (16KB) - for high-throughput with large messages
    pub read_buffer_size: usize,

    /// Write buffer size (bytes)
    ///
    /// Initial capacity of the send buffer headers and payload are
    /// appended to.
    pub write_buffer_size: usize,

    /// Enable TCP_NODELAY on stream transports
    ///
    /// Disables Nagle's algorithm, trading bandwidth efficiency for lower
    /// latency. Essential for request-reply patterns.
    pub nodelay: bool,

    /// Listen backlog for the acceptor
    pub backlog: i32,

    /// Set SO_REUSEADDR on the listening socket
    pub reuse_address: bool,
}

impl Default for NewbOptions {
    fn default() -> Self {
        Self {
            read_buffer_size: 8192,
            write_buffer_size: 8192,
            nodelay: true,
            backlog: 128,
            reuse_address: true,
        }
    }
}

impl NewbOptions {
    /// Create new options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set read buffer size.
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Set write buffer size.
    pub fn with_write_buffer_size(mut self, size: usize) -> Self {
        self.write_buffer_size = size;
        self
    }

    /// Set both read and write buffer sizes (convenience method).
    pub fn with_buffer_sizes(mut self, read_size: usize, write_size: usize) -> Self {
        self.read_buffer_size = read_size;
        self.write_buffer_size = write_size;
        self
    }

    /// Enable or disable TCP_NODELAY.
    pub fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    /// Set the accept backlog.
    pub fn with_backlog(mut self, backlog: i32) -> Self {
        self.backlog = backlog;
        self
    }

    /// Enable or disable SO_REUSEADDR for the listener.
    pub fn with_reuse_address(mut self, reuse: bool) -> Self {
        self.reuse_address = reuse;
        self
    }
}
