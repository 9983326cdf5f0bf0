/// Default initial receive buffer capacity: 8 KiB.
pub const DEFAULT_BUFFER_CAPACITY: usize = 8 * 1024;

/// Default number of bytes requested from the source per refill: 8 KiB.
pub const DEFAULT_READ_CHUNK: usize = 8 * 1024;

/// Configuration for a message stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Initial capacity of the receive buffer.
    pub buffer_capacity: usize,
    /// Bytes requested from the source per refill.
    pub read_chunk_size: usize,
    /// Sequence number assigned to the first transmitted frame.
    pub initial_sequence: u8,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            read_chunk_size: DEFAULT_READ_CHUNK,
            initial_sequence: 0,
        }
    }
}
