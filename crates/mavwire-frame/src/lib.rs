//! Checksummed message framing for the mavwire codec.
//!
//! Every message travels in a frame:
//! - a one-byte start sign (`0xFE`) for stream synchronization
//! - a five-byte header: payload length, sequence, system id, component id, message id
//! - the fixed-layout payload
//! - a two-byte little-endian CRC-16/MCRF4XX over the header, the payload
//!   and the definition's extra CRC
//!
//! [`MessageStream`] reads frames from any byte source and resynchronizes
//! past garbage, unknown messages and checksum failures, so callers only
//! ever see validated messages.

pub mod codec;
pub mod config;
pub mod error;
pub mod message;
pub mod stream;
pub mod value;

pub use codec::{
    decode_message, encode_message, frame_crc, FrameHeader, CRC_SIZE, HEADER_SIZE,
    MIN_FRAME_SIZE, START_SIGN,
};
pub use config::StreamConfig;
pub use error::{FrameError, Result, UnknownReason};
pub use message::Message;
pub use stream::{MessageStream, StreamStats};
pub use value::Value;
