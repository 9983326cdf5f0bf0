use std::sync::Arc;

use bytes::{Buf, BufMut, BytesMut};
use mavwire_schema::{crc, Schema};

use crate::error::{FrameError, Result, UnknownReason};
use crate::message::Message;

/// First byte of every frame.
pub const START_SIGN: u8 = 0xFE;

/// Start sign + length + sequence + system id + component id + message id.
pub const HEADER_SIZE: usize = 6;

/// Checksum trailer, low byte first.
pub const CRC_SIZE: usize = 2;

/// Smallest possible frame: header and checksum around an empty payload.
pub const MIN_FRAME_SIZE: usize = HEADER_SIZE + CRC_SIZE;

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub payload_len: u8,
    pub sequence: u8,
    pub system_id: u8,
    pub component_id: u8,
    pub message_id: u8,
}

impl FrameHeader {
    /// Parse the header fields following a start sign.
    ///
    /// `src` must hold at least [`HEADER_SIZE`] bytes starting at the start sign.
    pub fn parse(src: &[u8]) -> Self {
        Self {
            payload_len: src[1],
            sequence: src[2],
            system_id: src[3],
            component_id: src[4],
            message_id: src[5],
        }
    }

    /// Total wire size of the frame this header announces.
    pub fn frame_len(&self) -> usize {
        HEADER_SIZE + usize::from(self.payload_len) + CRC_SIZE
    }
}

/// Frame checksum over everything after the start sign, then the extra CRC.
pub fn frame_crc(header_and_payload: &[u8], extra_crc: u8) -> u16 {
    let crc = crc::extend(crc::X25_INIT_CRC, &header_and_payload[1..]);
    crc::accumulate(extra_crc, crc)
}

/// Encode a message into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────┬─────┬─────┬────────┬───────────┬────────┬───────────┬─────────┐
/// │ 0xFE │ len │ seq │ sys id │ comp id   │ msg id │ payload   │ crc LE  │
/// │ 1B   │ 1B  │ 1B  │ 1B     │ 1B        │ 1B     │ len bytes │ 2B      │
/// └──────┴─────┴─────┴────────┴───────────┴────────┴───────────┴─────────┘
/// ```
pub fn encode_message(message: &Message, dst: &mut BytesMut) {
    let payload = message.payload();
    let start = dst.len();

    dst.reserve(MIN_FRAME_SIZE + payload.len());
    dst.put_u8(START_SIGN);
    // Payload length fits in one byte; definitions over 255 bytes are rejected.
    dst.put_u8(payload.len() as u8);
    dst.put_u8(message.sequence());
    dst.put_u8(message.system_id());
    dst.put_u8(message.component_id());
    dst.put_u8(message.message_id());
    dst.put_slice(payload);

    let crc = frame_crc(&dst[start..], message.definition().extra_crc());
    dst.put_u16_le(crc);
}

/// Decode one message from the front of a buffer.
///
/// Returns `Ok(None)` when the buffer does not hold a complete frame yet;
/// nothing is consumed in that case. Every error consumes input so that a
/// caller retrying in a loop always makes progress:
///
/// - a bad start sign consumes exactly that byte;
/// - an unregistered id or a length mismatch consumes the frame as the
///   header declares it;
/// - a checksum mismatch consumes the frame.
pub fn decode_message(schema: &Schema, src: &mut BytesMut) -> Result<Option<Message>> {
    let Some(&first) = src.first() else {
        return Ok(None);
    };
    if first != START_SIGN {
        src.advance(1);
        return Err(FrameError::Protocol { found: first });
    }
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let header = FrameHeader::parse(&src[..HEADER_SIZE]);
    let frame_len = header.frame_len();
    if src.len() < frame_len {
        return Ok(None);
    }

    let Some(definition) = schema.by_id(header.message_id) else {
        src.advance(frame_len);
        return Err(UnknownReason::UnregisteredId(header.message_id).into());
    };
    let declared = usize::from(header.payload_len);
    if declared != definition.payload_len() {
        src.advance(frame_len);
        return Err(UnknownReason::LengthMismatch {
            id: header.message_id,
            declared,
            expected: definition.payload_len(),
        }
        .into());
    }

    let frame = src.split_to(frame_len);
    let body_end = HEADER_SIZE + declared;
    let received = u16::from_le_bytes([frame[body_end], frame[body_end + 1]]);
    let computed = frame_crc(&frame[..body_end], definition.extra_crc());
    if received != computed {
        return Err(UnknownReason::ChecksumMismatch {
            id: header.message_id,
            received,
            computed,
        }
        .into());
    }

    Ok(Some(Message::from_wire(
        Arc::clone(definition),
        &header,
        &frame[HEADER_SIZE..body_end],
        received,
    )))
}
