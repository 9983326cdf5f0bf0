//! CRC-16/MCRF4XX (X.25 style) checksum used by every frame and by the
//! layout fingerprint of each message definition.

/// Initial accumulator value.
pub const X25_INIT_CRC: u16 = 0xFFFF;

/// Accumulate one byte into a running checksum.
pub fn accumulate(byte: u8, crc: u16) -> u16 {
    let mut tmp = byte ^ (crc & 0x00FF) as u8;
    tmp ^= tmp << 4;
    let tmp = u16::from(tmp);
    (crc >> 8) ^ (tmp << 8) ^ (tmp << 3) ^ (tmp >> 4)
}

/// Fold a slice into an existing checksum.
pub fn extend(crc: u16, data: &[u8]) -> u16 {
    data.iter().fold(crc, |acc, b| accumulate(*b, acc))
}

/// Compute the checksum of a slice from [`X25_INIT_CRC`].
pub fn compute(data: &[u8]) -> u16 {
    extend(X25_INIT_CRC, data)
}
