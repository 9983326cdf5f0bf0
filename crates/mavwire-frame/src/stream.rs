use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use mavwire_schema::Schema;

use crate::codec::{decode_message, MIN_FRAME_SIZE};
use crate::config::StreamConfig;
use crate::error::{FrameError, Result, UnknownReason};
use crate::message::Message;

/// Counters describing what a stream has decoded and skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub messages_read: u64,
    pub messages_written: u64,
    /// Every byte discarded while resynchronizing, whole skipped frames included.
    pub bytes_skipped: u64,
    pub bad_start_signs: u64,
    pub unknown_ids: u64,
    pub length_mismatches: u64,
    pub checksum_errors: u64,
}

impl StreamStats {
    fn record(&mut self, reason: &UnknownReason) {
        match reason {
            UnknownReason::UnregisteredId(_) | UnknownReason::UnregisteredName(_) => {
                self.unknown_ids += 1
            }
            UnknownReason::LengthMismatch { .. } => self.length_mismatches += 1,
            UnknownReason::ChecksumMismatch { .. } => self.checksum_errors += 1,
        }
    }
}

/// Reads and writes messages over any byte source/sink.
///
/// Reading keeps a rolling buffer and resynchronizes past corrupt or
/// foreign data: a bad start sign costs one byte, a rejected frame costs
/// the frame. Callers only ever see fully validated messages.
pub struct MessageStream<T> {
    inner: T,
    schema: Arc<Schema>,
    buf: BytesMut,
    config: StreamConfig,
    tx_sequence: u8,
    stats: StreamStats,
    /// Garbage bytes skipped since the last start sign was found.
    resync_run: u64,
}

impl<T> MessageStream<T> {
    /// Create a stream with default configuration.
    pub fn new(inner: T, schema: Arc<Schema>) -> Self {
        Self::with_config(inner, schema, StreamConfig::default())
    }

    /// Create a stream with explicit configuration.
    pub fn with_config(inner: T, schema: Arc<Schema>, config: StreamConfig) -> Self {
        Self {
            inner,
            schema,
            buf: BytesMut::with_capacity(config.buffer_capacity),
            tx_sequence: config.initial_sequence,
            config,
            stats: StreamStats::default(),
            resync_run: 0,
        }
    }

    /// Assign the next transmit sequence number and serialize, without I/O.
    pub fn encode_next(&mut self, message: &mut Message) -> Bytes {
        let sequence = self.tx_sequence;
        self.tx_sequence = sequence.wrapping_add(1);
        message.encode(sequence)
    }

    /// Sequence number the next transmitted frame will carry.
    pub fn next_sequence(&self) -> u8 {
        self.tx_sequence
    }

    /// Append received bytes to the buffer, for sources the caller drives.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Decode the next message from bytes already buffered.
    ///
    /// Returns `Ok(None)` once fewer than a complete frame remain.
    pub fn read_buffered(&mut self) -> Result<Option<Message>> {
        while self.buf.len() >= MIN_FRAME_SIZE {
            let before = self.buf.len();
            match decode_message(&self.schema, &mut self.buf) {
                Ok(Some(message)) => {
                    self.end_resync_run();
                    self.stats.messages_read += 1;
                    return Ok(Some(message));
                }
                Ok(None) => break,
                Err(FrameError::Protocol { .. }) => {
                    self.stats.bad_start_signs += 1;
                    self.stats.bytes_skipped += 1;
                    self.resync_run += 1;
                }
                Err(FrameError::UnknownMessage(reason)) => {
                    self.end_resync_run();
                    let skipped = before - self.buf.len();
                    self.stats.bytes_skipped += skipped as u64;
                    self.stats.record(&reason);
                    tracing::debug!(%reason, skipped, "skipping frame");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }

    /// Number of received bytes not yet consumed.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    /// Current stream configuration.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Borrow the underlying source/sink.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying source/sink.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the stream and return the inner source/sink.
    pub fn into_inner(self) -> T {
        self.inner
    }

    fn end_resync_run(&mut self) {
        if self.resync_run > 0 {
            tracing::debug!(bytes = self.resync_run, "resynchronized on start sign");
            self.resync_run = 0;
        }
    }
}

impl<T: Read> MessageStream<T> {
    /// Read the next valid message (blocking on the source).
    ///
    /// Returns `Ok(None)` when the source has no more bytes at the moment;
    /// a partial frame stays buffered for the next call.
    pub fn read(&mut self) -> Result<Option<Message>> {
        loop {
            if let Some(message) = self.read_buffered()? {
                return Ok(Some(message));
            }
            if self.fill()? == 0 {
                self.end_resync_run();
                return Ok(None);
            }
        }
    }

    fn fill(&mut self) -> Result<usize> {
        let chunk = self.config.read_chunk_size.max(1);
        let start = self.buf.len();
        // Zero-extends one chunk; the consumed prefix is reclaimed when the tail fits.
        self.buf.resize(start + chunk, 0);

        loop {
            match self.inner.read(&mut self.buf[start..]) {
                Ok(n) => {
                    self.buf.truncate(start + n);
                    tracing::trace!(read = n, buffered = self.buf.len(), "refilled");
                    return Ok(n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.buf.truncate(start);
                    return Err(FrameError::Io(err));
                }
            }
        }
    }
}

impl<T: Write> MessageStream<T> {
    /// Assign the next sequence number, encode and write a message.
    pub fn write(&mut self, message: &mut Message) -> Result<()> {
        let frame = self.encode_next(message);

        let mut offset = 0usize;
        while offset < frame.len() {
            match self.inner.write(&frame[offset..]) {
                Ok(0) => return Err(FrameError::Io(ErrorKind::WriteZero.into())),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.stats.messages_written += 1;
        self.flush()
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }
}

impl<T: Seek> MessageStream<T> {
    /// Offset in the source of the next unconsumed byte.
    pub fn position(&mut self) -> Result<u64> {
        let source = self.inner.stream_position()?;
        Ok(source.saturating_sub(self.buf.len() as u64))
    }

    /// Reposition the source and discard everything buffered.
    pub fn seek(&mut self, pos: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        self.end_resync_run();
        self.buf.clear();
        Ok(())
    }
}

impl<T> std::fmt::Debug for MessageStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageStream")
            .field("buffered", &self.buf.len())
            .field("tx_sequence", &self.tx_sequence)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use mavwire_schema::{DataType, MessageDefinition};

    use super::*;
    use crate::value::Value;

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::from_definitions([
            MessageDefinition::builder(0, "HEARTBEAT")
                .field(DataType::UInt32, "custom_mode")
                .field(DataType::UInt8, "type")
                .field(DataType::UInt8, "autopilot")
                .field(DataType::UInt8, "base_mode")
                .field(DataType::UInt8, "system_status")
                .field(DataType::UInt8, "mavlink_version")
                .build()
                .unwrap(),
            MessageDefinition::builder(30, "ATTITUDE")
                .field(DataType::UInt32, "time_boot_ms")
                .field(DataType::Float, "roll")
                .field(DataType::Float, "pitch")
                .field(DataType::Float, "yaw")
                .build()
                .unwrap(),
        ]))
    }

    fn attitude(schema: &Schema, time: u32) -> Message {
        let mut msg = Message::by_name(schema, "ATTITUDE", 1, 1).unwrap();
        msg.set("time_boot_ms", time).unwrap();
        msg.set("roll", 0.25f32).unwrap();
        msg.set("yaw", -1.5f32).unwrap();
        msg
    }

    fn frame(schema: &Schema, time: u32, sequence: u8) -> Vec<u8> {
        attitude(schema, time).encode(sequence).to_vec()
    }

    #[test]
    fn read_single_message() {
        let schema = schema();
        let wire = frame(&schema, 1234, 5);

        let mut stream = MessageStream::new(Cursor::new(wire), Arc::clone(&schema));
        let msg = stream.read().unwrap().unwrap();

        assert_eq!(msg.name(), "ATTITUDE");
        assert_eq!(msg.sequence(), 5);
        assert_eq!(msg.get("time_boot_ms").unwrap(), Value::UInt(1234));
        assert_eq!(msg.get("yaw").unwrap(), Value::Float(-1.5));
        assert!(stream.read().unwrap().is_none());
    }

    #[test]
    fn read_multiple_messages() {
        let schema = schema();
        let mut wire = Vec::new();
        for i in 0..3 {
            wire.extend(frame(&schema, i, i as u8));
        }

        let mut stream = MessageStream::new(Cursor::new(wire), Arc::clone(&schema));
        for i in 0..3u64 {
            let msg = stream.read().unwrap().unwrap();
            assert_eq!(msg.get_u64("time_boot_ms").unwrap(), i);
        }
        assert!(stream.read().unwrap().is_none());
        assert_eq!(stream.stats().messages_read, 3);
    }

    #[test]
    fn garbage_prefix_is_skipped_byte_by_byte() {
        let schema = schema();
        let garbage: Vec<u8> = (0..37u8).map(|b| b.wrapping_mul(7)).collect();
        assert!(!garbage.contains(&0xFE));
        let mut wire = garbage.clone();
        wire.extend(frame(&schema, 99, 0));

        let mut stream = MessageStream::new(Cursor::new(wire), Arc::clone(&schema));
        let msg = stream.read().unwrap().unwrap();

        assert_eq!(msg.get("time_boot_ms").unwrap(), Value::UInt(99));
        assert_eq!(stream.stats().bytes_skipped, garbage.len() as u64);
        assert_eq!(stream.stats().bad_start_signs, garbage.len() as u64);
        assert!(stream.read().unwrap().is_none());
    }

    #[test]
    fn garbage_run_closed_at_end_of_input() {
        let schema = schema();
        let garbage: Vec<u8> = (1..=20u8).collect();

        let mut stream = MessageStream::new(Cursor::new(garbage), Arc::clone(&schema));
        assert!(stream.read().unwrap().is_none());

        // The last bytes stay buffered in case they start a frame.
        assert_eq!(stream.stats().bad_start_signs, 13);
        assert_eq!(stream.buffered(), 7);
        assert_eq!(stream.resync_run, 0);
    }

    #[test]
    fn unregistered_id_does_not_disturb_next_frame() {
        let schema = schema();
        let mut wire = vec![0xFE, 4, 0, 1, 1, 77, 1, 2, 3, 4, 0xAB, 0xCD];
        wire.extend(frame(&schema, 7, 1));

        let mut stream = MessageStream::new(Cursor::new(wire), Arc::clone(&schema));
        let msg = stream.read().unwrap().unwrap();

        assert_eq!(msg.get("time_boot_ms").unwrap(), Value::UInt(7));
        assert_eq!(stream.stats().unknown_ids, 1);
        assert_eq!(stream.stats().bytes_skipped, 12);
    }

    #[test]
    fn corrupted_frame_skipped_then_next_read() {
        let schema = schema();
        let mut bad = frame(&schema, 1, 0);
        bad[8] ^= 0x40;
        let mut wire = bad;
        wire.extend(frame(&schema, 2, 1));

        let mut stream = MessageStream::new(Cursor::new(wire), Arc::clone(&schema));
        let msg = stream.read().unwrap().unwrap();

        assert_eq!(msg.get("time_boot_ms").unwrap(), Value::UInt(2));
        assert_eq!(stream.stats().checksum_errors, 1);
    }

    #[test]
    fn length_mismatch_counted() {
        let schema = schema();
        let mut wire = vec![0xFE, 2, 0, 1, 1, 0, 0, 0, 0, 0];
        wire.extend(frame(&schema, 3, 0));

        let mut stream = MessageStream::new(Cursor::new(wire), Arc::clone(&schema));
        let msg = stream.read().unwrap().unwrap();

        assert_eq!(msg.name(), "ATTITUDE");
        assert_eq!(stream.stats().length_mismatches, 1);
        assert_eq!(stream.stats().bytes_skipped, 10);
    }

    #[test]
    fn partial_read_handling() {
        let schema = schema();
        let reader = ByteByByteReader {
            bytes: frame(&schema, 55, 0),
            pos: 0,
        };

        let mut stream = MessageStream::new(reader, Arc::clone(&schema));
        let msg = stream.read().unwrap().unwrap();
        assert_eq!(msg.get("time_boot_ms").unwrap(), Value::UInt(55));
    }

    #[test]
    fn partial_frame_waits_for_more_data() {
        let schema = schema();
        let wire = frame(&schema, 8, 0);
        let (head, tail) = wire.split_at(11);

        let mut stream = MessageStream::new(Cursor::new(head.to_vec()), Arc::clone(&schema));
        assert!(stream.read().unwrap().is_none());
        assert_eq!(stream.buffered(), 11);

        stream.get_mut().get_mut().extend_from_slice(tail);
        let msg = stream.read().unwrap().unwrap();
        assert_eq!(msg.get("time_boot_ms").unwrap(), Value::UInt(8));
    }

    #[test]
    fn fed_bytes_decode_without_source() {
        let schema = schema();
        let mut stream = MessageStream::new((), Arc::clone(&schema));

        stream.feed(&[0x00, 0x01]);
        stream.feed(&frame(&schema, 4, 0));
        let msg = stream.read_buffered().unwrap().unwrap();

        assert_eq!(msg.get("time_boot_ms").unwrap(), Value::UInt(4));
        assert!(stream.read_buffered().unwrap().is_none());
        assert_eq!(stream.stats().bytes_skipped, 2);
    }

    #[test]
    fn interrupted_read_retries() {
        let schema = schema();
        let reader = InterruptedThenData {
            state: 0,
            bytes: frame(&schema, 6, 0),
            pos: 0,
        };

        let mut stream = MessageStream::new(reader, Arc::clone(&schema));
        let msg = stream.read().unwrap().unwrap();
        assert_eq!(msg.get("time_boot_ms").unwrap(), Value::UInt(6));
    }

    #[test]
    fn read_error_propagates() {
        let schema = schema();
        let mut stream = MessageStream::new(FailingReader, Arc::clone(&schema));
        let err = stream.read().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
        assert_eq!(stream.buffered(), 0);
    }

    #[test]
    fn write_assigns_wrapping_sequence() {
        let schema = schema();
        let mut stream = MessageStream::new((), Arc::clone(&schema));
        let mut msg = attitude(&schema, 0);

        let mut sequences = Vec::new();
        for _ in 0..257 {
            sequences.push(stream.encode_next(&mut msg)[2]);
        }

        assert_eq!(sequences[0], 0);
        assert_eq!(sequences[255], 255);
        assert_eq!(sequences[256], sequences[0]);
        assert_eq!(stream.next_sequence(), 1);
    }

    #[test]
    fn initial_sequence_from_config() {
        let schema = schema();
        let config = StreamConfig {
            initial_sequence: 250,
            ..StreamConfig::default()
        };
        let mut stream = MessageStream::with_config(Vec::new(), Arc::clone(&schema), config);
        let mut msg = attitude(&schema, 0);

        stream.write(&mut msg).unwrap();
        assert_eq!(msg.sequence(), 250);
        assert_eq!(stream.get_ref()[2], 250);
        assert_eq!(stream.next_sequence(), 251);
    }

    #[test]
    fn write_then_read_back() {
        let schema = schema();
        let mut writer = MessageStream::new(Vec::new(), Arc::clone(&schema));
        let mut heartbeat = Message::by_name(&schema, "HEARTBEAT", 1, 1).unwrap();
        heartbeat.set("type", 6u8).unwrap();
        writer.write(&mut heartbeat).unwrap();
        writer.write(&mut attitude(&schema, 10)).unwrap();
        assert_eq!(writer.stats().messages_written, 2);

        let wire = writer.into_inner();
        let mut reader = MessageStream::new(Cursor::new(wire), Arc::clone(&schema));
        let first = reader.read().unwrap().unwrap();
        let second = reader.read().unwrap().unwrap();

        assert_eq!((first.name(), first.sequence()), ("HEARTBEAT", 0));
        assert_eq!(first.get("type").unwrap(), Value::UInt(6));
        assert_eq!((second.name(), second.sequence()), ("ATTITUDE", 1));
    }

    #[test]
    fn write_zero_is_an_error() {
        let schema = schema();
        let mut stream = MessageStream::new(ZeroWriter, Arc::clone(&schema));
        let err = stream.write(&mut attitude(&schema, 0)).unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::WriteZero));
    }

    #[test]
    fn position_and_seek() {
        let schema = schema();
        let one = frame(&schema, 1, 0);
        let mut wire = one.clone();
        wire.extend(frame(&schema, 2, 1));

        let mut stream = MessageStream::new(Cursor::new(wire), Arc::clone(&schema));
        assert_eq!(stream.position().unwrap(), 0);

        stream.read().unwrap().unwrap();
        assert_eq!(stream.position().unwrap(), one.len() as u64);

        stream.read().unwrap().unwrap();
        stream.seek(one.len() as u64).unwrap();
        assert_eq!(stream.buffered(), 0);
        let again = stream.read().unwrap().unwrap();
        assert_eq!(again.get("time_boot_ms").unwrap(), Value::UInt(2));
    }

    #[test]
    fn seek_closes_open_garbage_run() {
        let schema = schema();
        let mut stream = MessageStream::new(Cursor::new(frame(&schema, 9, 0)), Arc::clone(&schema));

        stream.feed(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert!(stream.read_buffered().unwrap().is_none());
        assert_eq!(stream.resync_run, 3);

        stream.seek(0).unwrap();
        assert_eq!(stream.resync_run, 0);
        assert_eq!(stream.buffered(), 0);
        let msg = stream.read().unwrap().unwrap();
        assert_eq!(msg.get("time_boot_ms").unwrap(), Value::UInt(9));
    }

    #[test]
    fn small_read_chunks() {
        let schema = schema();
        let mut wire = vec![0x13, 0x37];
        wire.extend(frame(&schema, 11, 0));
        wire.extend(frame(&schema, 12, 1));

        let config = StreamConfig {
            read_chunk_size: 3,
            ..StreamConfig::default()
        };
        let mut stream = MessageStream::with_config(Cursor::new(wire), Arc::clone(&schema), config);

        assert_eq!(stream.read().unwrap().unwrap().get_u64("time_boot_ms").unwrap(), 11);
        assert_eq!(stream.read().unwrap().unwrap().get_u64("time_boot_ms").unwrap(), 12);
        assert!(stream.read().unwrap().is_none());
    }

    #[test]
    #[cfg(unix)]
    fn roundtrip_over_socket_pair() {
        let schema = schema();
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = MessageStream::new(left, Arc::clone(&schema));
        let mut reader = MessageStream::new(right, Arc::clone(&schema));

        let sender = std::thread::spawn(move || {
            let schema = Arc::clone(writer.schema());
            for i in 0..16u32 {
                writer.write(&mut attitude(&schema, i)).unwrap();
            }
        });

        for i in 0..16u64 {
            let msg = reader.read().unwrap().unwrap();
            assert_eq!(msg.get_u64("time_boot_ms").unwrap(), i);
            assert_eq!(u64::from(msg.sequence()), i);
        }
        sender.join().unwrap();
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedThenData {
        state: u8,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.state == 0 {
                self.state = 1;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            let remaining = self.bytes.len() - self.pos;
            let n = remaining.min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
