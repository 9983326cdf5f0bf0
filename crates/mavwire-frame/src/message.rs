use std::fmt;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use mavwire_schema::{Field, MessageDefinition, Schema};

use crate::codec::{decode_message, encode_message, FrameHeader, HEADER_SIZE, MIN_FRAME_SIZE};
use crate::error::{FrameError, Result, UnknownReason};
use crate::value::{read_field, write_field, Value};

/// One message instance: header metadata plus a payload laid out per its
/// definition.
///
/// The payload length always equals the definition's payload length.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    definition: Arc<MessageDefinition>,
    payload: Box<[u8]>,
    sequence: u8,
    system_id: u8,
    component_id: u8,
    received_crc: Option<u16>,
}

impl Message {
    /// Create an empty (zero-filled) message by id, for filling and sending.
    pub fn new(schema: &Schema, id: u8, system_id: u8, component_id: u8) -> Result<Self> {
        let definition = schema
            .by_id(id)
            .ok_or(UnknownReason::UnregisteredId(id))?;
        Ok(Self::from_definition(
            Arc::clone(definition),
            system_id,
            component_id,
        ))
    }

    /// Create an empty (zero-filled) message by name, for filling and sending.
    pub fn by_name(schema: &Schema, name: &str, system_id: u8, component_id: u8) -> Result<Self> {
        let definition = schema
            .by_name(name)
            .ok_or_else(|| UnknownReason::UnregisteredName(name.to_string()))?;
        Ok(Self::from_definition(
            Arc::clone(definition),
            system_id,
            component_id,
        ))
    }

    /// Create an empty message from a definition already resolved.
    pub fn from_definition(
        definition: Arc<MessageDefinition>,
        system_id: u8,
        component_id: u8,
    ) -> Self {
        let payload = vec![0u8; definition.payload_len()].into_boxed_slice();
        Self {
            definition,
            payload,
            sequence: 0,
            system_id,
            component_id,
            received_crc: None,
        }
    }

    pub(crate) fn from_wire(
        definition: Arc<MessageDefinition>,
        header: &FrameHeader,
        payload: &[u8],
        received_crc: u16,
    ) -> Self {
        Self {
            definition,
            payload: payload.into(),
            sequence: header.sequence,
            system_id: header.system_id,
            component_id: header.component_id,
            received_crc: Some(received_crc),
        }
    }

    /// Decode the frame at the start of `src`; trailing bytes are ignored.
    pub fn decode(schema: &Schema, src: &[u8]) -> Result<Self> {
        let mut buf = BytesMut::from(src);
        match decode_message(schema, &mut buf)? {
            Some(message) => Ok(message),
            None => {
                let needed = if src.len() < HEADER_SIZE {
                    MIN_FRAME_SIZE
                } else {
                    FrameHeader::parse(src).frame_len()
                };
                Err(FrameError::Incomplete {
                    needed,
                    available: src.len(),
                })
            }
        }
    }

    /// Serialize with the given sequence number, which is kept on the message.
    pub fn encode(&mut self, sequence: u8) -> Bytes {
        self.sequence = sequence;
        let mut dst = BytesMut::with_capacity(MIN_FRAME_SIZE + self.payload.len());
        encode_message(self, &mut dst);
        dst.freeze()
    }

    pub fn definition(&self) -> &Arc<MessageDefinition> {
        &self.definition
    }

    pub fn message_id(&self) -> u8 {
        self.definition.id()
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn sequence(&self) -> u8 {
        self.sequence
    }

    pub fn system_id(&self) -> u8 {
        self.system_id
    }

    pub fn component_id(&self) -> u8 {
        self.component_id
    }

    /// Checksum read off the wire, for decoded messages.
    pub fn received_crc(&self) -> Option<u16> {
        self.received_crc
    }

    /// Raw payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Resolve a field of this message's definition by name.
    pub fn field(&self, name: &str) -> Result<&Field> {
        self.definition
            .field(name)
            .ok_or_else(|| self.unknown_field(name))
    }

    /// Resolve a field of this message's definition by declaration index.
    pub fn field_at(&self, index: usize) -> Result<&Field> {
        self.definition
            .field_at(index)
            .ok_or_else(|| FrameError::FieldIndexOutOfRange {
                message: self.definition.name().to_string(),
                index,
            })
    }

    pub fn get(&self, name: &str) -> Result<Value> {
        Ok(read_field(self.field(name)?, &self.payload))
    }

    pub fn get_at(&self, index: usize) -> Result<Value> {
        Ok(read_field(self.field_at(index)?, &self.payload))
    }

    /// Read a field handed out by this message's definition.
    pub fn get_field(&self, field: &Field) -> Result<Value> {
        self.check_owned(field)?;
        Ok(read_field(field, &self.payload))
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let definition = Arc::clone(&self.definition);
        let field = definition
            .field(name)
            .ok_or_else(|| self.unknown_field(name))?;
        write_field(field, &mut self.payload, &value.into())
    }

    pub fn set_at(&mut self, index: usize, value: impl Into<Value>) -> Result<()> {
        let definition = Arc::clone(&self.definition);
        let field = definition
            .field_at(index)
            .ok_or_else(|| FrameError::FieldIndexOutOfRange {
                message: definition.name().to_string(),
                index,
            })?;
        write_field(field, &mut self.payload, &value.into())
    }

    /// Write a field handed out by this message's definition.
    pub fn set_field(&mut self, field: &Field, value: impl Into<Value>) -> Result<()> {
        self.check_owned(field)?;
        write_field(field, &mut self.payload, &value.into())
    }

    /// Signed integer value of a scalar field.
    pub fn get_i64(&self, name: &str) -> Result<i64> {
        let value = self.get(name)?;
        value.as_i64().ok_or_else(|| self.not_a(name, "int64_t", &value))
    }

    /// Unsigned integer value of a scalar field.
    pub fn get_u64(&self, name: &str) -> Result<u64> {
        let value = self.get(name)?;
        value.as_u64().ok_or_else(|| self.not_a(name, "uint64_t", &value))
    }

    /// Floating value of a numeric scalar field.
    pub fn get_f64(&self, name: &str) -> Result<f64> {
        let value = self.get(name)?;
        value.as_f64().ok_or_else(|| self.not_a(name, "double", &value))
    }

    /// Field values in declaration order.
    pub fn values(&self) -> impl Iterator<Item = (&Field, Value)> + '_ {
        self.definition
            .fields()
            .iter()
            .map(|field| (field, read_field(field, &self.payload)))
    }

    fn check_owned(&self, field: &Field) -> Result<()> {
        match self.definition.field_at(field.index()) {
            Some(own) if own == field => Ok(()),
            _ => Err(self.unknown_field(field.name())),
        }
    }

    fn unknown_field(&self, name: &str) -> FrameError {
        FrameError::UnknownField {
            message: self.definition.name().to_string(),
            field: name.to_string(),
        }
    }

    fn not_a(&self, name: &str, expected: &str, value: &Value) -> FrameError {
        FrameError::TypeMismatch {
            field: name.to_string(),
            expected: expected.to_string(),
            found: value.kind(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (id={} seq={} sys={} comp={}) {{",
            self.name(),
            self.message_id(),
            self.sequence,
            self.system_id,
            self.component_id
        )?;
        for (i, (field, value)) in self.values().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{}: ", field.name())?;
            write_value(f, &value)?;
        }
        f.write_str(" }")
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Int(v) => write!(f, "{v}"),
        Value::UInt(v) => write!(f, "{v}"),
        Value::Float(v) => write!(f, "{v}"),
        Value::Double(v) => write!(f, "{v}"),
        Value::Char(c) => write!(f, "{:?}", char::from(*c)),
        Value::Bytes(_) => write!(f, "{:?}", value.to_text().unwrap_or_default()),
        Value::Array(items) => {
            f.write_str("[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_value(f, item)?;
            }
            f.write_str("]")
        }
    }
}
