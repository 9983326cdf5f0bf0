use std::collections::HashMap;

use crate::crc;
use crate::error::{Result, SchemaError};
use crate::field::{Field, FieldSpec};
use crate::types::DataType;

/// Largest payload the one-byte length header can describe.
pub const MAX_PAYLOAD_LEN: usize = 255;

/// Fixed layout of one message type.
///
/// Immutable once built. The extra CRC is derived from the name and the
/// field layout and is folded into every frame checksum, so two ends only
/// agree on a frame when they agree on its layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDefinition {
    id: u8,
    name: String,
    fields: Vec<Field>,
    fields_by_name: HashMap<String, usize>,
    payload_len: usize,
    extra_crc: u8,
}

impl MessageDefinition {
    /// Lay out `fields` in declaration order and derive the fingerprint.
    pub fn new(id: u8, name: impl Into<String>, fields: Vec<FieldSpec>) -> Result<Self> {
        let name = name.into();
        let mut laid_out = Vec::with_capacity(fields.len());
        let mut fields_by_name = HashMap::with_capacity(fields.len());
        let mut offset = 0usize;

        for (index, spec) in fields.into_iter().enumerate() {
            if spec.array_len == 0 {
                return Err(SchemaError::InvalidArrayLength(format!(
                    "{}.{}[0]",
                    name, spec.name
                )));
            }
            if fields_by_name.insert(spec.name.clone(), index).is_some() {
                return Err(SchemaError::DuplicateField {
                    message: name,
                    field: spec.name,
                });
            }
            let field = Field::new(spec, index, offset);
            offset += field.size();
            laid_out.push(field);
        }

        if offset > MAX_PAYLOAD_LEN {
            return Err(SchemaError::PayloadTooLarge {
                message: name,
                size: offset,
            });
        }

        let extra_crc = extra_crc(&name, &laid_out);
        Ok(Self {
            id,
            name,
            fields: laid_out,
            fields_by_name,
            payload_len: offset,
            extra_crc,
        })
    }

    /// Start a definition built field by field.
    pub fn builder(id: u8, name: impl Into<String>) -> DefinitionBuilder {
        DefinitionBuilder {
            id,
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields_by_name.get(name).map(|&index| &self.fields[index])
    }

    pub fn field_at(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Payload length in bytes.
    pub fn payload_len(&self) -> usize {
        self.payload_len
    }

    pub fn extra_crc(&self) -> u8 {
        self.extra_crc
    }
}

/// Incremental constructor for [`MessageDefinition`].
#[derive(Debug, Clone)]
pub struct DefinitionBuilder {
    id: u8,
    name: String,
    fields: Vec<FieldSpec>,
}

impl DefinitionBuilder {
    pub fn field(mut self, data_type: DataType, name: impl Into<String>) -> Self {
        self.fields.push(FieldSpec::scalar(data_type, name));
        self
    }

    pub fn array(mut self, data_type: DataType, name: impl Into<String>, len: usize) -> Self {
        self.fields.push(FieldSpec::array(data_type, name, len));
        self
    }

    pub fn build(self) -> Result<MessageDefinition> {
        MessageDefinition::new(self.id, self.name, self.fields)
    }
}

/// One-byte layout fingerprint of a message.
///
/// Hashes `"<name> "` followed by `"<c type> <field name> "` for each field,
/// widest element type first. The sort is stable, so fields of equal width
/// keep their declaration order. Array lengths are not part of the input.
fn extra_crc(name: &str, fields: &[Field]) -> u8 {
    let mut sorted: Vec<&Field> = fields.iter().collect();
    sorted.sort_by(|a, b| b.data_type().width().cmp(&a.data_type().width()));

    let mut text = String::with_capacity(name.len() + 1 + fields.len() * 16);
    text.push_str(name);
    text.push(' ');
    for field in sorted {
        text.push_str(field.data_type().c_name());
        text.push(' ');
        text.push_str(field.name());
        text.push(' ');
    }

    let raw = crc::compute(&latin1_bytes(&text));
    ((raw & 0x00FF) ^ (raw >> 8)) as u8
}

/// Single-byte encoding; characters outside Latin-1 become `?`.
fn latin1_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heartbeat() -> MessageDefinition {
        MessageDefinition::builder(0, "HEARTBEAT")
            .field(DataType::UInt32, "custom_mode")
            .field(DataType::UInt8, "type")
            .field(DataType::UInt8, "autopilot")
            .field(DataType::UInt8, "base_mode")
            .field(DataType::UInt8, "system_status")
            .field(DataType::UInt8, "mavlink_version")
            .build()
            .unwrap()
    }

    #[test]
    fn heartbeat_matches_published_extra_crc() {
        let def = heartbeat();
        assert_eq!(def.payload_len(), 9);
        assert_eq!(def.extra_crc(), 50);
    }

    #[test]
    fn attitude_matches_published_extra_crc() {
        let def = MessageDefinition::builder(30, "ATTITUDE")
            .field(DataType::UInt32, "time_boot_ms")
            .field(DataType::Float, "roll")
            .field(DataType::Float, "pitch")
            .field(DataType::Float, "yaw")
            .field(DataType::Float, "rollspeed")
            .field(DataType::Float, "pitchspeed")
            .field(DataType::Float, "yawspeed")
            .build()
            .unwrap();
        assert_eq!(def.payload_len(), 28);
        assert_eq!(def.extra_crc(), 39);
    }

    #[test]
    fn extra_crc_sorts_widest_first() {
        // Declaring the narrow fields first must not change the fingerprint.
        let reordered = MessageDefinition::builder(0, "HEARTBEAT")
            .field(DataType::UInt8, "type")
            .field(DataType::UInt8, "autopilot")
            .field(DataType::UInt8, "base_mode")
            .field(DataType::UInt32, "custom_mode")
            .field(DataType::UInt8, "system_status")
            .field(DataType::UInt8, "mavlink_version")
            .build()
            .unwrap();
        assert_eq!(reordered.extra_crc(), heartbeat().extra_crc());
        assert_ne!(reordered.field("custom_mode").unwrap().offset(), 0);
    }

    #[test]
    fn extra_crc_is_deterministic() {
        assert_eq!(heartbeat().extra_crc(), heartbeat().extra_crc());
        assert_eq!(heartbeat(), heartbeat());
    }

    #[test]
    fn extra_crc_tracks_layout_changes() {
        let base = heartbeat().extra_crc();

        let renamed = MessageDefinition::builder(0, "HEARTBEAT")
            .field(DataType::UInt32, "custom_mode")
            .field(DataType::UInt8, "kind")
            .field(DataType::UInt8, "autopilot")
            .field(DataType::UInt8, "base_mode")
            .field(DataType::UInt8, "system_status")
            .field(DataType::UInt8, "mavlink_version")
            .build()
            .unwrap();
        assert_ne!(renamed.extra_crc(), base);

        let retyped = MessageDefinition::builder(0, "HEARTBEAT")
            .field(DataType::Int32, "custom_mode")
            .field(DataType::UInt8, "type")
            .field(DataType::UInt8, "autopilot")
            .field(DataType::UInt8, "base_mode")
            .field(DataType::UInt8, "system_status")
            .field(DataType::UInt8, "mavlink_version")
            .build()
            .unwrap();
        assert_ne!(retyped.extra_crc(), base);

        let swapped = MessageDefinition::builder(0, "HEARTBEAT")
            .field(DataType::UInt32, "custom_mode")
            .field(DataType::UInt8, "autopilot")
            .field(DataType::UInt8, "type")
            .field(DataType::UInt8, "base_mode")
            .field(DataType::UInt8, "system_status")
            .field(DataType::UInt8, "mavlink_version")
            .build()
            .unwrap();
        assert_ne!(swapped.extra_crc(), base);
    }

    #[test]
    fn offsets_are_contiguous_in_declaration_order() {
        let def = MessageDefinition::builder(70, "RC_OVERRIDE")
            .field(DataType::UInt8, "target_system")
            .array(DataType::UInt16, "chan", 4)
            .field(DataType::Double, "stamp")
            .build()
            .unwrap();

        let offsets: Vec<usize> = def.fields().iter().map(|f| f.offset()).collect();
        assert_eq!(offsets, vec![0, 1, 9]);
        assert_eq!(def.payload_len(), 17);
        assert_eq!(def.field_at(1).unwrap().name(), "chan");
        assert!(def.field("missing").is_none());
    }

    #[test]
    fn duplicate_field_rejected() {
        let err = MessageDefinition::builder(1, "DUP")
            .field(DataType::UInt8, "a")
            .field(DataType::UInt16, "a")
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField { field, .. } if field == "a"));
    }

    #[test]
    fn oversized_payload_rejected() {
        let err = MessageDefinition::builder(2, "BIG")
            .array(DataType::UInt64, "blob", 32)
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::PayloadTooLarge { size: 256, .. }));
    }

    #[test]
    fn zero_length_array_rejected() {
        let err = MessageDefinition::builder(3, "EMPTY")
            .array(DataType::Char, "text", 0)
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidArrayLength(_)));
    }
}
