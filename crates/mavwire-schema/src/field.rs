use crate::error::Result;
use crate::types::{parse_type_spec, DataType};

/// A field as declared by a dialect, before layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub data_type: DataType,
    /// Number of elements; 1 for scalars.
    pub array_len: usize,
}

impl FieldSpec {
    /// Declare a scalar field.
    pub fn scalar(data_type: DataType, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type,
            array_len: 1,
        }
    }

    /// Declare a fixed-length array field.
    pub fn array(data_type: DataType, name: impl Into<String>, array_len: usize) -> Self {
        Self {
            name: name.into(),
            data_type,
            array_len,
        }
    }

    /// Declare a field from a type spec such as `uint16_t[4]`.
    pub fn parse(type_spec: &str, name: impl Into<String>) -> Result<Self> {
        let (data_type, array_len) = parse_type_spec(type_spec)?;
        Ok(Self::array(data_type, name, array_len))
    }
}

/// A laid-out field of a message definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    data_type: DataType,
    index: usize,
    array_len: usize,
    offset: usize,
}

impl Field {
    pub(crate) fn new(spec: FieldSpec, index: usize, offset: usize) -> Self {
        Self {
            name: spec.name,
            data_type: spec.data_type,
            index,
            array_len: spec.array_len,
            offset,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Position in declaration order.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn array_len(&self) -> usize {
        self.array_len
    }

    pub fn is_array(&self) -> bool {
        self.array_len > 1
    }

    /// Byte offset within the payload.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Total size in bytes (element width times array length).
    pub fn size(&self) -> usize {
        self.data_type.width() * self.array_len
    }
}
