use std::fmt;
use std::str::FromStr;

use crate::error::SchemaError;

/// Wire data type of a field element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    Char,
}

impl DataType {
    /// Every variant, in declaration order.
    pub const ALL: [DataType; 11] = [
        DataType::Int8,
        DataType::UInt8,
        DataType::Int16,
        DataType::UInt16,
        DataType::Int32,
        DataType::UInt32,
        DataType::Int64,
        DataType::UInt64,
        DataType::Float,
        DataType::Double,
        DataType::Char,
    ];

    /// Size of one element on the wire, in bytes.
    pub const fn width(self) -> usize {
        match self {
            DataType::Int8 | DataType::UInt8 | DataType::Char => 1,
            DataType::Int16 | DataType::UInt16 => 2,
            DataType::Int32 | DataType::UInt32 | DataType::Float => 4,
            DataType::Int64 | DataType::UInt64 | DataType::Double => 8,
        }
    }

    /// Canonical C type name, as folded into the extra CRC.
    pub const fn c_name(self) -> &'static str {
        match self {
            DataType::Int8 => "int8_t",
            DataType::UInt8 => "uint8_t",
            DataType::Int16 => "int16_t",
            DataType::UInt16 => "uint16_t",
            DataType::Int32 => "int32_t",
            DataType::UInt32 => "uint32_t",
            DataType::Int64 => "int64_t",
            DataType::UInt64 => "uint64_t",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::Char => "char",
        }
    }

    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
        )
    }

    pub const fn is_float(self) -> bool {
        matches!(self, DataType::Float | DataType::Double)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.c_name())
    }
}

impl FromStr for DataType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The version byte of HEARTBEAT is declared with a marker suffix.
        if s == "uint8_t_mavlink_version" {
            return Ok(DataType::UInt8);
        }
        DataType::ALL
            .iter()
            .copied()
            .find(|ty| ty.c_name() == s)
            .ok_or_else(|| SchemaError::UnknownType(s.to_string()))
    }
}

/// Parse a field type declaration such as `uint16_t` or `char[16]`.
///
/// Returns the element type and the array length (1 for scalars).
pub fn parse_type_spec(spec: &str) -> Result<(DataType, usize), SchemaError> {
    let spec = spec.trim();
    let Some(open) = spec.find('[') else {
        return Ok((spec.parse()?, 1));
    };

    let inner = spec[open + 1..]
        .strip_suffix(']')
        .ok_or_else(|| SchemaError::InvalidArrayLength(spec.to_string()))?;
    let len: usize = inner
        .trim()
        .parse()
        .map_err(|_| SchemaError::InvalidArrayLength(spec.to_string()))?;
    if len == 0 {
        return Err(SchemaError::InvalidArrayLength(spec.to_string()));
    }

    Ok((spec[..open].trim_end().parse()?, len))
}
