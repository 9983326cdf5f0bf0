use mavwire_schema::{DataType, Field};

use crate::error::{FrameError, Result};

/// A field value read from or written to a payload.
///
/// Scalars come back in the widest variant of their category. Character
/// arrays come back as [`Value::Bytes`] holding the full fixed length,
/// trailing zero bytes included; [`Value::to_text`] is the explicit way to
/// read one as a zero-terminated string.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    UInt(u64),
    Float(f32),
    Double(f64),
    Char(u8),
    Array(Vec<Value>),
    Bytes(Vec<u8>),
}

impl Value {
    /// Variant name, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Char(_) => "char",
            Value::Array(_) => "array",
            Value::Bytes(_) => "bytes",
        }
    }

    /// Integer view of an integer or character scalar, if it fits.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int(v) => Some(v),
            Value::UInt(v) => i64::try_from(v).ok(),
            Value::Char(c) => Some(i64::from(c)),
            _ => None,
        }
    }

    /// Unsigned view of an integer or character scalar, if it fits.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::Int(v) => u64::try_from(v).ok(),
            Value::UInt(v) => Some(v),
            Value::Char(c) => Some(u64::from(c)),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Value::Float(v) => Some(v),
            Value::Double(v) => Some(v as f32),
            _ => None,
        }
    }

    /// Floating view of any numeric scalar.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float(v) => Some(f64::from(v)),
            Value::Double(v) => Some(v),
            Value::Int(v) => Some(v as f64),
            Value::UInt(v) => Some(v as f64),
            Value::Char(c) => Some(f64::from(c)),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Read a character value as text, stopping at the first zero byte.
    pub fn to_text(&self) -> Option<String> {
        let bytes = match self {
            Value::Bytes(bytes) => bytes.as_slice(),
            Value::Char(c) => std::slice::from_ref(c),
            _ => return None,
        };
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Some(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }
}

macro_rules! value_from {
    ($variant:ident: $($ty:ty),+) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v.into())
            }
        })+
    };
}

value_from!(Int: i8, i16, i32, i64);
value_from!(UInt: u8, u16, u32, u64);
value_from!(Float: f32);
value_from!(Double: f64);

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Value::Bytes(bytes.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Value {
    fn from(bytes: &[u8; N]) -> Self {
        Value::Bytes(bytes.to_vec())
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Bytes(text.as_bytes().to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(items: [T; N]) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

/// Read a whole field (scalar or array) from a payload.
pub(crate) fn read_field(field: &Field, payload: &[u8]) -> Value {
    let ty = field.data_type();
    let width = ty.width();
    let bytes = &payload[field.offset()..field.offset() + field.size()];

    if !field.is_array() {
        return read_element(ty, bytes);
    }
    if ty == DataType::Char {
        return Value::Bytes(bytes.to_vec());
    }
    Value::Array(
        bytes
            .chunks_exact(width)
            .map(|chunk| read_element(ty, chunk))
            .collect(),
    )
}

/// Write a whole field (scalar or array) into a payload.
///
/// Byte strings may be shorter than a one-byte-wide array and are zero
/// padded; element arrays must match the array length exactly.
pub(crate) fn write_field(field: &Field, payload: &mut [u8], value: &Value) -> Result<()> {
    let ty = field.data_type();
    let width = ty.width();
    let dst = &mut payload[field.offset()..field.offset() + field.size()];

    if !field.is_array() {
        return write_element(ty, dst, value).ok_or_else(|| mismatch(field, value));
    }

    match value {
        Value::Bytes(bytes) if width == 1 && bytes.len() <= dst.len() => {
            dst[..bytes.len()].copy_from_slice(bytes);
            dst[bytes.len()..].fill(0);
            Ok(())
        }
        Value::Array(items) if items.len() == field.array_len() => {
            // Validate every element before touching the payload.
            let mut staged = vec![0u8; dst.len()];
            for (item, chunk) in items.iter().zip(staged.chunks_exact_mut(width)) {
                write_element(ty, chunk, item).ok_or_else(|| mismatch(field, item))?;
            }
            dst.copy_from_slice(&staged);
            Ok(())
        }
        _ => Err(mismatch(field, value)),
    }
}

fn mismatch(field: &Field, value: &Value) -> FrameError {
    let expected = if field.is_array() {
        format!("{}[{}]", field.data_type(), field.array_len())
    } else {
        field.data_type().to_string()
    };
    FrameError::TypeMismatch {
        field: field.name().to_string(),
        expected,
        found: value.kind(),
    }
}

fn read_element(ty: DataType, b: &[u8]) -> Value {
    match ty {
        DataType::Float => Value::Float(f32::from_le_bytes(le4(b))),
        DataType::Double => Value::Double(f64::from_le_bytes(le8(b))),
        DataType::Char => Value::Char(b[0]),
        _ => {
            let width = ty.width();
            let mut raw = [0u8; 8];
            raw[..width].copy_from_slice(&b[..width]);
            let bits = u64::from_le_bytes(raw);
            if ty.is_signed() {
                // Sign-extend from the field width.
                let shift = 64 - 8 * width as u32;
                Value::Int(((bits << shift) as i64) >> shift)
            } else {
                Value::UInt(bits)
            }
        }
    }
}

/// Store one element; `None` when the value has no representation in `ty`.
///
/// Integers narrow by truncation and floats assigned to integer fields
/// truncate toward zero, matching a C cast.
fn write_element(ty: DataType, dst: &mut [u8], value: &Value) -> Option<()> {
    match ty {
        DataType::Float => dst.copy_from_slice(&(value.as_f64()? as f32).to_le_bytes()),
        DataType::Double => dst.copy_from_slice(&value.as_f64()?.to_le_bytes()),
        DataType::Char => dst[0] = integer_bits(value, false)? as u8,
        _ => {
            let bits = integer_bits(value, true)?;
            dst.copy_from_slice(&bits.to_le_bytes()[..ty.width()]);
        }
    }
    Some(())
}

/// Two's-complement bits of a scalar, for narrowing into an integer field.
fn integer_bits(value: &Value, allow_float: bool) -> Option<u64> {
    match *value {
        Value::Int(v) => Some(v as u64),
        Value::UInt(v) => Some(v),
        Value::Char(c) => Some(u64::from(c)),
        Value::Float(v) if allow_float => Some(v as i64 as u64),
        Value::Double(v) if allow_float => Some(v as i64 as u64),
        _ => None,
    }
}

fn le4(b: &[u8]) -> [u8; 4] {
    [b[0], b[1], b[2], b[3]]
}

fn le8(b: &[u8]) -> [u8; 8] {
    [b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]
}
