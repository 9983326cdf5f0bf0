//! Message schema model for the mavwire codec.
//!
//! A [`Schema`] maps one-byte message ids and names to immutable
//! [`MessageDefinition`]s. Each definition fixes the byte layout of its
//! payload and carries a one-byte "extra CRC" fingerprint of that layout,
//! which both ends fold into every frame checksum so that dialect
//! mismatches surface as checksum failures instead of garbage values.
//!
//! The [`crc`] module holds the CRC-16/MCRF4XX engine shared with the
//! frame layer.

pub mod config;
pub mod crc;
pub mod definition;
pub mod dialect;
pub mod error;
pub mod field;
pub mod registry;
pub mod types;

pub use config::LoaderConfig;
pub use definition::{DefinitionBuilder, MessageDefinition, MAX_PAYLOAD_LEN};
pub use error::{Result, SchemaError};
pub use field::{Field, FieldSpec};
pub use registry::Schema;
pub use types::{parse_type_spec, DataType};
