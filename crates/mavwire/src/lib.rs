//! Binary telemetry/command protocol codec.
//!
//! mavwire frames, checksums, encodes and decodes fixed-schema messages
//! exchanged over an unreliable byte stream, and resynchronizes on corrupt
//! or foreign data without losing the valid messages that follow.
//!
//! # Crate Structure
//!
//! - [`schema`] — Message definitions, layout fingerprints, CRC engine, dialect loading
//! - [`frame`] — Typed messages, wire encode/decode, resynchronizing stream

/// Re-export schema types.
pub mod schema {
    pub use mavwire_schema::*;
}

/// Re-export frame types.
pub mod frame {
    pub use mavwire_frame::*;
}

pub use mavwire_frame::{FrameError, Message, MessageStream, StreamConfig, Value};
pub use mavwire_schema::{DataType, MessageDefinition, Schema, SchemaError};
