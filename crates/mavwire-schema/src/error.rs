use std::path::PathBuf;

/// Errors that can occur while building or loading a schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A dialect file could not be loaded.
    #[error("failed to load dialect: {0}")]
    LoadFailed(String),

    /// The dialect document is not valid JSON or has the wrong shape.
    #[error("dialect is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A field type name is not one of the canonical type names.
    #[error("unknown field type: {0}")]
    UnknownType(String),

    /// A field declares an array length of zero or one that does not parse.
    #[error("invalid array length in field type: {0}")]
    InvalidArrayLength(String),

    /// Two fields of one message share a name.
    #[error("duplicate field {field} in message {message}")]
    DuplicateField { message: String, field: String },

    /// The summed field sizes do not fit in the one-byte length header.
    #[error("payload of message {message} is {size} bytes (max 255)")]
    PayloadTooLarge { message: String, size: usize },

    /// A message id does not fit in one byte.
    #[error("message id {id} of {message} is out of range (0-255)")]
    IdOutOfRange { message: String, id: u32 },

    /// A dialect includes itself, directly or transitively.
    #[error("include cycle through {0}")]
    IncludeCycle(PathBuf),

    /// Includes are nested deeper than the configured limit.
    #[error("include depth exceeds configured max ({0})")]
    IncludeTooDeep(usize),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
