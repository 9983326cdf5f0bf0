/// Why a well-framed message was rejected.
///
/// All reasons are handled alike by the stream resync loop; they are kept
/// apart for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnknownReason {
    /// No definition is registered for the id in the header.
    #[error("unregistered message id {0}")]
    UnregisteredId(u8),

    /// No definition is registered under the requested name.
    #[error("unregistered message name {0:?}")]
    UnregisteredName(String),

    /// The declared payload length disagrees with the registered layout.
    #[error("message {id} declares {declared} payload bytes, dialect expects {expected}")]
    LengthMismatch {
        id: u8,
        declared: usize,
        expected: usize,
    },

    /// The frame checksum does not match the recomputed one.
    #[error("checksum mismatch on message {id} (wire 0x{received:04X}, computed 0x{computed:04X})")]
    ChecksumMismatch { id: u8, received: u16, computed: u16 },
}

/// Errors that can occur while building, encoding or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The byte at the read position is not a start sign.
    #[error("invalid start sign 0x{found:02X} (expected 0xFE)")]
    Protocol { found: u8 },

    /// The frame looked valid but could not be accepted.
    #[error("unknown message: {0}")]
    UnknownMessage(#[from] UnknownReason),

    /// The input ended before a complete frame.
    #[error("incomplete frame ({available} of {needed} bytes)")]
    Incomplete { needed: usize, available: usize },

    /// The message definition has no field with this name.
    #[error("message {message} has no field {field:?}")]
    UnknownField { message: String, field: String },

    /// The message definition has no field at this index.
    #[error("message {message} has no field at index {index}")]
    FieldIndexOutOfRange { message: String, index: usize },

    /// The value cannot be stored in the field's representation.
    #[error("cannot assign {found} to field {field} ({expected})")]
    TypeMismatch {
        field: String,
        expected: String,
        found: &'static str,
    },

    /// An I/O error occurred on the byte source or sink.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
