//! Shared error types across framerpc crates.

use thiserror::Error;

/// Stable error codes (used in wrapped wire errors and metrics labels).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed or short positional data.
    Decode,
    /// Application handler failed.
    Handler,
    /// No handler registered for the method.
    MethodNotFound,
    /// Reply could not be written.
    Transmission,
    /// Unrecognized call-kind discriminant.
    UnknownKind,
    /// Framing or envelope violation.
    Protocol,
    /// Frame exceeds the configured limit.
    FrameTooLarge,
    /// Invalid configuration.
    Config,
    /// Unsupported config/protocol version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ErrorCode {
    /// String representation used on the wire and in metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Decode => "DECODE",
            ErrorCode::Handler => "HANDLER",
            ErrorCode::MethodNotFound => "METHOD_NOT_FOUND",
            ErrorCode::Transmission => "TRANSMISSION",
            ErrorCode::UnknownKind => "UNKNOWN_KIND",
            ErrorCode::Protocol => "PROTOCOL",
            ErrorCode::FrameTooLarge => "FRAME_TOO_LARGE",
            ErrorCode::Config => "CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Failure while decoding one positional field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The envelope has no positional fields left.
    #[error("too few fields in message")]
    TooFewFields,
    /// The message is not a msgpack array.
    #[error("message is not an array")]
    NotArray,
    /// The bytes are not valid msgpack.
    #[error("malformed msgpack: {0}")]
    Malformed(String),
    /// A header field has the wrong type.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },
    /// The argument does not match the handler's expected shape.
    #[error("argument shape mismatch: {0}")]
    Shape(String),
}

/// Failure reported by (or on behalf of) an application handler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(String),
    #[error("method not found: {0}")]
    MethodNotFound(String),
    #[error("handler panicked")]
    Panicked,
}

impl HandlerError {
    /// Convenience constructor for application failures.
    pub fn failed(msg: impl Into<String>) -> Self {
        HandlerError::Failed(msg.into())
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, RpcError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Handler(#[from] HandlerError),
    #[error("transmission failed: {0}")]
    Transmission(std::io::Error),
    #[error("unknown message kind: {0}")]
    UnknownKind(i64),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("frame too large: {len} > {max}")]
    FrameTooLarge { len: u64, max: usize },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("config: {0}")]
    Config(String),
    #[error("unsupported version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl RpcError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            RpcError::Decode(_) => ErrorCode::Decode,
            RpcError::Handler(HandlerError::MethodNotFound(_)) => ErrorCode::MethodNotFound,
            RpcError::Handler(_) => ErrorCode::Handler,
            RpcError::Transmission(_) => ErrorCode::Transmission,
            RpcError::UnknownKind(_) => ErrorCode::UnknownKind,
            RpcError::Protocol(_) => ErrorCode::Protocol,
            RpcError::FrameTooLarge { .. } => ErrorCode::FrameTooLarge,
            RpcError::Io(_) => ErrorCode::Protocol,
            RpcError::Config(_) => ErrorCode::Config,
            RpcError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            RpcError::Internal(_) => ErrorCode::Internal,
        }
    }
}
