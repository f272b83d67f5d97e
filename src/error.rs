//! Error types for respkv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for respkv operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    /// Malformed wire data. `offset` counts bytes from where the decoder
    /// started reading to the start of the offending construct.
    #[error("Protocol error at byte {offset}: {message}")]
    Protocol { offset: u64, message: String },

    // -------------------------------------------------------------------------
    // Append-only Log Errors
    // -------------------------------------------------------------------------
    #[error("AOF corruption detected: {0}")]
    AofCorruption(String),

    #[error("AOF write failed: {0}")]
    AofWrite(String),

    // -------------------------------------------------------------------------
    // Command Errors
    // -------------------------------------------------------------------------
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("wrong number of arguments for '{0}' command")]
    WrongArgCount(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KvError {
    pub(crate) fn protocol(offset: u64, message: impl Into<String>) -> Self {
        KvError::Protocol {
            offset,
            message: message.into(),
        }
    }

    /// True when the error means "the peer went away" rather than a fault.
    pub fn is_disconnect(&self) -> bool {
        match self {
            KvError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}
