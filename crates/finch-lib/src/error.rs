//! Unified error type for the finch-lib crate.
//!
//! [`FinchError`] covers the connection taxonomy (not found, connection,
//! not open, timeout, bad argument) and wraps [`TransportError`] for failures
//! of the underlying HID layer. `From` impls allow `?` to propagate across
//! module boundaries.

use std::fmt;
use std::time::Duration;

use crate::transport::TransportError;

/// Unified error type for finch-lib operations.
#[derive(Debug)]
pub enum FinchError {
    /// Enumeration returned no unclaimed robot. `in_use` counts paths
    /// already held by live connections.
    DeviceNotFound { in_use: usize },
    /// Transport open/write/close failure on a specific connection.
    Connection(String),
    /// Operation attempted on a closed connection.
    NotOpen,
    /// No reply with the expected command id arrived before the deadline.
    ProtocolTimeout { command_id: u8, waited: Duration },
    /// Malformed high-level operation arguments.
    InvalidArgument(String),
    /// HID layer failure outside an open connection (e.g. enumeration).
    Transport(TransportError),
    /// Configuration validation error.
    Config(String),
    /// Standard I/O error (config persistence).
    Io(std::io::Error),
}

impl fmt::Display for FinchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinchError::DeviceNotFound { in_use } => {
                write!(f, "Finch not found on USB ({in_use} in use)")
            }
            FinchError::Connection(e) => write!(f, "Connection error: {e}"),
            FinchError::NotOpen => write!(f, "Connection to Finch is closed"),
            FinchError::ProtocolTimeout { command_id, waited } => write!(
                f,
                "No reply for command id {command_id} within {}ms",
                waited.as_millis()
            ),
            FinchError::InvalidArgument(e) => write!(f, "Invalid argument: {e}"),
            FinchError::Transport(e) => write!(f, "{e}"),
            FinchError::Config(e) => write!(f, "Config error: {e}"),
            FinchError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for FinchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FinchError::Transport(e) => Some(e),
            FinchError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for FinchError {
    fn from(e: TransportError) -> Self {
        FinchError::Transport(e)
    }
}

impl From<std::io::Error> for FinchError {
    fn from(e: std::io::Error) -> Self {
        FinchError::Io(e)
    }
}

/// Crate-level Result alias using [`FinchError`].
pub type Result<T> = std::result::Result<T, FinchError>;
