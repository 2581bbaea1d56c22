//! Error types for the onset detection and slicing engine

use std::fmt;

/// Errors that can occur during slice analysis
#[derive(Debug, Clone)]
pub enum SliceError {
    /// Audio file could not be opened
    Io(String),

    /// Audio file could not be decoded (invalid or unsupported format)
    Decode(String),

    /// Invalid configuration (bad sizes, unknown method, negative timings)
    InvalidConfig(String),
}

impl fmt::Display for SliceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SliceError::Io(msg) => write!(f, "I/O error: {}", msg),
            SliceError::Decode(msg) => write!(f, "Decode error: {}", msg),
            SliceError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for SliceError {}
