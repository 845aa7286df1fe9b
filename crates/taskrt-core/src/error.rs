//! Error types for the taskrt bootstrap layer

use core::fmt;

/// Result type for runtime bootstrap operations
pub type RtResult<T> = Result<T, RtError>;

/// Errors surfaced by the bootstrap layer
///
/// Precondition violations (using a factory before opening it, closing
/// a factory twice) are programming errors and panic instead of
/// producing a value here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtError {
    /// Allocation failed, or the requested size overflowed
    BadAlloc,

    /// Runtime provider handshake failed
    OpenFailed,
}

impl fmt::Display for RtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RtError::BadAlloc => write!(f, "memory allocation failed"),
            RtError::OpenFailed => write!(f, "runtime provider handshake failed"),
        }
    }
}

impl std::error::Error for RtError {}
