//! Error types for the native primitive layer

use nix::errno::Errno;
use std::collections::TryReserveError;
use thiserror::Error;

/// Errors produced by the native primitives
///
/// These carry no operation name or path; the caller owns that context.
#[derive(Debug, Error)]
pub enum SysError {
    /// The native call returned its failure sentinel
    #[error("{0}")]
    Os(#[from] Errno),

    /// A variable-length result did not fit in the maximum buffer capacity
    #[error("result does not fit in {limit} bytes")]
    TooLarge {
        /// Maximum capacity that was tried
        limit: usize,
    },

    /// An intermediate buffer could not be allocated
    #[error("buffer allocation failed: {0}")]
    Alloc(#[from] TryReserveError),
}

impl SysError {
    /// The native error code, if this error came from the OS
    #[must_use]
    pub const fn errno(&self) -> Option<Errno> {
        match self {
            Self::Os(errno) => Some(*errno),
            _ => None,
        }
    }
}

/// Result type for native primitives
pub type Result<T> = std::result::Result<T, SysError>;
