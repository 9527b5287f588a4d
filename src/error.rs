//! Structured errors raised across the bridge boundary
//!
//! Every native failure is captured as an [`Errno`] right next to the call
//! and turned into a [`BridgeError`] tagged with the operation name and the
//! path argument(s). The host gets enough to rebuild a POSIX-style message
//! (see [`crate::Bridge::describe_error_code`]).

use crate::name_codec::HostString;
use fsbridge_sys::SysError;
use nix::errno::Errno;
use std::collections::TryReserveError;
use thiserror::Error;

/// Errors returned by bridge operations
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A POSIX primitive returned its failure sentinel
    ///
    /// For two-path operations `path` is the destination and `other_path` the
    /// source.
    #[error("{op}{}: {} (errno {})", describe_paths(.path.as_ref(), .other_path.as_ref()), .errno.desc(), errno_code(.errno))]
    NativeCall {
        /// Operation name, e.g. `stat` or `readDir`
        op: &'static str,
        /// Primary path argument
        path: Option<HostString>,
        /// Secondary path argument for two-path operations
        other_path: Option<HostString>,
        /// Native error code
        errno: Errno,
    },

    /// A status structure carried file-type bits outside the known kinds
    #[error("{op} '{path}': unrecognized file type bits {mode:#o}")]
    InvalidFileType {
        /// Operation name
        op: &'static str,
        /// Path that was queried
        path: HostString,
        /// Raw `st_mode`
        mode: u32,
    },

    /// An argument was rejected before any native call was made
    #[error("{op}: {message}")]
    Validation {
        /// Operation name
        op: &'static str,
        /// What was wrong with the argument
        message: String,
    },

    /// A variable-length result exceeded the maximum buffer capacity
    #[error("{op}{}: result exceeds {limit} bytes", describe_paths(.path.as_ref(), None))]
    ResultTooLarge {
        /// Operation name
        op: &'static str,
        /// Path argument, if any
        path: Option<HostString>,
        /// Capacity limit in bytes
        limit: usize,
    },

    /// An intermediate buffer or result could not be allocated
    #[error("{op}: out of memory")]
    ResourceExhaustion {
        /// Operation name
        op: &'static str,
        /// Allocation failure
        #[source]
        source: TryReserveError,
    },

    /// Invalid configuration or repeated setup
    #[error("configuration error: {0}")]
    Config(String),
}

impl BridgeError {
    /// Native error code, when the failure came from the OS
    #[must_use]
    pub const fn errno(&self) -> Option<Errno> {
        match self {
            Self::NativeCall { errno, .. } => Some(*errno),
            _ => None,
        }
    }

    /// Operation the error is tagged with, if any
    #[must_use]
    pub const fn op(&self) -> Option<&'static str> {
        match self {
            Self::NativeCall { op, .. }
            | Self::InvalidFileType { op, .. }
            | Self::Validation { op, .. }
            | Self::ResultTooLarge { op, .. }
            | Self::ResourceExhaustion { op, .. } => Some(*op),
            Self::Config(_) => None,
        }
    }
}

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Native failure of a single-path operation
pub(crate) fn path_error(op: &'static str, path: &HostString, errno: Errno) -> BridgeError {
    BridgeError::NativeCall {
        op,
        path: Some(path.clone()),
        other_path: None,
        errno,
    }
}

/// Native failure of a two-path operation
///
/// The destination is reported as the primary path; the source is kept as
/// context.
pub(crate) fn two_path_error(
    op: &'static str,
    destination: &HostString,
    source: &HostString,
    errno: Errno,
) -> BridgeError {
    BridgeError::NativeCall {
        op,
        path: Some(destination.clone()),
        other_path: Some(source.clone()),
        errno,
    }
}

/// Native failure of a descriptor operation (no path)
pub(crate) fn handle_error(op: &'static str, errno: Errno) -> BridgeError {
    BridgeError::NativeCall {
        op,
        path: None,
        other_path: None,
        errno,
    }
}

/// Attach operation context to a primitive-layer error
pub(crate) fn from_sys(op: &'static str, path: Option<&HostString>, err: SysError) -> BridgeError {
    match err {
        SysError::Os(errno) => BridgeError::NativeCall {
            op,
            path: path.cloned(),
            other_path: None,
            errno,
        },
        SysError::TooLarge { limit } => BridgeError::ResultTooLarge {
            op,
            path: path.cloned(),
            limit,
        },
        SysError::Alloc(source) => BridgeError::ResourceExhaustion { op, source },
    }
}

const fn errno_code(errno: &Errno) -> i32 {
    *errno as i32
}

fn describe_paths(path: Option<&HostString>, other_path: Option<&HostString>) -> String {
    match (path, other_path) {
        (Some(path), Some(other)) => format!(" '{path}' (from '{other}')"),
        (Some(path), None) => format!(" '{path}'"),
        (None, Some(other)) => format!(" (from '{other}')"),
        (None, None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_error_message() {
        let err = path_error("stat", &HostString::from("/missing"), Errno::ENOENT);
        assert_eq!(
            err.to_string(),
            "stat '/missing': No such file or directory (errno 2)"
        );
        assert_eq!(err.errno(), Some(Errno::ENOENT));
        assert_eq!(err.op(), Some("stat"));
    }

    #[test]
    fn test_two_path_error_reports_destination_first() {
        let err = two_path_error(
            "symlink",
            &HostString::from("link"),
            &HostString::from("target"),
            Errno::EEXIST,
        );
        match &err {
            BridgeError::NativeCall {
                path, other_path, ..
            } => {
                assert_eq!(path.as_ref(), Some(&HostString::from("link")));
                assert_eq!(other_path.as_ref(), Some(&HostString::from("target")));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().starts_with("symlink 'link' (from 'target'): "));
    }

    #[test]
    fn test_handle_error_has_no_path() {
        let err = handle_error("close", Errno::EBADF);
        let message = err.to_string();
        assert!(message.starts_with("close: "));
        assert!(message.ends_with("(errno 9)"));
    }

    #[test]
    fn test_from_sys_maps_each_variant() {
        let path = HostString::from("p");
        assert!(matches!(
            from_sys("readlink", Some(&path), SysError::Os(Errno::EINVAL)),
            BridgeError::NativeCall { op: "readlink", errno: Errno::EINVAL, .. }
        ));
        assert!(matches!(
            from_sys("ttyname", None, SysError::TooLarge { limit: 64 }),
            BridgeError::ResultTooLarge { op: "ttyname", path: None, limit: 64 }
        ));
        let alloc = Vec::<u8>::new().try_reserve(usize::MAX).unwrap_err();
        assert!(matches!(
            from_sys("readlink", Some(&path), SysError::Alloc(alloc)),
            BridgeError::ResourceExhaustion { op: "readlink", .. }
        ));
    }
}
