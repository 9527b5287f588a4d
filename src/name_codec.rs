//! Byte-faithful conversion between host strings and filesystem names
//!
//! POSIX names are arbitrary byte sequences. The host represents text as
//! 16-bit code units. Names cross the boundary one byte per code unit:
//!
//! - [`encode`]: each byte becomes the code unit with the same value
//!   (Latin-1 style), so bytes `0x80..=0xFF` survive untouched
//! - [`decode`]: each code unit is narrowed to its low 8 bits
//!
//! There is no validation, normalization or case folding. The only input
//! `decode` rejects is one that would produce a NUL byte, because a NUL cannot
//! appear inside a C path.

use crate::error::{BridgeError, Result};
use std::char::REPLACEMENT_CHARACTER;
use std::ffi::{CString, OsStr, OsString};
use std::fmt::{self, Write as _};
use std::os::unix::ffi::{OsStrExt, OsStringExt};

/// A host runtime string: an owned sequence of 16-bit code units
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostString(Vec<u16>);

impl HostString {
    /// Wrap code units received from the host
    #[must_use]
    pub const fn from_units(units: Vec<u16>) -> Self {
        Self(units)
    }

    /// The code units, as the host would receive them
    #[must_use]
    pub fn as_units(&self) -> &[u16] {
        &self.0
    }

    /// Consume into the code units
    #[must_use]
    pub fn into_units(self) -> Vec<u16> {
        self.0
    }

    /// Number of code units
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no code units
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for HostString {
    fn from(text: &str) -> Self {
        Self(text.encode_utf16().collect())
    }
}

impl From<Vec<u16>> for HostString {
    fn from(units: Vec<u16>) -> Self {
        Self(units)
    }
}

impl fmt::Display for HostString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        char::decode_utf16(self.0.iter().copied())
            .map(|c| c.unwrap_or(REPLACEMENT_CHARACTER))
            .try_for_each(|c| f.write_char(c))
    }
}

impl fmt::Debug for HostString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.to_string().escape_debug())
    }
}

/// Convert raw name bytes to a host string, one code unit per byte
#[must_use]
pub fn encode(raw: &[u8]) -> HostString {
    HostString(raw.iter().map(|&b| u16::from(b)).collect())
}

/// Convert an OS string (e.g. a command-line argument) to a host string
#[must_use]
pub fn encode_os(name: &OsStr) -> HostString {
    encode(name.as_bytes())
}

/// Narrow each code unit to its low 8 bits
#[must_use]
#[allow(clippy::cast_possible_truncation)] // truncation to the low byte is the mapping
pub fn decode_bytes(text: &HostString) -> Vec<u8> {
    text.0.iter().map(|&unit| unit as u8).collect()
}

/// Narrow a host string into an OS string
#[must_use]
pub fn decode_os(text: &HostString) -> OsString {
    OsString::from_vec(decode_bytes(text))
}

/// Narrow a host string into a C path for a native call
///
/// # Arguments
///
/// * `text` - Host-supplied path
/// * `op` - Operation name reported if the path is rejected
///
/// # Errors
///
/// Returns [`BridgeError::Validation`] if a code unit narrows to a NUL byte.
pub fn decode(text: &HostString, op: &'static str) -> Result<CString> {
    CString::new(decode_bytes(text)).map_err(|e| BridgeError::Validation {
        op,
        message: format!(
            "path '{}' contains a NUL byte at position {}",
            text,
            e.nul_position()
        ),
    })
}
