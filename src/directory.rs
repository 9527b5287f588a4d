//! Directory enumeration as `(name, inode)` pairs
//!
//! Every listing reopens the directory; the result is a finite, fully
//! materialized sequence in OS order (not sorted). `.` and `..` never appear.
//!
//! A read error part-way through the directory is indistinguishable from the
//! end of the directory and yields a shorter listing rather than an error.
//! This is a known limitation kept for compatibility with existing callers.

use crate::error::{path_error, BridgeError, Result};
use crate::name_codec::{self, HostString};
use fsbridge_sys::DirStream;
use tracing::debug;

/// Operation name reported for listing failures
const OP: &str = "readDir";

/// One directory entry other than `.` and `..`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirEntry {
    /// Entry name, one code unit per raw byte
    pub name: HostString,
    /// Inode number reported by the directory
    pub ino: u64,
}

/// List a directory
///
/// The directory is closed when this returns, on success or failure.
///
/// # Errors
///
/// This function will return an error if:
/// - The path contains a NUL byte
/// - The directory cannot be opened (op `readDir`)
/// - The result cannot be allocated
pub(crate) fn list_directory(path: &HostString) -> Result<Vec<DirEntry>> {
    let cpath = name_codec::decode(path, OP)?;
    let mut stream = DirStream::open(&cpath).map_err(|errno| path_error(OP, path, errno))?;

    let mut entries = Vec::new();
    for raw in stream.entries() {
        entries
            .try_reserve(1)
            .map_err(|source| BridgeError::ResourceExhaustion { op: OP, source })?;
        entries.push(DirEntry {
            name: name_codec::encode(raw.name()),
            ino: raw.ino(),
        });
    }

    debug!("listed {} entries in {}", entries.len(), path);
    Ok(entries)
}
