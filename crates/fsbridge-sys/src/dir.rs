//! Directory streams over `opendir(3)`/`readdir(3)`
//!
//! [`DirStream`] owns the open directory and closes it on drop, so every exit
//! path releases the handle, including an early return while the caller is
//! still converting names. Its iterator skips `.` and `..`.
//!
//! # Limitation
//!
//! `readdir` signals both end-of-stream and failure by returning nothing.
//! The iterator does not distinguish the two: an error part-way through is
//! logged and ends the iteration as if the directory were exhausted.

use nix::dir::{Dir, Entry, Iter};
use nix::fcntl::OFlag;
use nix::sys::stat::Mode;
use std::ffi::CStr;

/// An open directory
#[derive(Debug)]
pub struct DirStream {
    dir: Dir,
}

impl DirStream {
    /// Open a directory for enumeration
    ///
    /// # Errors
    ///
    /// Returns the `errno` from opening the directory (`ENOENT`, `ENOTDIR`,
    /// `EACCES`, ...).
    pub fn open(path: &CStr) -> nix::Result<Self> {
        let dir = Dir::open(
            path,
            OFlag::O_RDONLY | OFlag::O_DIRECTORY | OFlag::O_CLOEXEC,
            Mode::empty(),
        )?;
        Ok(Self { dir })
    }

    /// Iterate over the entries in OS order, skipping `.` and `..`
    pub fn entries(&mut self) -> Entries<'_> {
        Entries {
            inner: self.dir.iter(),
            done: false,
        }
    }
}

/// Iterator returned by [`DirStream::entries`]
pub struct Entries<'d> {
    inner: Iter<'d>,
    done: bool,
}

impl Iterator for Entries<'_> {
    type Item = RawEntry;

    fn next(&mut self) -> Option<RawEntry> {
        while !self.done {
            match self.inner.next() {
                Some(Ok(entry)) => {
                    if is_self_or_parent(entry.file_name().to_bytes()) {
                        continue;
                    }
                    return Some(RawEntry(entry));
                }
                Some(Err(errno)) => {
                    log::debug!("readdir failed, treating as end of directory: {}", errno);
                    self.done = true;
                }
                None => self.done = true,
            }
        }
        None
    }
}

impl std::iter::FusedIterator for Entries<'_> {}

/// One directory entry other than `.` or `..`
#[derive(Clone, Copy, Debug)]
pub struct RawEntry(Entry);

impl RawEntry {
    /// Entry name as raw bytes, without the terminator
    #[must_use]
    pub fn name(&self) -> &[u8] {
        self.0.file_name().to_bytes()
    }

    /// Inode number reported by the directory
    #[must_use]
    pub fn ino(&self) -> u64 {
        self.0.ino()
    }
}

fn is_self_or_parent(name: &[u8]) -> bool {
    name == b"." || name == b".."
}
