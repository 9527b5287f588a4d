//! Raw descriptor operations: open, close, chunked read/write, terminal name

use super::Bridge;
use crate::error::{from_sys, handle_error, path_error, BridgeError, Result};
use crate::name_codec::{self, HostString};
use fsbridge_sys::{io, syscall, varbuf};
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::stat::Mode;
use std::ops::Range;
use std::os::unix::io::{AsRawFd, RawFd};
use tracing::debug;

/// An open descriptor owned by the caller
///
/// Obtained from [`Bridge::open_for_read`] or [`Bridge::open_for_write`] and
/// released with [`Bridge::close_handle`]. Dropping a handle does not close
/// it. Using a closed or foreign handle surfaces as whatever the OS reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(RawFd);

impl NativeHandle {
    /// Wrap a raw descriptor received from the host
    #[must_use]
    pub const fn from_raw(fd: RawFd) -> Self {
        Self(fd)
    }

    /// The raw descriptor, to hand back to the host
    #[must_use]
    pub const fn as_raw(self) -> RawFd {
        self.0
    }
}

impl AsRawFd for NativeHandle {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

#[cfg(target_os = "linux")]
const NO_ATIME: OFlag = OFlag::O_NOATIME;
#[cfg(not(target_os = "linux"))]
const NO_ATIME: OFlag = OFlag::empty();

impl Bridge {
    /// Create a new file for writing
    ///
    /// Exclusive create: fails if anything already exists at `path`, so an
    /// existing file is never truncated. Permission bits come from
    /// `create_mode`, reduced by the umask.
    ///
    /// # Errors
    ///
    /// Returns op `open` (e.g. `EEXIST` when the path exists).
    pub fn open_for_write(&self, path: &HostString) -> Result<NativeHandle> {
        const OP: &str = "open";
        let cpath = name_codec::decode(path, OP)?;
        #[allow(clippy::unnecessary_cast)]
        let mode = Mode::from_bits_truncate(self.config.create_mode as libc::mode_t);

        let fd = syscall::open(&cpath, OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_EXCL, mode)
            .map_err(|errno| path_error(OP, path, errno))?;
        debug!("open {} for write: fd {}", path, fd);
        Ok(NativeHandle(fd))
    }

    /// Open an existing file for reading
    ///
    /// When `no_atime` is set the file is first opened without updating its
    /// access time. The kernel only allows that for the file's owner; on
    /// `EPERM` the open is retried normally and the fallback is not reported.
    ///
    /// # Errors
    ///
    /// Returns op `open` if the file cannot be opened.
    pub fn open_for_read(&self, path: &HostString) -> Result<NativeHandle> {
        const OP: &str = "open";
        let cpath = name_codec::decode(path, OP)?;

        let result = if self.config.no_atime && !NO_ATIME.is_empty() {
            match syscall::open(&cpath, OFlag::O_RDONLY | NO_ATIME, Mode::empty()) {
                Err(Errno::EPERM) => {
                    debug!("O_NOATIME refused for {}, opening normally", path);
                    syscall::open(&cpath, OFlag::O_RDONLY, Mode::empty())
                }
                other => other,
            }
        } else {
            syscall::open(&cpath, OFlag::O_RDONLY, Mode::empty())
        };

        let fd = result.map_err(|errno| path_error(OP, path, errno))?;
        debug!("open {} for read: fd {}", path, fd);
        Ok(NativeHandle(fd))
    }

    /// Close a descriptor
    ///
    /// # Errors
    ///
    /// Returns op `close` (e.g. `EBADF` for a handle that is not open).
    pub fn close_handle(&self, handle: NativeHandle) -> Result<()> {
        syscall::close(handle.0).map_err(|errno| handle_error("close", errno))?;
        debug!("close fd {}", handle.0);
        Ok(())
    }

    /// Read up to `length` bytes into `buffer[offset..offset + length]`
    ///
    /// Keeps reading across short reads until the range is full or the
    /// stream ends.
    ///
    /// # Returns
    ///
    /// Bytes actually read; `0` at end of stream
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The range lies outside `buffer` (op `read`, validation)
    /// - `read(2)` fails (op `read`); bytes already read are not reported
    pub fn read_chunk(
        &self,
        handle: NativeHandle,
        buffer: &mut [u8],
        offset: usize,
        length: usize,
    ) -> Result<usize> {
        const OP: &str = "read";
        let range = chunk_range(OP, buffer.len(), offset, length)?;
        io::read_full(handle.0, &mut buffer[range]).map_err(|errno| handle_error(OP, errno))
    }

    /// Write all of `buffer[offset..offset + length]`
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The range lies outside `buffer` (op `write`, validation)
    /// - `write(2)` fails or makes no progress (op `write`)
    pub fn write_chunk(
        &self,
        handle: NativeHandle,
        buffer: &[u8],
        offset: usize,
        length: usize,
    ) -> Result<()> {
        const OP: &str = "write";
        let range = chunk_range(OP, buffer.len(), offset, length)?;
        io::write_full(handle.0, &buffer[range]).map_err(|errno| handle_error(OP, errno))
    }

    /// Name of the terminal open on `handle`
    ///
    /// # Errors
    ///
    /// Returns op `ttyname` (e.g. `ENOTTY` when the handle is not a terminal).
    pub fn terminal_name(&self, handle: NativeHandle) -> Result<HostString> {
        let name = varbuf::terminal_name(
            handle.0,
            self.config.ttyname_capacity,
            self.config.max_result_capacity,
        )
        .map_err(|e| from_sys("ttyname", None, e))?;
        Ok(name_codec::encode(&name))
    }
}

/// Bounds-check a host-supplied `(offset, length)` against a buffer
fn chunk_range(op: &'static str, len: usize, offset: usize, length: usize) -> Result<Range<usize>> {
    match offset.checked_add(length) {
        Some(end) if end <= len => Ok(offset..end),
        _ => Err(BridgeError::Validation {
            op,
            message: format!("range {offset}+{length} is outside a buffer of {len} bytes"),
        }),
    }
}
