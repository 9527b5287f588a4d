//! Resize-and-retry buffers for results of unknown length
//!
//! Some calls write into a caller-supplied buffer and give no way to ask for
//! the required size up front. [`read_variable`] starts at an initial
//! capacity and doubles it whenever the result might have been truncated,
//! up to a hard maximum. Past the maximum it fails with
//! [`SysError::TooLarge`] instead of growing without bound.
//!
//! # Usage
//!
//! ```rust,no_run
//! use fsbridge_sys::varbuf::{read_variable, Fill};
//!
//! # fn example() -> fsbridge_sys::Result<()> {
//! let bytes = read_variable(16, 1024, |buf| {
//!     buf[..5].copy_from_slice(b"hello");
//!     Ok(Fill::Complete(5))
//! })?;
//! assert_eq!(bytes, b"hello");
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, SysError};
use crate::syscall;
use nix::errno::Errno;
use std::ffi::CStr;
use std::os::unix::io::RawFd;

/// Outcome of one attempt to fill a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// The result fit; it is exactly this many bytes
    Complete(usize),
    /// The result may not have fit; retry with a larger buffer
    Truncated,
}

/// Run `fill` against buffers of growing size until the result fits
///
/// # Arguments
///
/// * `initial` - First buffer capacity to try
/// * `max` - Largest capacity allowed
/// * `fill` - Writes the result into the buffer and reports whether it fit
///
/// # Returns
///
/// The result bytes, trimmed to the reported length
///
/// # Errors
///
/// This function will return an error if:
/// - `fill` returns an `Errno`
/// - The result still does not fit at `max` bytes
/// - A buffer cannot be allocated
pub fn read_variable<F>(initial: usize, max: usize, mut fill: F) -> Result<Vec<u8>>
where
    F: FnMut(&mut [u8]) -> nix::Result<Fill>,
{
    let mut capacity = initial.max(1);
    loop {
        if capacity > max {
            return Err(SysError::TooLarge { limit: max });
        }

        let mut buf = Vec::new();
        buf.try_reserve_exact(capacity)?;
        buf.resize(capacity, 0);

        match fill(&mut buf)? {
            Fill::Complete(len) => {
                buf.truncate(len);
                return Ok(buf);
            }
            Fill::Truncated => {
                log::trace!("result may be truncated at {} bytes, retrying", capacity);
                capacity = capacity
                    .checked_mul(2)
                    .ok_or(SysError::TooLarge { limit: max })?;
            }
        }
    }
}

/// Read a symlink target of any length
///
/// A `readlink` result that exactly fills the buffer is treated as
/// truncated, since `readlink` silently cuts long targets.
///
/// # Errors
///
/// Returns the `readlink(2)` error, [`SysError::TooLarge`], or an allocation failure.
pub fn read_link(path: &CStr, initial: usize, max: usize) -> Result<Vec<u8>> {
    read_variable(initial, max, |buf| {
        let len = syscall::readlink(path, buf)?;
        Ok(if len == buf.len() {
            Fill::Truncated
        } else {
            Fill::Complete(len)
        })
    })
}

/// Name of the terminal open on `fd`
///
/// Some `ttyname_r` implementations report success for a name that exactly
/// fills the buffer but overwrite its last byte with the terminator. A name
/// whose terminator lands in the final slot is therefore retried with a
/// larger buffer.
///
/// # Errors
///
/// Returns the `ttyname_r(3)` error (e.g. `ENOTTY`), [`SysError::TooLarge`],
/// or an allocation failure.
pub fn terminal_name(fd: RawFd, initial: usize, max: usize) -> Result<Vec<u8>> {
    read_variable(initial, max, |buf| match syscall::ttyname_into(fd, buf) {
        Ok(()) => Ok(nul_terminated(buf)),
        Err(Errno::ERANGE) => Ok(Fill::Truncated),
        Err(errno) => Err(errno),
    })
}

/// Message text for an error number
///
/// # Errors
///
/// `EINVAL` for codes the C library does not know, [`SysError::TooLarge`],
/// or an allocation failure.
pub fn error_message(code: i32, initial: usize, max: usize) -> Result<Vec<u8>> {
    read_variable(initial, max, |buf| match syscall::strerror_into(code, buf) {
        Ok(()) => Ok(nul_terminated(buf)),
        Err(Errno::ERANGE) => Ok(Fill::Truncated),
        Err(errno) => Err(errno),
    })
}

/// Length of a NUL-terminated result, or `Truncated` if the terminator is
/// missing or sits in the last byte
fn nul_terminated(buf: &[u8]) -> Fill {
    match buf.iter().position(|&b| b == 0) {
        Some(len) if len + 1 < buf.len() => Fill::Complete(len),
        _ => Fill::Truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;
    use tempfile::TempDir;

    #[test]
    fn test_capacity_doubles_until_fit() {
        let mut seen = Vec::new();
        let result = read_variable(4, 64, |buf| {
            seen.push(buf.len());
            if buf.len() < 20 {
                Ok(Fill::Truncated)
            } else {
                buf[..3].copy_from_slice(b"abc");
                Ok(Fill::Complete(3))
            }
        })
        .unwrap();

        assert_eq!(result, b"abc");
        assert_eq!(seen, vec![4, 8, 16, 32]);
    }

    #[test]
    fn test_too_large_past_maximum() {
        let mut attempts = 0;
        let err = read_variable(8, 32, |_| {
            attempts += 1;
            Ok(Fill::Truncated)
        })
        .unwrap_err();

        assert!(matches!(err, SysError::TooLarge { limit: 32 }));
        // 8, 16, 32
        assert_eq!(attempts, 3);
    }

    #[test]
    fn test_errno_is_not_retried() {
        let mut attempts = 0;
        let err = read_variable(8, 32, |_| {
            attempts += 1;
            Err(Errno::EACCES)
        })
        .unwrap_err();

        assert_eq!(err.errno(), Some(Errno::EACCES));
        assert_eq!(attempts, 1);
    }

    #[rstest]
    #[case(b"abc\0\0\0", Fill::Complete(3))]
    #[case(b"abcd\0\0", Fill::Complete(4))]
    #[case(b"abcde\0", Fill::Truncated)]
    #[case(b"abcdef", Fill::Truncated)]
    fn test_nul_terminated(#[case] buf: &[u8], #[case] expected: Fill) {
        assert_eq!(nul_terminated(buf), expected);
    }

    #[rstest]
    #[case(1)]
    #[case(127)]
    #[case(128)]
    #[case(129)]
    #[case(1000)]
    fn test_read_link_lengths(#[case] len: usize) {
        let temp_dir = TempDir::new().unwrap();
        let link_path = temp_dir.path().join("link");
        let target = "t".repeat(len);
        std::os::unix::fs::symlink(&target, &link_path).unwrap();

        let cpath = CString::new(link_path.as_os_str().as_bytes()).unwrap();
        let read = read_link(&cpath, 128, 1 << 20).unwrap();
        assert_eq!(read, target.as_bytes());
    }

    #[test]
    fn test_read_link_respects_maximum() {
        let temp_dir = TempDir::new().unwrap();
        let link_path = temp_dir.path().join("link");
        std::os::unix::fs::symlink("x".repeat(300), &link_path).unwrap();

        let cpath = CString::new(link_path.as_os_str().as_bytes()).unwrap();
        let err = read_link(&cpath, 128, 256).unwrap_err();
        assert!(matches!(err, SysError::TooLarge { limit: 256 }));
    }

    #[test]
    fn test_read_link_on_regular_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("file");
        std::fs::write(&path, b"").unwrap();

        let cpath = CString::new(path.as_os_str().as_bytes()).unwrap();
        let err = read_link(&cpath, 128, 1 << 20).unwrap_err();
        assert_eq!(err.errno(), Some(Errno::EINVAL));
    }

    #[test]
    fn test_terminal_name_grows_until_terminator_fits() {
        use nix::fcntl::OFlag;
        use nix::pty::{grantpt, posix_openpt, ptsname_r, unlockpt};
        use std::os::unix::fs::OpenOptionsExt;
        use std::os::unix::io::AsRawFd;

        let master = posix_openpt(OFlag::O_RDWR | OFlag::O_NOCTTY).unwrap();
        grantpt(&master).unwrap();
        unlockpt(&master).unwrap();
        let name = ptsname_r(&master).unwrap();
        let slave = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(&name)
            .unwrap();

        for initial in [1, 4, name.len(), name.len() + 1, 1024] {
            let found = terminal_name(slave.as_raw_fd(), initial, 4096).unwrap();
            assert_eq!(found, name.as_bytes(), "initial capacity {initial}");
        }
    }

    #[test]
    fn test_error_message_grows_from_tiny_buffer() {
        let message = error_message(libc::ENOENT, 2, 4096).unwrap();
        assert!(message.len() > 2);
        assert!(!message.contains(&0));
    }
}
