//! Descriptor read/write loops that survive short transfers
//!
//! `read(2)` and `write(2)` may move fewer bytes than requested. These loops
//! keep going until the whole slice is transferred, the stream ends (reads
//! only), or the kernel reports an error. `EINTR` is retried.

use nix::errno::Errno;
use std::os::unix::io::RawFd;

/// Read into `buf` until it is full or the stream ends
///
/// # Returns
///
/// Total bytes read; less than `buf.len()` only at end of stream
///
/// # Errors
///
/// Returns the first non-`EINTR` error from `read(2)`. Bytes already placed
/// in `buf` are not reported.
pub fn read_full(fd: RawFd, buf: &mut [u8]) -> nix::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        let rest = &mut buf[total..];
        // SAFETY: `rest` is valid for writes of `rest.len()` bytes.
        let res = unsafe { libc::read(fd, rest.as_mut_ptr().cast(), rest.len()) };
        match Errno::result(res) {
            Ok(0) => break,
            #[allow(clippy::cast_sign_loss)] // positive after the sentinel check
            Ok(n) => total += n as usize,
            Err(Errno::EINTR) => continue,
            Err(errno) => return Err(errno),
        }
    }
    Ok(total)
}

/// Write all of `buf`
///
/// # Errors
///
/// Returns the first non-`EINTR` error from `write(2)`. A write that makes
/// no progress is reported as `EIO`.
pub fn write_full(fd: RawFd, buf: &[u8]) -> nix::Result<()> {
    let mut written = 0;
    while written < buf.len() {
        let rest = &buf[written..];
        // SAFETY: `rest` is valid for reads of `rest.len()` bytes.
        let res = unsafe { libc::write(fd, rest.as_ptr().cast(), rest.len()) };
        match Errno::result(res) {
            Ok(0) => return Err(Errno::EIO),
            #[allow(clippy::cast_sign_loss)]
            Ok(n) => written += n as usize,
            Err(Errno::EINTR) => continue,
            Err(errno) => return Err(errno),
        }
    }
    Ok(())
}
