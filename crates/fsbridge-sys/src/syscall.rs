//! Thin wrappers around the POSIX calls the bridge needs
//!
//! Every wrapper turns the call's failure sentinel into an [`Errno`] in the
//! same expression as the call, so nothing (allocation, logging) can run in
//! between and clobber the process-global error state. Wrappers either
//! delegate to `nix` or call `libc` directly and pass the return value
//! through [`Errno::result`].
//!
//! Paths are `&CStr` so arbitrary byte names pass through untouched.

use nix::errno::Errno;
use nix::fcntl::{self, OFlag};
use nix::sys::stat::{self, FileStat, Mode, SFlag};
use nix::unistd;
use std::ffi::CStr;
use std::os::unix::io::RawFd;

/// `stat(2)`: status of the file `path` refers to, following symlinks
///
/// # Errors
///
/// Returns the `errno` reported by `stat(2)`.
pub fn stat(path: &CStr) -> nix::Result<FileStat> {
    stat::stat(path)
}

/// `lstat(2)`: status of `path` itself, not following a final symlink
///
/// # Errors
///
/// Returns the `errno` reported by `lstat(2)`.
pub fn lstat(path: &CStr) -> nix::Result<FileStat> {
    stat::lstat(path)
}

/// `symlink(2)`: create `link_path` pointing at `target`
///
/// # Errors
///
/// Returns the `errno` reported by `symlink(2)`.
pub fn symlink(target: &CStr, link_path: &CStr) -> nix::Result<()> {
    // SAFETY: both pointers are NUL-terminated and outlive the call.
    let res = unsafe { libc::symlink(target.as_ptr(), link_path.as_ptr()) };
    Errno::result(res).map(drop)
}

/// `link(2)`: create `new_path` as another name for `existing`
///
/// # Errors
///
/// Returns the `errno` reported by `link(2)`.
pub fn link(existing: &CStr, new_path: &CStr) -> nix::Result<()> {
    // SAFETY: both pointers are NUL-terminated and outlive the call.
    let res = unsafe { libc::link(existing.as_ptr(), new_path.as_ptr()) };
    Errno::result(res).map(drop)
}

/// `readlink(2)` into `buf`, returning the number of bytes written
///
/// A return equal to `buf.len()` means the target may have been truncated.
///
/// # Errors
///
/// Returns the `errno` reported by `readlink(2)`.
#[allow(clippy::cast_sign_loss)] // non-negative after the sentinel check
pub fn readlink(path: &CStr, buf: &mut [u8]) -> nix::Result<usize> {
    // SAFETY: `buf` is valid for writes of `buf.len()` bytes.
    let res = unsafe { libc::readlink(path.as_ptr(), buf.as_mut_ptr().cast(), buf.len()) };
    Errno::result(res).map(|n| n as usize)
}

/// `open(2)` with an explicit creation mode
///
/// # Errors
///
/// Returns the `errno` reported by `open(2)`.
pub fn open(path: &CStr, flags: OFlag, mode: Mode) -> nix::Result<RawFd> {
    fcntl::open(path, flags | OFlag::O_CLOEXEC, mode)
}

/// `close(2)`
///
/// # Errors
///
/// Returns the `errno` reported by `close(2)`.
pub fn close(fd: RawFd) -> nix::Result<()> {
    unistd::close(fd)
}

/// `mkdir(2)`; the process umask is applied by the kernel
///
/// # Errors
///
/// Returns the `errno` reported by `mkdir(2)`.
pub fn mkdir(path: &CStr, mode: Mode) -> nix::Result<()> {
    unistd::mkdir(path, mode)
}

/// `mknod(2)` for block/character devices, FIFOs and sockets
///
/// # Errors
///
/// Returns the `errno` reported by `mknod(2)`.
pub fn mknod(path: &CStr, kind: SFlag, perm: Mode, dev: libc::dev_t) -> nix::Result<()> {
    stat::mknod(path, kind, perm, dev)
}

/// `chmod(2)`
///
/// # Errors
///
/// Returns the `errno` reported by `chmod(2)`.
pub fn chmod(path: &CStr, mode: libc::mode_t) -> nix::Result<()> {
    // SAFETY: `path` is NUL-terminated and outlives the call.
    let res = unsafe { libc::chmod(path.as_ptr(), mode) };
    Errno::result(res).map(drop)
}

/// `chown(2)`; `None` leaves the corresponding id unchanged
///
/// # Errors
///
/// Returns the `errno` reported by `chown(2)`.
pub fn chown(path: &CStr, uid: Option<u32>, gid: Option<u32>) -> nix::Result<()> {
    let (uid, gid) = raw_ids(uid, gid);
    // SAFETY: `path` is NUL-terminated and outlives the call.
    let res = unsafe { libc::chown(path.as_ptr(), uid, gid) };
    Errno::result(res).map(drop)
}

/// `lchown(2)`: like [`chown`] but acts on a symlink itself
///
/// # Errors
///
/// Returns the `errno` reported by `lchown(2)`.
pub fn lchown(path: &CStr, uid: Option<u32>, gid: Option<u32>) -> nix::Result<()> {
    let (uid, gid) = raw_ids(uid, gid);
    // SAFETY: `path` is NUL-terminated and outlives the call.
    let res = unsafe { libc::lchown(path.as_ptr(), uid, gid) };
    Errno::result(res).map(drop)
}

/// `(uid_t)-1` and `(gid_t)-1` mean "leave unchanged"
fn raw_ids(uid: Option<u32>, gid: Option<u32>) -> (libc::uid_t, libc::gid_t) {
    (
        uid.unwrap_or(libc::uid_t::MAX),
        gid.unwrap_or(libc::gid_t::MAX),
    )
}

/// `ttyname_r(3)` into `buf`
///
/// `ttyname_r` reports failure through its return value rather than `errno`.
/// `ERANGE` means `buf` was too small.
///
/// # Errors
///
/// Returns the error number reported by `ttyname_r(3)`.
pub fn ttyname_into(fd: RawFd, buf: &mut [u8]) -> nix::Result<()> {
    // SAFETY: `buf` is valid for writes of `buf.len()` bytes.
    let res = unsafe { libc::ttyname_r(fd, buf.as_mut_ptr().cast(), buf.len()) };
    match res {
        0 => Ok(()),
        err => Err(Errno::from_raw(err)),
    }
}

/// XSI `strerror_r(3)` into `buf`
///
/// Newer C libraries return the error number; older ones return `-1` and set
/// `errno`. Both are folded into a single [`Errno`].
///
/// # Errors
///
/// `ERANGE` when `buf` is too small, `EINVAL` for an unknown code.
pub fn strerror_into(code: i32, buf: &mut [u8]) -> nix::Result<()> {
    // SAFETY: `buf` is valid for writes of `buf.len()` bytes.
    let res = unsafe { libc::strerror_r(code, buf.as_mut_ptr().cast(), buf.len()) };
    match res {
        0 => Ok(()),
        -1 => Err(Errno::last()),
        err => Err(Errno::from_raw(err)),
    }
}

/// `geteuid(2)`; cannot fail
#[must_use]
pub fn geteuid() -> u32 {
    unistd::geteuid().as_raw()
}

/// `umask(2)`; returns the previous mask and cannot fail
#[must_use]
pub fn umask(mask: u32) -> u32 {
    #[allow(clippy::unnecessary_cast)] // mode_t is u16 on some platforms
    let previous = stat::umask(Mode::from_bits_truncate(mask as libc::mode_t));
    u32::from(previous.bits())
}
