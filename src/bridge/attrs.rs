//! Status queries and attribute mutation

use super::Bridge;
use crate::error::{path_error, BridgeError, Result};
use crate::name_codec::{self, HostString};
use crate::status::{build_status, FileStatus, SpecialKind};
use filetime::FileTime;
use fsbridge_sys::syscall;
use nix::errno::Errno;
use nix::sys::stat::Mode;
use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use tracing::debug;

impl Bridge {
    /// Status of the file `path` refers to, following symlinks
    ///
    /// # Errors
    ///
    /// Returns op `stat` if the call fails or the file type is unrecognized.
    pub fn get_status(&self, path: &HostString) -> Result<FileStatus> {
        const OP: &str = "stat";
        let cpath = name_codec::decode(path, OP)?;
        let st = syscall::stat(&cpath).map_err(|errno| path_error(OP, path, errno))?;
        build_status(&st, OP, path)
    }

    /// Status of `path` itself; a symlink is described as `LNK`
    ///
    /// # Errors
    ///
    /// Returns op `lstat` if the call fails or the file type is unrecognized.
    pub fn get_link_status(&self, path: &HostString) -> Result<FileStatus> {
        const OP: &str = "lstat";
        let cpath = name_codec::decode(path, OP)?;
        let st = syscall::lstat(&cpath).map_err(|errno| path_error(OP, path, errno))?;
        build_status(&st, OP, path)
    }

    /// Create a directory with `mkdir_mode` permission bits, reduced by the umask
    ///
    /// # Errors
    ///
    /// Returns op `mkdir` (e.g. `EEXIST`, `ENOENT` for a missing parent).
    pub fn make_directory(&self, path: &HostString) -> Result<()> {
        const OP: &str = "mkdir";
        let cpath = name_codec::decode(path, OP)?;
        #[allow(clippy::unnecessary_cast)]
        let mode = Mode::from_bits_truncate(self.config.mkdir_mode as libc::mode_t);

        syscall::mkdir(&cpath, mode).map_err(|errno| path_error(OP, path, errno))?;
        debug!("mkdir {} {:o}", path, self.config.mkdir_mode);
        Ok(())
    }

    /// Change the owner and group of the file `path` refers to
    ///
    /// `-1` for either id leaves it unchanged.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - An id is neither `-1` nor a valid `u32` (op `chown`, validation)
    /// - `chown(2)` fails (op `chown`)
    pub fn change_owner(&self, path: &HostString, uid: i64, gid: i64) -> Result<()> {
        const OP: &str = "chown";
        let (uid, gid) = (owner_id(OP, "uid", uid)?, owner_id(OP, "gid", gid)?);
        let cpath = name_codec::decode(path, OP)?;

        syscall::chown(&cpath, uid, gid).map_err(|errno| path_error(OP, path, errno))?;
        debug!("chown {} {:?}:{:?}", path, uid, gid);
        Ok(())
    }

    /// Like [`Bridge::change_owner`] but changes a symlink itself
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - An id is neither `-1` nor a valid `u32` (op `lchown`, validation)
    /// - `lchown(2)` fails (op `lchown`)
    pub fn change_link_owner(&self, path: &HostString, uid: i64, gid: i64) -> Result<()> {
        const OP: &str = "lchown";
        let (uid, gid) = (owner_id(OP, "uid", uid)?, owner_id(OP, "gid", gid)?);
        let cpath = name_codec::decode(path, OP)?;

        syscall::lchown(&cpath, uid, gid).map_err(|errno| path_error(OP, path, errno))?;
        debug!("lchown {} {:?}:{:?}", path, uid, gid);
        Ok(())
    }

    /// Change permission bits
    ///
    /// # Errors
    ///
    /// Returns op `chmod`.
    pub fn change_mode(&self, path: &HostString, mode: u32) -> Result<()> {
        const OP: &str = "chmod";
        let cpath = name_codec::decode(path, OP)?;

        #[allow(clippy::cast_possible_truncation, clippy::unnecessary_cast)]
        let bits = mode as libc::mode_t;

        syscall::chmod(&cpath, bits).map_err(|errno| path_error(OP, path, errno))?;
        debug!("chmod {} {:o}", path, mode);
        Ok(())
    }

    /// Set access and modification times, in whole seconds since the epoch
    ///
    /// Follows symlinks. Sub-second precision is not supported.
    ///
    /// # Errors
    ///
    /// Returns op `utimes`.
    pub fn set_times(&self, path: &HostString, access_time: i64, mod_time: i64) -> Result<()> {
        const OP: &str = "utimes";
        let cpath = name_codec::decode(path, OP)?;
        let fs_path = Path::new(OsStr::from_bytes(cpath.to_bytes()));

        filetime::set_file_times(
            fs_path,
            FileTime::from_unix_time(access_time, 0),
            FileTime::from_unix_time(mod_time, 0),
        )
        .map_err(|e| {
            let errno = e.raw_os_error().map_or(Errno::EIO, Errno::from_raw);
            path_error(OP, path, errno)
        })?;
        debug!("utimes {} atime={} mtime={}", path, access_time, mod_time);
        Ok(())
    }

    /// Create a device node, named pipe or socket inode
    ///
    /// `kind` must be one of `BLK`, `CHR`, `FIFO`, `SOCK`; it is checked
    /// before anything touches the filesystem. `dev` is only meaningful for
    /// devices.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - `kind` is not a recognized special kind (op `mknod`, validation)
    /// - `mknod(2)` fails (op `mknod`; creating devices usually needs privileges)
    pub fn make_special_file(
        &self,
        path: &HostString,
        kind: &HostString,
        mode: u32,
        dev: u64,
    ) -> Result<()> {
        const OP: &str = "mknod";
        let kind: SpecialKind = kind
            .to_string()
            .parse()
            .map_err(|message| BridgeError::Validation { op: OP, message })?;
        let cpath = name_codec::decode(path, OP)?;
        #[allow(clippy::cast_possible_truncation, clippy::unnecessary_cast)]
        let (perm, dev) = (
            Mode::from_bits_truncate((mode & 0o7777) as libc::mode_t),
            dev as libc::dev_t,
        );

        syscall::mknod(&cpath, kind.type_flag(), perm, dev)
            .map_err(|errno| path_error(OP, path, errno))?;
        debug!("mknod {} {:?} {:o} dev={}", path, kind, mode, dev);
        Ok(())
    }
}

/// Convert a host owner id: `-1` means unchanged, anything else must fit a `u32`
fn owner_id(op: &'static str, name: &str, id: i64) -> Result<Option<u32>> {
    if id == -1 {
        return Ok(None);
    }
    u32::try_from(id)
        .map(Some)
        .map_err(|_| BridgeError::Validation {
            op,
            message: format!("{name} {id} is out of range"),
        })
}
