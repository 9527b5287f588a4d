//! Symbolic and hard links

use super::Bridge;
use crate::error::{from_sys, two_path_error, Result};
use crate::name_codec::{self, HostString};
use fsbridge_sys::{syscall, varbuf};
use tracing::debug;

impl Bridge {
    /// Create a symbolic link at `link_path` whose contents are `target`
    ///
    /// `target` is stored verbatim; it need not exist.
    ///
    /// # Errors
    ///
    /// Returns op `symlink` with `link_path` as the primary path and `target`
    /// as the secondary path.
    pub fn create_symlink(&self, target: &HostString, link_path: &HostString) -> Result<()> {
        const OP: &str = "symlink";
        let ctarget = name_codec::decode(target, OP)?;
        let clink = name_codec::decode(link_path, OP)?;

        syscall::symlink(&ctarget, &clink)
            .map_err(|errno| two_path_error(OP, link_path, target, errno))?;
        debug!("symlink {} -> {}", link_path, target);
        Ok(())
    }

    /// Create `new_path` as a hard link to `existing`
    ///
    /// # Errors
    ///
    /// Returns op `link` with `new_path` as the primary path and `existing`
    /// as the secondary path.
    pub fn create_hard_link(&self, existing: &HostString, new_path: &HostString) -> Result<()> {
        const OP: &str = "link";
        let cexisting = name_codec::decode(existing, OP)?;
        let cnew = name_codec::decode(new_path, OP)?;

        syscall::link(&cexisting, &cnew)
            .map_err(|errno| two_path_error(OP, new_path, existing, errno))?;
        debug!("link {} => {}", new_path, existing);
        Ok(())
    }

    /// Read the target of a symbolic link, byte for byte
    ///
    /// The buffer starts at `readlink_capacity` and doubles while the target
    /// might be truncated, up to `max_result_capacity`.
    ///
    /// # Errors
    ///
    /// Returns op `readlink` if:
    /// - `path` is not a symlink or cannot be read
    /// - The target exceeds `max_result_capacity` ([`crate::BridgeError::ResultTooLarge`])
    pub fn read_symlink_target(&self, path: &HostString) -> Result<HostString> {
        const OP: &str = "readlink";
        let cpath = name_codec::decode(path, OP)?;

        let target = varbuf::read_link(
            &cpath,
            self.config.readlink_capacity,
            self.config.max_result_capacity,
        )
        .map_err(|e| from_sys(OP, Some(path), e))?;
        Ok(name_codec::encode(&target))
    }
}
