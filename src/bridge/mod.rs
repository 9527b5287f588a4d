//! The operation facade
//!
//! [`Bridge`] exposes one method per POSIX primitive. Every method follows
//! the same shape:
//!
//! 1. Narrow the host path argument(s) to C paths ([`crate::name_codec`])
//! 2. Make the native call, capturing `errno` in the same expression
//! 3. On failure, return a [`BridgeError`](crate::BridgeError) tagged with
//!    the operation name and path(s)
//! 4. On success, return a scalar, a [`FileStatus`](crate::FileStatus), or a
//!    host string
//!
//! No state is carried between calls apart from descriptors the caller holds.
//! The bridge does not track whether a [`NativeHandle`] is still open.
//!
//! # Usage
//!
//! ```rust,no_run
//! use fsbridge::{Bridge, HostString};
//!
//! # fn example() -> fsbridge::Result<()> {
//! let bridge = Bridge::default();
//! for entry in bridge.list_directory(&HostString::from("/tmp"))? {
//!     let status = bridge.get_link_status(&HostString::from(format!("/tmp/{}", entry.name).as_str()))?;
//!     println!("{} {}", status.kind(), entry.name);
//! }
//! # Ok(())
//! # }
//! ```

mod attrs;
mod handles;
mod links;
mod process;

pub use handles::NativeHandle;

use crate::config::BridgeConfig;
use crate::directory::{self, DirEntry};
use crate::error::{BridgeError, Result};
use crate::name_codec::HostString;
use std::sync::OnceLock;
use tracing::debug;

/// Process-wide bridge installed by [`setup`]
static GLOBAL: OnceLock<Bridge> = OnceLock::new();

/// Facade over the native filesystem primitives
#[derive(Debug, Clone, Default)]
pub struct Bridge {
    config: BridgeConfig,
}

impl Bridge {
    /// Create a bridge with the given configuration
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Config`] if the configuration is inconsistent.
    pub fn new(config: BridgeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in effect
    #[must_use]
    pub const fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// List a directory as `(name, inode)` entries, excluding `.` and `..`
    ///
    /// # Errors
    ///
    /// Returns op `readDir` if the directory cannot be opened.
    pub fn list_directory(&self, path: &HostString) -> Result<Vec<DirEntry>> {
        debug!("readDir {}", path);
        directory::list_directory(path)
    }
}

/// Install the process-wide bridge
///
/// Call once during startup, before any operation runs. Failure here is a
/// startup failure, not a per-call error.
///
/// # Errors
///
/// Returns [`BridgeError::Config`] if the configuration is invalid or a
/// bridge has already been installed.
pub fn setup(config: BridgeConfig) -> Result<&'static Bridge> {
    let bridge = Bridge::new(config)?;
    let mut installed = false;
    let global = GLOBAL.get_or_init(|| {
        installed = true;
        bridge
    });
    if installed {
        debug!("bridge installed: {:?}", global.config());
        Ok(global)
    } else {
        Err(BridgeError::Config("bridge is already set up".to_string()))
    }
}

/// The process-wide bridge, installing a default one if [`setup`] was never called
pub fn bridge() -> &'static Bridge {
    GLOBAL.get_or_init(Bridge::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = BridgeConfig {
            readlink_capacity: 0,
            ..BridgeConfig::default()
        };
        assert!(matches!(Bridge::new(config), Err(BridgeError::Config(_))));
    }

    #[test]
    fn test_setup_is_write_once() {
        let installed = bridge();
        assert!(std::ptr::eq(installed, bridge()));
        assert!(matches!(
            setup(BridgeConfig::default()),
            Err(BridgeError::Config(_))
        ));
    }
}
