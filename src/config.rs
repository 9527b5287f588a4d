//! Bridge configuration
//!
//! `BridgeConfig` doubles as a `clap::Args` group so the command-line host
//! can override every knob; library callers use [`BridgeConfig::default`].

use crate::error::{BridgeError, Result};

/// Initial buffer for symlink targets
pub const DEFAULT_READLINK_CAPACITY: usize = 128;

/// Initial buffer for terminal names
///
/// Generous on purpose: some `ttyname_r` implementations clobber the last
/// byte when the name exactly fills the buffer.
pub const DEFAULT_TTYNAME_CAPACITY: usize = 1024;

/// Initial buffer for error messages
pub const STRERROR_CAPACITY: usize = 128;

/// Largest buffer any variable-length result may grow to
pub const DEFAULT_MAX_RESULT_CAPACITY: usize = 1 << 20;

/// Bridge tuning and creation policy
#[derive(clap::Args, Debug, Clone, PartialEq, Eq)]
#[command(next_help_heading = "Bridge Options")]
pub struct BridgeConfig {
    /// Initial buffer size in bytes for reading symlink targets
    #[arg(long, default_value_t = DEFAULT_READLINK_CAPACITY)]
    pub readlink_capacity: usize,

    /// Initial buffer size in bytes for terminal names
    #[arg(long, default_value_t = DEFAULT_TTYNAME_CAPACITY)]
    pub ttyname_capacity: usize,

    /// Largest buffer in bytes a variable-length result may grow to
    #[arg(long, default_value_t = DEFAULT_MAX_RESULT_CAPACITY)]
    pub max_result_capacity: usize,

    /// Permission bits (octal) for new directories, before the umask
    #[arg(long, default_value = "700", value_parser = parse_octal)]
    pub mkdir_mode: u32,

    /// Permission bits (octal) for files created for writing, before the umask
    #[arg(long, default_value = "600", value_parser = parse_octal)]
    pub create_mode: u32,

    /// Open files for reading without updating their access time (Linux)
    ///
    /// Pass --update-atime to disable.
    #[arg(long = "update-atime", action = clap::ArgAction::SetFalse)]
    pub no_atime: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            readlink_capacity: DEFAULT_READLINK_CAPACITY,
            ttyname_capacity: DEFAULT_TTYNAME_CAPACITY,
            max_result_capacity: DEFAULT_MAX_RESULT_CAPACITY,
            mkdir_mode: 0o700,
            create_mode: 0o600,
            no_atime: true,
        }
    }
}

impl BridgeConfig {
    /// Check the configuration for internal consistency
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Config`] if:
    /// - An initial capacity is zero or larger than the maximum
    /// - A mode has bits outside `0o7777`
    pub fn validate(&self) -> Result<()> {
        for (name, capacity) in [
            ("readlink_capacity", self.readlink_capacity),
            ("ttyname_capacity", self.ttyname_capacity),
        ] {
            if capacity == 0 {
                return Err(BridgeError::Config(format!("{name} must be positive")));
            }
            if capacity > self.max_result_capacity {
                return Err(BridgeError::Config(format!(
                    "{name} ({capacity}) exceeds max_result_capacity ({})",
                    self.max_result_capacity
                )));
            }
        }
        if STRERROR_CAPACITY > self.max_result_capacity {
            return Err(BridgeError::Config(format!(
                "max_result_capacity must be at least {STRERROR_CAPACITY}"
            )));
        }
        for (name, mode) in [("mkdir_mode", self.mkdir_mode), ("create_mode", self.create_mode)] {
            if mode & !0o7777 != 0 {
                return Err(BridgeError::Config(format!(
                    "{name} {mode:#o} has bits outside 0o7777"
                )));
            }
        }
        Ok(())
    }
}

/// Parse an octal permission string such as `755` or `0o644`
///
/// # Errors
///
/// Returns a message if the string is not valid octal.
pub fn parse_octal(s: &str) -> std::result::Result<u32, String> {
    let digits = s.strip_prefix("0o").unwrap_or(s);
    u32::from_str_radix(digits, 8).map_err(|e| format!("invalid octal value '{s}': {e}"))
}
