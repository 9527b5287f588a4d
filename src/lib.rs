//! # fsbridge
//!
//! Native filesystem metadata bridge: POSIX file and directory primitives
//! exposed to a host runtime whose strings are sequences of 16-bit code units.
//!
//! Every operation is a synchronous call on the calling thread. Paths cross
//! the boundary through [`name_codec`], one code unit per raw byte, so names
//! that are not valid UTF-8 survive a round trip. Failures come back as a
//! [`BridgeError`] carrying the operation name, the path(s) involved and the
//! native error code.
//!
//! ## Example
//!
//! ```rust,no_run
//! use fsbridge::{Bridge, HostString, StatusKey};
//!
//! # fn example() -> fsbridge::Result<()> {
//! let bridge = Bridge::default();
//! let status = bridge.get_status(&HostString::from("/etc/hosts"))?;
//! println!("{} {:?}", status.kind(), status.get(StatusKey::Size));
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod cli;
pub mod config;
pub mod directory;
pub mod error;
pub mod name_codec;
pub mod status;

pub use bridge::{bridge, setup, Bridge, NativeHandle};
pub use config::BridgeConfig;
pub use directory::DirEntry;
pub use error::{BridgeError, Result};
pub use name_codec::HostString;
pub use status::{FileStatus, Kind, SpecialKind, StatusKey};

/// Version of the fsbridge crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
