//! # fsbridge-sys
//!
//! Raw POSIX primitives used by `fsbridge`:
//! - Thin syscall wrappers that capture `errno` in the same expression as the call
//! - A bounded resize-and-retry buffer for results of unknown length
//!   (`readlink`, `ttyname_r`, `strerror_r`)
//! - A directory stream that filters the `.` and `..` pseudo-entries
//! - Read/write loops that retry across short transfers and `EINTR`
//!
//! Nothing in this crate knows about host strings or operation names; the
//! errors it returns carry only the native error code. Callers attach the
//! operation context.
//!
//! ## Example
//!
//! ```rust,no_run
//! use fsbridge_sys::varbuf;
//! use std::ffi::CString;
//!
//! # fn example() -> fsbridge_sys::Result<()> {
//! let path = CString::new("/proc/self/exe").unwrap();
//! let target = varbuf::read_link(&path, 128, 1 << 20)?;
//! println!("{} bytes", target.len());
//! # Ok(())
//! # }
//! ```

pub mod dir;
pub mod error;
pub mod io;
pub mod syscall;
pub mod varbuf;

pub use dir::{DirStream, RawEntry};
pub use error::{Result, SysError};
pub use varbuf::Fill;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
