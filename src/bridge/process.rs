//! Process-level queries that cannot fail

use super::Bridge;
use crate::config::STRERROR_CAPACITY;
use crate::name_codec::{self, HostString};
use fsbridge_sys::{syscall, varbuf};
use tracing::debug;

impl Bridge {
    /// Message text for a native error code
    ///
    /// Always returns something: codes the C library does not recognize
    /// produce `"Unknown error N"`.
    #[must_use]
    pub fn describe_error_code(&self, code: i32) -> HostString {
        match varbuf::error_message(code, STRERROR_CAPACITY, self.config.max_result_capacity) {
            Ok(message) => name_codec::encode(&message),
            Err(e) => {
                debug!("strerror_r({}) failed: {}", code, e);
                HostString::from(format!("Unknown error {code}").as_str())
            }
        }
    }

    /// Effective user id of the process
    #[must_use]
    pub fn effective_user_id(&self) -> u32 {
        syscall::geteuid()
    }

    /// Set the process umask, returning the previous one
    ///
    /// The mask is passed through as given; bits the kernel ignores are dropped there.
    #[must_use = "the previous mask is needed to restore it"]
    pub fn set_umask(&self, mask: u32) -> u32 {
        syscall::umask(mask)
    }
}
