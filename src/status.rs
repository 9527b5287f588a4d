//! File status encoded as an ordered attribute map
//!
//! A [`FileStatus`] is what `stat`/`lstat` hand back to the host: a fixed,
//! ordered set of string keys with decimal string values, plus a `*kind*`
//! discriminator. The key set is closed ([`StatusKey`]); nothing else can be
//! inserted.
//!
//! Key order:
//!
//! ```text
//! *kind* mode dev ino nlink uid gid [rdev] size mtime ctime
//! ```
//!
//! `rdev` is present only for character and block devices. `mode` has the
//! file-type bits masked off. Times have seconds precision only; sub-second
//! components are dropped. There is no `atime` key, so repeated queries on
//! an unmodified file return identical maps.

use crate::error::{BridgeError, Result};
use crate::name_codec::HostString;
use nix::sys::stat::{FileStat, SFlag};
use std::collections::TryReserveError;
use std::fmt;
use std::str::FromStr;

/// The seven file kinds a status can describe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Regular file
    Reg,
    /// Directory
    Dir,
    /// Character device
    Chr,
    /// Block device
    Blk,
    /// Named pipe
    Fifo,
    /// Symbolic link
    Lnk,
    /// Unix domain socket
    Sock,
}

impl Kind {
    /// Classify the file-type bits of an `st_mode`
    ///
    /// Returns `None` when the bits match none of the known kinds.
    #[must_use]
    #[allow(clippy::unnecessary_cast)] // mode_t is u16 on some platforms
    pub fn from_mode(mode: u32) -> Option<Self> {
        match mode & (libc::S_IFMT as u32) {
            m if m == libc::S_IFREG as u32 => Some(Self::Reg),
            m if m == libc::S_IFDIR as u32 => Some(Self::Dir),
            m if m == libc::S_IFCHR as u32 => Some(Self::Chr),
            m if m == libc::S_IFBLK as u32 => Some(Self::Blk),
            m if m == libc::S_IFIFO as u32 => Some(Self::Fifo),
            m if m == libc::S_IFLNK as u32 => Some(Self::Lnk),
            m if m == libc::S_IFSOCK as u32 => Some(Self::Sock),
            _ => None,
        }
    }

    /// Wire name of the kind
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reg => "REG",
            Self::Dir => "DIR",
            Self::Chr => "CHR",
            Self::Blk => "BLK",
            Self::Fifo => "FIFO",
            Self::Lnk => "LNK",
            Self::Sock => "SOCK",
        }
    }

    /// Whether the kind carries a device number (`rdev`)
    #[must_use]
    pub const fn is_device(self) -> bool {
        matches!(self, Self::Chr | Self::Blk)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kinds `mknod` may create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialKind {
    /// Block device
    Blk,
    /// Character device
    Chr,
    /// Named pipe
    Fifo,
    /// Socket inode
    Sock,
}

impl SpecialKind {
    /// File-type bits passed to `mknod(2)`
    #[must_use]
    pub const fn type_flag(self) -> SFlag {
        match self {
            Self::Blk => SFlag::S_IFBLK,
            Self::Chr => SFlag::S_IFCHR,
            Self::Fifo => SFlag::S_IFIFO,
            Self::Sock => SFlag::S_IFSOCK,
        }
    }
}

impl From<SpecialKind> for Kind {
    fn from(kind: SpecialKind) -> Self {
        match kind {
            SpecialKind::Blk => Self::Blk,
            SpecialKind::Chr => Self::Chr,
            SpecialKind::Fifo => Self::Fifo,
            SpecialKind::Sock => Self::Sock,
        }
    }
}

impl FromStr for SpecialKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "BLK" => Ok(Self::Blk),
            "CHR" => Ok(Self::Chr),
            "FIFO" => Ok(Self::Fifo),
            "SOCK" => Ok(Self::Sock),
            other => Err(format!(
                "unknown special file kind '{other}' (expected BLK, CHR, FIFO or SOCK)"
            )),
        }
    }
}

/// The closed set of keys a [`FileStatus`] may contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKey {
    /// `*kind*`
    Kind,
    /// `mode`
    Mode,
    /// `dev`
    Dev,
    /// `ino`
    Ino,
    /// `nlink`
    Nlink,
    /// `uid`
    Uid,
    /// `gid`
    Gid,
    /// `rdev`
    Rdev,
    /// `size`
    Size,
    /// `mtime`
    Mtime,
    /// `ctime`
    Ctime,
}

impl StatusKey {
    /// Every key, in map order
    pub const ALL: [Self; 11] = [
        Self::Kind,
        Self::Mode,
        Self::Dev,
        Self::Ino,
        Self::Nlink,
        Self::Uid,
        Self::Gid,
        Self::Rdev,
        Self::Size,
        Self::Mtime,
        Self::Ctime,
    ];

    /// Wire name of the key
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kind => "*kind*",
            Self::Mode => "mode",
            Self::Dev => "dev",
            Self::Ino => "ino",
            Self::Nlink => "nlink",
            Self::Uid => "uid",
            Self::Gid => "gid",
            Self::Rdev => "rdev",
            Self::Size => "size",
            Self::Mtime => "mtime",
            Self::Ctime => "ctime",
        }
    }

    /// Look a key up by wire name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, immutable attribute map describing one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    kind: Kind,
    entries: Vec<(StatusKey, String)>,
}

impl FileStatus {
    /// The `*kind*` discriminator
    #[must_use]
    pub const fn kind(&self) -> Kind {
        self.kind
    }

    /// Value for `key`, if present
    #[must_use]
    pub fn get(&self, key: StatusKey) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value for a wire key name such as `"size"` or `"*kind*"`
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&str> {
        StatusKey::from_name(name).and_then(|key| self.get(key))
    }

    /// Numeric value for `key`; `None` for `*kind*` or an absent key
    #[must_use]
    pub fn get_i64(&self, key: StatusKey) -> Option<i64> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Whether `key` is present
    #[must_use]
    pub fn contains(&self, key: StatusKey) -> bool {
        self.get(key).is_some()
    }

    /// `(wire key, value)` pairs in map order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: every status carries at least `*kind*`
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builds the entries of a [`FileStatus`], failing on allocation errors
struct StatusBuilder {
    entries: Vec<(StatusKey, String)>,
}

impl StatusBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn insert_str(&mut self, key: StatusKey, value: &str) -> std::result::Result<(), TryReserveError> {
        self.entries.try_reserve(1)?;
        let mut text = String::new();
        text.try_reserve_exact(value.len())?;
        text.push_str(value);
        self.insert_owned(key, text);
        Ok(())
    }

    fn insert_num(&mut self, key: StatusKey, value: i64) -> std::result::Result<(), TryReserveError> {
        self.insert_str(key, &value.to_string())
    }

    fn insert_owned(&mut self, key: StatusKey, text: String) {
        debug_assert!(
            self.entries.iter().all(|(k, _)| *k != key),
            "duplicate status key {key}"
        );
        self.entries.push((key, text));
    }
}

/// Encode a native status structure as a [`FileStatus`]
///
/// # Arguments
///
/// * `st` - Status returned by `stat(2)` or `lstat(2)`
/// * `op` - Operation name for error reporting
/// * `path` - Path that was queried, for error reporting
///
/// # Errors
///
/// This function will return an error if:
/// - The file-type bits match none of the seven kinds ([`BridgeError::InvalidFileType`])
/// - Any value cannot be allocated ([`BridgeError::ResourceExhaustion`]); no
///   partial map is returned
#[allow(clippy::cast_possible_wrap, clippy::cast_lossless, clippy::unnecessary_cast)] // C-style `(long long)` casts
pub fn build_status(st: &FileStat, op: &'static str, path: &HostString) -> Result<FileStatus> {
    let mode = st.st_mode as u32;
    let kind = Kind::from_mode(mode).ok_or_else(|| BridgeError::InvalidFileType {
        op,
        path: path.clone(),
        mode,
    })?;

    let build = || -> std::result::Result<Vec<(StatusKey, String)>, TryReserveError> {
        let mut b = StatusBuilder::new();
        b.insert_str(StatusKey::Kind, kind.as_str())?;
        b.insert_num(StatusKey::Mode, (mode & !(libc::S_IFMT as u32)) as i64)?;
        b.insert_num(StatusKey::Dev, st.st_dev as i64)?;
        b.insert_num(StatusKey::Ino, st.st_ino as i64)?;
        b.insert_num(StatusKey::Nlink, st.st_nlink as i64)?;
        b.insert_num(StatusKey::Uid, st.st_uid as i64)?;
        b.insert_num(StatusKey::Gid, st.st_gid as i64)?;
        if kind.is_device() {
            b.insert_num(StatusKey::Rdev, st.st_rdev as i64)?;
        }
        b.insert_num(StatusKey::Size, st.st_size as i64)?;
        b.insert_num(StatusKey::Mtime, st.st_mtime as i64)?;
        b.insert_num(StatusKey::Ctime, st.st_ctime as i64)?;
        Ok(b.entries)
    };

    let entries = build().map_err(|source| BridgeError::ResourceExhaustion { op, source })?;
    Ok(FileStatus { kind, entries })
}
