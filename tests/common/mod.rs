//! Shared helpers for integration tests

use fsbridge::name_codec;
use fsbridge::HostString;
use std::path::Path;

/// Host string for a filesystem path, byte for byte
pub fn host<P: AsRef<Path>>(path: P) -> HostString {
    name_codec::encode_os(path.as_ref().as_os_str())
}

/// Host string for `name` inside `dir`, built from raw bytes
#[allow(dead_code)]
pub fn host_child(dir: &Path, name: &[u8]) -> HostString {
    let mut bytes = dir.as_os_str().as_encoded_bytes().to_vec();
    bytes.push(b'/');
    bytes.extend_from_slice(name);
    name_codec::encode(&bytes)
}
