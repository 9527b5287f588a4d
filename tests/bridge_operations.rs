//! End-to-end behavior of the bridge facade against a real filesystem

use fsbridge::{Bridge, BridgeError, HostString, Kind, StatusKey};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, setgid, setuid, ForkResult, Gid, Uid};
use std::collections::HashSet;
use std::fs::{self, Permissions};
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::Path;
use std::os::unix::net::UnixListener;
use tempfile::TempDir;

mod common;
use common::{host, host_child};

// ============================================================================
// Status
// ============================================================================

#[test]
fn test_regular_file_status_reports_size() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("data.bin");
    fs::write(&file, vec![7u8; 4321]).unwrap();

    let status = Bridge::default().get_status(&host(&file)).unwrap();
    assert_eq!(status.kind(), Kind::Reg);
    assert_eq!(status.get(StatusKey::Kind), Some("REG"));
    assert_eq!(status.get_i64(StatusKey::Size), Some(4321));
    assert_eq!(
        status.get_i64(StatusKey::Ino),
        Some(fs::metadata(&file).unwrap().ino() as i64)
    );
}

#[test]
fn test_status_is_stable_for_unmodified_file() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("f");
    fs::write(&file, b"contents").unwrap();
    let bridge = Bridge::default();

    let first = bridge.get_status(&host(&file)).unwrap();
    // Reading the file touches only atime, which is never reported
    let _ = fs::read(&file).unwrap();
    let second = bridge.get_status(&host(&file)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_socket_status_has_no_rdev() {
    let temp_dir = TempDir::new().unwrap();
    let socket = temp_dir.path().join("sock");
    let _listener = UnixListener::bind(&socket).unwrap();

    let status = Bridge::default().get_status(&host(&socket)).unwrap();
    assert_eq!(status.get(StatusKey::Kind), Some("SOCK"));
    assert!(!status.contains(StatusKey::Rdev));
}

#[test]
fn test_device_status_has_rdev() {
    let status = Bridge::default().get_status(&host("/dev/null")).unwrap();
    assert_eq!(status.kind(), Kind::Chr);
    assert!(status.contains(StatusKey::Rdev));
}

#[test]
fn test_lstat_does_not_follow_symlink() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("file");
    fs::write(&file, b"x").unwrap();
    let link = temp_dir.path().join("link");
    std::os::unix::fs::symlink(&file, &link).unwrap();
    let bridge = Bridge::default();

    assert_eq!(bridge.get_link_status(&host(&link)).unwrap().kind(), Kind::Lnk);
    assert_eq!(bridge.get_status(&host(&link)).unwrap().kind(), Kind::Reg);
}

#[test]
fn test_status_of_missing_path() {
    let temp_dir = TempDir::new().unwrap();
    let missing = host(temp_dir.path().join("missing"));

    match Bridge::default().get_status(&missing).unwrap_err() {
        BridgeError::NativeCall {
            op, path, errno, ..
        } => {
            assert_eq!(op, "stat");
            assert_eq!(path, Some(missing));
            assert_eq!(errno, Errno::ENOENT);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// ============================================================================
// Directories
// ============================================================================

#[test]
fn test_listing_excludes_dot_entries_and_keeps_raw_names() {
    let temp_dir = TempDir::new().unwrap();
    let bridge = Bridge::default();
    let raw_name: &[u8] = b"caf\xe9\xff";
    bridge
        .make_directory(&host_child(temp_dir.path(), raw_name))
        .unwrap();
    fs::write(temp_dir.path().join("plain"), b"").unwrap();

    let entries = bridge.list_directory(&host(temp_dir.path())).unwrap();
    let names: HashSet<Vec<u8>> = entries
        .iter()
        .map(|e| fsbridge::name_codec::decode_bytes(&e.name))
        .collect();

    assert_eq!(entries.len(), 2);
    assert!(names.contains(raw_name));
    assert!(names.contains(&b"plain"[..]));
    assert!(!names.contains(&b"."[..]) && !names.contains(&b".."[..]));

    let plain = entries
        .iter()
        .find(|e| e.name.to_string() == "plain")
        .unwrap();
    assert_eq!(
        plain.ino,
        fs::metadata(temp_dir.path().join("plain")).unwrap().ino()
    );
}

#[test]
fn test_listing_a_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("file");
    fs::write(&file, b"").unwrap();

    let err = Bridge::default().list_directory(&host(&file)).unwrap_err();
    assert_eq!(err.op(), Some("readDir"));
    assert_eq!(err.errno(), Some(Errno::ENOTDIR));
}

#[test]
fn test_make_directory_uses_configured_mode() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("new");
    let bridge = Bridge::default();

    bridge.make_directory(&host(&dir)).unwrap();
    assert!(fs::metadata(&dir).unwrap().is_dir());
    assert_eq!(fs::metadata(&dir).unwrap().mode() & 0o077, 0);
    assert_eq!(
        bridge.make_directory(&host(&dir)).unwrap_err().errno(),
        Some(Errno::EEXIST)
    );
}

// ============================================================================
// Links
// ============================================================================

#[test]
fn test_symlink_target_round_trips_every_high_byte() {
    let temp_dir = TempDir::new().unwrap();
    let bridge = Bridge::default();
    let target_bytes: Vec<u8> = (0x80..=0xffu8).collect();
    let target = fsbridge::name_codec::encode(&target_bytes);
    let link = host(temp_dir.path().join("link"));

    bridge.create_symlink(&target, &link).unwrap();
    let read_back = bridge.read_symlink_target(&link).unwrap();
    assert_eq!(read_back, target);
    assert_eq!(fsbridge::name_codec::decode_bytes(&read_back), target_bytes);
}

#[test]
fn test_symlink_target_longer_than_initial_buffer() {
    let temp_dir = TempDir::new().unwrap();
    let bridge = Bridge::default();
    let long_target = "segment/".repeat(100);
    let link = host(temp_dir.path().join("link"));

    bridge
        .create_symlink(&long_target.as_str().into(), &link)
        .unwrap();
    assert_eq!(
        bridge.read_symlink_target(&link).unwrap().to_string(),
        long_target
    );
}

// ============================================================================
// Handles
// ============================================================================

#[test]
fn test_write_then_reopen_and_read() {
    let temp_dir = TempDir::new().unwrap();
    let bridge = Bridge::default();
    let path = host(temp_dir.path().join("out"));
    let payload: Vec<u8> = (0..100_000u32).map(|i| (i * 7 % 256) as u8).collect();

    let output = bridge.open_for_write(&path).unwrap();
    for chunk in payload.chunks(4096) {
        bridge.write_chunk(output, chunk, 0, chunk.len()).unwrap();
    }
    bridge.close_handle(output).unwrap();

    let input = bridge.open_for_read(&path).unwrap();
    let mut buffer = vec![0u8; payload.len() + 10];
    let n = bridge
        .read_chunk(input, &mut buffer, 0, payload.len() + 10)
        .unwrap();
    assert_eq!(n, payload.len());
    assert_eq!(&buffer[..n], &payload[..]);
    assert_eq!(bridge.read_chunk(input, &mut buffer, 0, 10).unwrap(), 0);
    bridge.close_handle(input).unwrap();
}

#[test]
fn test_open_for_write_never_truncates() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("existing");
    fs::write(&file, b"precious").unwrap();

    let err = Bridge::default().open_for_write(&host(&file)).unwrap_err();
    assert!(matches!(
        err,
        BridgeError::NativeCall {
            op: "open",
            errno: Errno::EEXIST,
            ..
        }
    ));
    assert_eq!(fs::read(&file).unwrap(), b"precious");
}

#[test]
fn test_read_chunk_rejects_range_outside_buffer() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("f");
    fs::write(&file, b"abc").unwrap();
    let bridge = Bridge::default();
    let handle = bridge.open_for_read(&host(&file)).unwrap();

    let mut buffer = [0u8; 4];
    let err = bridge.read_chunk(handle, &mut buffer, 2, 3).unwrap_err();
    assert!(matches!(err, BridgeError::Validation { op: "read", .. }));
    bridge.close_handle(handle).unwrap();
}

// ============================================================================
// Access-time policy
// ============================================================================

const NOBODY: u32 = 65534;

/// Open and read up to 64 bytes of `path` with the default bridge
fn read_with_default_bridge(path: &HostString) -> fsbridge::Result<usize> {
    let bridge = Bridge::default();
    let handle = bridge.open_for_read(path)?;
    let mut buffer = [0u8; 64];
    let length = buffer.len();
    let read = bridge.read_chunk(handle, &mut buffer, 0, length);
    bridge.close_handle(handle)?;
    read
}

#[test]
fn test_open_for_read_of_file_owned_by_another_user() {
    let bridge = Bridge::default();
    assert!(bridge.config().no_atime);
    let euid = bridge.effective_user_id();

    if euid != 0 {
        // O_NOATIME on a file we do not own fails with EPERM and must fall back
        let passwd = Path::new("/etc/passwd");
        let meta = fs::metadata(passwd).unwrap();
        if meta.uid() == euid {
            return;
        }
        let n = read_with_default_bridge(&host(passwd)).unwrap();
        assert!(n > 0);
        assert_eq!(n, (meta.len() as usize).min(64));
        return;
    }

    // As root O_NOATIME always succeeds, so read as nobody in a child process
    let temp_dir = TempDir::new().unwrap();
    fs::set_permissions(temp_dir.path(), Permissions::from_mode(0o755)).unwrap();
    let file = temp_dir.path().join("root-owned");
    fs::write(&file, b"abc").unwrap();
    fs::set_permissions(&file, Permissions::from_mode(0o644)).unwrap();
    let path = host(&file);

    // SAFETY: the child only makes system calls and leaves through `_exit`.
    match unsafe { fork() }.unwrap() {
        ForkResult::Child => {
            let dropped = setgid(Gid::from_raw(NOBODY)).and_then(|()| setuid(Uid::from_raw(NOBODY)));
            let code = match (dropped, read_with_default_bridge(&path)) {
                (Ok(()), Ok(3)) => 0,
                _ => 1,
            };
            // SAFETY: terminates the forked child without running the harness.
            unsafe { libc::_exit(code) }
        }
        ForkResult::Parent { child } => {
            assert_eq!(waitpid(child, None).unwrap(), WaitStatus::Exited(child, 0));
        }
    }
}

// ============================================================================
// Attributes
// ============================================================================

#[test]
fn test_change_mode_and_times() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("f");
    fs::write(&file, b"").unwrap();
    let bridge = Bridge::default();

    bridge.change_mode(&host(&file), 0o640).unwrap();
    bridge
        .set_times(&host(&file), 1_000_000_000, 1_234_567_890)
        .unwrap();

    let status = bridge.get_status(&host(&file)).unwrap();
    assert_eq!(status.get_i64(StatusKey::Mode), Some(0o640));
    assert_eq!(status.get_i64(StatusKey::Mtime), Some(1_234_567_890));
    assert_eq!(fs::metadata(&file).unwrap().atime(), 1_000_000_000);
}

#[test]
fn test_change_owner_to_self_is_allowed() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("f");
    fs::write(&file, b"").unwrap();
    let link = temp_dir.path().join("link");
    std::os::unix::fs::symlink(&file, &link).unwrap();
    let bridge = Bridge::default();
    let uid = i64::from(bridge.effective_user_id());

    bridge.change_owner(&host(&file), uid, -1).unwrap();
    bridge.change_link_owner(&host(&link), -1, -1).unwrap();
    assert_eq!(i64::from(fs::metadata(&file).unwrap().uid()), uid);
}

#[test]
fn test_change_owner_rejects_out_of_range_ids() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("f");
    fs::write(&file, b"").unwrap();

    let err = Bridge::default()
        .change_owner(&host(&file), i64::from(u32::MAX) + 1, -1)
        .unwrap_err();
    assert!(matches!(err, BridgeError::Validation { op: "chown", .. }));
}

#[test]
fn test_make_fifo_and_reject_unknown_kind() {
    let temp_dir = TempDir::new().unwrap();
    let bridge = Bridge::default();
    let fifo = temp_dir.path().join("fifo");
    let bogus = temp_dir.path().join("bogus");

    bridge
        .make_special_file(&host(&fifo), &"FIFO".into(), 0o600, 0)
        .unwrap();
    assert_eq!(bridge.get_link_status(&host(&fifo)).unwrap().kind(), Kind::Fifo);

    let err = bridge
        .make_special_file(&host(&bogus), &"BOGUS".into(), 0o600, 0)
        .unwrap_err();
    assert!(matches!(err, BridgeError::Validation { op: "mknod", .. }));
    assert!(fs::symlink_metadata(&bogus).is_err());
}

// ============================================================================
// Process queries
// ============================================================================

#[test]
fn test_describe_error_code_for_enoent() {
    let message = Bridge::default().describe_error_code(2).to_string();
    assert!(message.contains("No such file"), "got {message}");
}

#[test]
fn test_error_display_names_operation_and_path() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing");

    let err = Bridge::default().get_link_status(&host(&missing)).unwrap_err();
    let text = err.to_string();
    assert!(text.starts_with("lstat '"), "got {text}");
    assert!(text.contains("missing"), "got {text}");
    assert!(text.ends_with("(errno 2)"), "got {text}");
}
