//! Command-line interface definitions
//!
//! Arguments are grouped by the component that consumes them: the bridge
//! tuning knobs live in [`BridgeConfig`], logging in [`OutputConfig`], and
//! each subcommand maps onto one bridge operation (or a short sequence of
//! them for `cat` and `copy`).

use crate::bridge::{Bridge, NativeHandle};
use crate::config::{parse_octal, BridgeConfig};
use crate::name_codec::{self, HostString};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::io::Write;

/// Default chunk size for `cat` and `copy`
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Inspect and manipulate files through the native bridge
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Operation to perform
    #[command(subcommand)]
    pub command: Command,

    /// Bridge tuning and creation policy
    #[command(flatten)]
    pub bridge: BridgeConfig,

    /// Output and logging configuration
    #[command(flatten)]
    pub output: OutputConfig,
}

/// Output and logging configuration
///
/// Used by: `main()` when installing the tracing subscriber
#[derive(clap::Args, Debug, Clone)]
#[command(next_help_heading = "Output Options")]
pub struct OutputConfig {
    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress all logging except errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl OutputConfig {
    /// Default log filter directive when `RUST_LOG` is unset
    #[must_use]
    pub const fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// One subcommand per bridge operation
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List a directory as "inode<TAB>name" lines
    Ls {
        /// Directory to list
        path: OsString,
    },
    /// Show file status, following symlinks
    Stat {
        /// File to query
        path: OsString,
    },
    /// Show file status without following symlinks
    Lstat {
        /// File to query
        path: OsString,
    },
    /// Print the target of a symbolic link
    Readlink {
        /// Symbolic link to read
        path: OsString,
    },
    /// Create a symbolic link
    Symlink {
        /// Contents of the link (need not exist)
        target: OsString,
        /// Where to create the link
        link_path: OsString,
    },
    /// Create a hard link
    Link {
        /// Existing file
        existing: OsString,
        /// New name for it
        new_path: OsString,
    },
    /// Create a directory with the configured mode
    Mkdir {
        /// Directory to create
        path: OsString,
    },
    /// Change permission bits
    Chmod {
        /// New permission bits (octal)
        #[arg(value_parser = parse_octal)]
        mode: u32,
        /// File to change
        path: OsString,
    },
    /// Change ownership, following symlinks (-1 leaves an id unchanged)
    Chown {
        /// New owner id
        #[arg(allow_negative_numbers = true)]
        uid: i64,
        /// New group id
        #[arg(allow_negative_numbers = true)]
        gid: i64,
        /// File to change
        path: OsString,
    },
    /// Change ownership of a symlink itself (-1 leaves an id unchanged)
    Lchown {
        /// New owner id
        #[arg(allow_negative_numbers = true)]
        uid: i64,
        /// New group id
        #[arg(allow_negative_numbers = true)]
        gid: i64,
        /// Link to change
        path: OsString,
    },
    /// Set access and modification times (seconds since the epoch)
    Touch {
        /// Access time
        #[arg(long, allow_negative_numbers = true)]
        atime: i64,
        /// Modification time
        #[arg(long, allow_negative_numbers = true)]
        mtime: i64,
        /// File to change
        path: OsString,
    },
    /// Create a device node, FIFO or socket node
    Mknod {
        /// Node to create
        path: OsString,
        /// One of BLK, CHR, FIFO, SOCK
        kind: String,
        /// Permission bits (octal)
        #[arg(long, default_value = "644", value_parser = parse_octal)]
        mode: u32,
        /// Device number for BLK and CHR
        #[arg(long, default_value_t = 0)]
        dev: u64,
    },
    /// Write a file's contents to stdout
    Cat {
        /// File to read
        path: OsString,
        /// Bytes per read
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },
    /// Copy a file's contents into a new file
    Copy {
        /// File to read
        source: OsString,
        /// File to create (must not exist)
        destination: OsString,
        /// Bytes per read/write
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },
    /// Print the name of the terminal open on a descriptor
    Tty {
        /// Descriptor to query
        #[arg(default_value_t = 0)]
        fd: i32,
    },
    /// Print the message for a native error code
    Strerror {
        /// Error code
        #[arg(allow_negative_numbers = true)]
        code: i32,
    },
    /// Print the effective user id
    Euid,
    /// Set the umask and print the previous one (octal)
    Umask {
        /// New mask (octal)
        #[arg(value_parser = parse_octal)]
        mask: u32,
    },
}

fn host(path: &OsString) -> HostString {
    name_codec::encode_os(path)
}

fn write_line(out: &mut impl Write, bytes: &[u8]) -> std::io::Result<()> {
    out.write_all(bytes)?;
    out.write_all(b"\n")
}

/// Execute one command against `bridge`, writing results to `out`
///
/// Names and link targets are written as their raw bytes.
///
/// # Errors
///
/// Returns the bridge error with the failing operation as context, or an
/// I/O error writing to `out`.
pub fn run(bridge: &Bridge, command: &Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Ls { path } => {
            for entry in bridge.list_directory(&host(path))? {
                write!(out, "{}\t", entry.ino)?;
                write_line(out, &name_codec::decode_bytes(&entry.name))?;
            }
        }
        Command::Stat { path } => print_status(out, &bridge.get_status(&host(path))?)?,
        Command::Lstat { path } => print_status(out, &bridge.get_link_status(&host(path))?)?,
        Command::Readlink { path } => {
            let target = bridge.read_symlink_target(&host(path))?;
            write_line(out, &name_codec::decode_bytes(&target))?;
        }
        Command::Symlink { target, link_path } => {
            bridge.create_symlink(&host(target), &host(link_path))?;
        }
        Command::Link { existing, new_path } => {
            bridge.create_hard_link(&host(existing), &host(new_path))?;
        }
        Command::Mkdir { path } => bridge.make_directory(&host(path))?,
        Command::Chmod { mode, path } => bridge.change_mode(&host(path), *mode)?,
        Command::Chown { uid, gid, path } => bridge.change_owner(&host(path), *uid, *gid)?,
        Command::Lchown { uid, gid, path } => {
            bridge.change_link_owner(&host(path), *uid, *gid)?;
        }
        Command::Touch { atime, mtime, path } => bridge.set_times(&host(path), *atime, *mtime)?,
        Command::Mknod {
            path,
            kind,
            mode,
            dev,
        } => bridge.make_special_file(&host(path), &HostString::from(kind.as_str()), *mode, *dev)?,
        Command::Cat { path, chunk_size } => {
            let input = bridge.open_for_read(&host(path))?;
            let copied = stream(bridge, input, *chunk_size, |chunk| {
                out.write_all(chunk).context("writing to stdout")
            });
            let closed = bridge.close_handle(input);
            copied?;
            closed?;
        }
        Command::Copy {
            source,
            destination,
            chunk_size,
        } => copy_file(bridge, &host(source), &host(destination), *chunk_size)?,
        Command::Tty { fd } => {
            let name = bridge.terminal_name(NativeHandle::from_raw(*fd))?;
            write_line(out, &name_codec::decode_bytes(&name))?;
        }
        Command::Strerror { code } => writeln!(out, "{}", bridge.describe_error_code(*code))?,
        Command::Euid => writeln!(out, "{}", bridge.effective_user_id())?,
        Command::Umask { mask } => writeln!(out, "{:04o}", bridge.set_umask(*mask))?,
    }
    Ok(())
}

fn print_status(out: &mut impl Write, status: &crate::FileStatus) -> std::io::Result<()> {
    for (key, value) in status.iter() {
        writeln!(out, "{key}={value}")?;
    }
    Ok(())
}

/// Feed `handle` to `sink` in chunks until end of stream
fn stream<F>(bridge: &Bridge, handle: NativeHandle, chunk_size: usize, mut sink: F) -> Result<u64>
where
    F: FnMut(&[u8]) -> Result<()>,
{
    anyhow::ensure!(chunk_size > 0, "chunk size must be positive");
    let mut buffer = vec![0u8; chunk_size];
    let mut total = 0u64;
    loop {
        let n = bridge.read_chunk(handle, &mut buffer, 0, chunk_size)?;
        if n == 0 {
            return Ok(total);
        }
        sink(&buffer[..n])?;
        total += n as u64;
    }
}

fn copy_file(
    bridge: &Bridge,
    source: &HostString,
    destination: &HostString,
    chunk_size: usize,
) -> Result<()> {
    let input = bridge.open_for_read(source)?;
    let output = match bridge.open_for_write(destination) {
        Ok(handle) => handle,
        Err(e) => {
            if let Err(close_err) = bridge.close_handle(input) {
                tracing::warn!("closing {} after failed open: {}", source, close_err);
            }
            return Err(e.into());
        }
    };

    let copied = stream(bridge, input, chunk_size, |chunk| {
        bridge.write_chunk(output, chunk, 0, chunk.len())?;
        Ok(())
    });
    let closed_in = bridge.close_handle(input);
    let closed_out = bridge.close_handle(output);

    let total = copied.with_context(|| format!("copying '{source}' to '{destination}'"))?;
    closed_in?;
    closed_out?;
    tracing::info!("copied {} bytes from {} to {}", total, source, destination);
    Ok(())
}
