//! Core data types for fsporter
//!
//! This module provides the entry classification model, the operation tag,
//! and the aggregate result a transfer folds its outcome into.

use crate::config::{CopyOptions, MoveOptions};
use crate::error::TransferError;
use std::path::PathBuf;
use std::time::{Duration, Instant};

// Serde is imported conditionally through cfg_attr

/// Unique identifier for transfer requests
pub type RequestId = uuid::Uuid;

/// Classification and attributes of one filesystem entry
///
/// The capability flags are deliberately independent: a directory symbolic
/// link reports both `is_directory` and `is_symlink`, matching how reparse
/// attributes compose on real filesystems.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntryInfo {
    /// Path of the entry
    pub path: PathBuf,
    /// Byte length for files; zero for directories
    pub file_size: u64,
    /// Entry is a directory (or a link whose target is a directory)
    pub is_directory: bool,
    /// Entry is a symbolic link
    pub is_symlink: bool,
    /// Entry is a reparse point (symbolic link, junction, or mount point)
    pub is_reparse_point: bool,
    /// Entry carries the read-only attribute
    pub read_only: bool,
}

impl EntryInfo {
    /// Create an entry describing a regular file
    pub fn file(path: impl Into<PathBuf>, file_size: u64) -> Self {
        Self {
            path: path.into(),
            file_size,
            is_directory: false,
            is_symlink: false,
            is_reparse_point: false,
            read_only: false,
        }
    }

    /// Create an entry describing a directory
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file_size: 0,
            is_directory: true,
            is_symlink: false,
            is_reparse_point: false,
            read_only: false,
        }
    }

    /// Check if the entry is a non-directory
    pub fn is_file(&self) -> bool {
        !self.is_directory
    }

    /// Get the final path component
    pub fn file_name(&self) -> Option<&std::ffi::OsStr> {
        self.path.file_name()
    }
}

/// The kind of entry a symbolic link points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LinkKind {
    /// Link to a file
    File,
    /// Link to a directory
    Directory,
}

/// Target information read from a symbolic link or reparse point
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkTarget {
    /// Target path exactly as stored by the filesystem (substitute name)
    pub target: PathBuf,
    /// User-facing rendition of the target (print name)
    pub print_name: String,
    /// Whether the link points at a file or a directory
    pub kind: LinkKind,
}

/// The requested transfer operation with its option set
///
/// Exactly one flag set is meaningful per transfer; the variant carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operation {
    /// Duplicate the source at the destination
    Copy(CopyOptions),
    /// Relocate the source to the destination
    Move(MoveOptions),
}

impl Operation {
    /// Check if this is a copy
    pub fn is_copy(&self) -> bool {
        matches!(self, Self::Copy(_))
    }

    /// Check if this is a move
    pub fn is_move(&self) -> bool {
        matches!(self, Self::Move(_))
    }

    /// Get the copy options when this is a copy
    pub fn copy_options(&self) -> Option<&CopyOptions> {
        match self {
            Self::Copy(options) => Some(options),
            Self::Move(_) => None,
        }
    }

    /// Get the move options when this is a move
    pub fn move_options(&self) -> Option<&MoveOptions> {
        match self {
            Self::Copy(_) => None,
            Self::Move(options) => Some(options),
        }
    }
}

/// Opaque handle to a caller-owned filesystem transaction
///
/// The engine never opens, commits, or rolls back the transaction; the
/// handle is passed through to every per-entry operation unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransactionHandle(u64);

impl TransactionHandle {
    /// Wrap a raw transaction identifier
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw transaction identifier
    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

/// Aggregate outcome of one transfer
///
/// Created fresh at the start of an orchestration call, mutated only by that
/// call, and returned to the caller as a snapshot. The folder/file counters
/// only ever grow while a transfer runs.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransferResult {
    /// Number of directories transferred
    pub total_folders: u32,
    /// Number of files transferred
    pub total_files: u32,
    /// Number of content bytes transferred
    pub total_bytes: u64,
    /// Stable status code of the last recorded error; zero when clean
    pub error_code: i32,
    /// Message of the last recorded error
    pub last_error: Option<String>,
    /// The transfer was a copy
    pub is_copy: bool,
    /// The transfer was a move
    pub is_move: bool,
    /// The source was a directory
    pub is_directory: bool,
    /// The source was a file
    pub is_file: bool,
    /// The transfer stopped on a cancellation signal
    pub cancelled: bool,
    /// Wall time spent inside the orchestration call
    pub elapsed: Duration,
    #[cfg_attr(feature = "serde", serde(skip))]
    timer: Option<Instant>,
}

impl TransferResult {
    /// Create a fresh result tagged with the operation and source classification
    pub fn new(operation: &Operation, is_directory: bool) -> Self {
        Self {
            total_folders: 0,
            total_files: 0,
            total_bytes: 0,
            error_code: 0,
            last_error: None,
            is_copy: operation.is_copy(),
            is_move: operation.is_move(),
            is_directory,
            is_file: !is_directory,
            cancelled: false,
            elapsed: Duration::ZERO,
            timer: None,
        }
    }

    /// Start the monotonic elapsed-time clock
    ///
    /// Starting an already-running clock is a no-op.
    pub fn start_clock(&mut self) {
        if self.timer.is_none() {
            self.timer = Some(Instant::now());
        }
    }

    /// Stop the clock and fold the measured span into `elapsed`
    ///
    /// Stopping a stopped clock is a no-op.
    pub fn stop_clock(&mut self) {
        if let Some(started) = self.timer.take() {
            self.elapsed += started.elapsed();
        }
    }

    /// Record one transferred file of the given byte length
    pub fn add_file(&mut self, bytes: u64) {
        self.total_files += 1;
        self.total_bytes += bytes;
    }

    /// Record one transferred directory
    pub fn add_folder(&mut self) {
        self.total_folders += 1;
    }

    /// Record an error without terminating the transfer
    pub fn record_error(&mut self, error: &TransferError) {
        self.error_code = error.code();
        self.last_error = Some(error.to_string());
    }

    /// Check if any error was recorded
    pub fn has_error(&self) -> bool {
        self.error_code != 0
    }

    /// Total entries transferred, directories and files combined
    pub fn entries_transferred(&self) -> u64 {
        u64::from(self.total_folders) + u64::from(self.total_files)
    }
}

/// Aggregate counted beneath a directory root, excluding the root itself
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeCensus {
    /// Number of files beneath the root
    pub files: u64,
    /// Number of directories beneath the root
    pub directories: u64,
    /// Total content bytes beneath the root
    pub bytes: u64,
}

impl TreeCensus {
    /// Create an empty census
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one file of the given byte length
    pub fn add_file(&mut self, bytes: u64) {
        self.files += 1;
        self.bytes += bytes;
    }

    /// Count one directory
    pub fn add_directory(&mut self) {
        self.directories += 1;
    }

    /// Total entries counted, directories and files combined
    pub fn total_entries(&self) -> u64 {
        self.files + self.directories
    }
}
