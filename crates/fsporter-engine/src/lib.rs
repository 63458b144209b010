//! Transfer orchestration engine for fsporter
//!
//! This crate turns a [`TransferRequest`] into filesystem work: it
//! classifies the source, validates the endpoint combination, walks
//! directory trees depth-first for copies, delegates moves to the backend
//! in a single call, and aggregates everything into a [`TransferResult`].
//! It includes:
//!
//! - **Engine**: [`TransferEngine`], generic over the `FileSystem` backend
//! - **Requests**: endpoint descriptors, operation options, filters, and
//!   progress callbacks bundled per transfer
//! - **Retry policy**: per-entry retry/skip/abort decisions driven by a
//!   caller-supplied error filter
//!
//! # Examples
//!
//! ```rust
//! use fsporter_engine::{TransferEngine, TransferRequest};
//! use fsporter_fs::MemoryFileSystem;
//! use fsporter_types::{CopyOptions, Operation, PathDescriptor};
//!
//! let fs = MemoryFileSystem::new();
//! fs.add_file("/data/report.txt", b"quarterly numbers");
//!
//! let engine = TransferEngine::with_filesystem(fs);
//! let request = TransferRequest::with_descriptors(
//!     PathDescriptor::long_full("/data/report.txt"),
//!     PathDescriptor::long_full("/archive/report.txt"),
//!     Operation::Copy(CopyOptions::new()),
//! );
//! let result = engine.execute(&request)?;
//! assert_eq!(result.total_files, 1);
//! assert_eq!(result.total_bytes, 17);
//! # Ok::<(), fsporter_types::TransferError>(())
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod engine;
pub mod request;
pub mod retry;

mod tree;

// Re-export commonly used types
pub use engine::TransferEngine;
pub use request::{
    EntryFilter, EnumerationFilters, ProgressCallback, ProgressDecision, TransferRequest,
};
pub use retry::{Attempt, ErrorFilter, RetryPolicy, RetryVerdict};
