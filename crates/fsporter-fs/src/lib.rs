//! Filesystem backends for the fsporter transfer engine
//!
//! This crate provides the concrete [`FileSystem`](fsporter_types::FileSystem)
//! implementations the engine orchestrates:
//!
//! - **Standard backend**: [`StdFileSystem`] maps the collaborator contract onto
//!   `std::fs`, including cross-device move emulation and timestamp preservation
//! - **In-memory backend**: [`MemoryFileSystem`] keeps a full tree in memory for
//!   deterministic tests
//! - **Fault injection**: [`FaultFs`] wraps any backend and fails scripted
//!   operations a bounded number of times
//! - **Reparse codec**: [`reparse`] encodes and decodes symbolic-link and mount-point
//!   payloads through raw [`NativeBuffer`](fsporter_io::NativeBuffer) regions
//! - **Tree census**: [`take_census`] counts files, directories, and bytes under a root
//!
//! # Examples
//!
//! ```rust
//! use fsporter_fs::MemoryFileSystem;
//! use fsporter_types::FileSystem;
//!
//! let fs = MemoryFileSystem::new();
//! fs.add_file("/data/report.txt", b"quarterly numbers");
//!
//! let info = fs.entry_info("/data/report.txt".as_ref(), false).unwrap();
//! assert!(info.is_file());
//! assert_eq!(info.file_size, 17);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod census;
pub mod fault;
pub mod memory;
pub mod reparse;
pub mod std_fs;

pub use census::take_census;
pub use fault::{FaultFs, FaultSite};
pub use memory::MemoryFileSystem;
pub use reparse::ReparsePoint;
pub use std_fs::StdFileSystem;
