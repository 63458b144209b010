//! Core type system and error handling for fsporter
//!
//! This crate provides the foundational types, error handling, and shared data structures
//! used throughout the fsporter workspace. It includes:
//!
//! - **Error handling**: The transfer error taxonomy with severity levels and stable codes
//! - **Path descriptors**: Paths tagged with their known resolution state
//! - **Core types**: Entry classification, operations, and the aggregate transfer result
//! - **Options**: Type-safe copy/move flag sets with builder methods
//! - **Traits**: The `FileSystem` collaborator contract the engine is written against
//!
//! # Features
//!
//! - `serde`: Enable serialization support for the plain-data types
//!
//! # Examples
//!
//! ```rust
//! use fsporter_types::{CopyOptions, Operation, TransferResult};
//!
//! let operation = Operation::Copy(CopyOptions::default());
//! let mut result = TransferResult::new(&operation, false);
//! result.add_file(1024);
//! assert_eq!(result.total_bytes, 1024);
//! assert!(result.is_copy);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod path;
pub mod result;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{CopyOptions, MoveOptions};
pub use error::{ErrorKind, ErrorSeverity, TransferError};
pub use path::{PathDescriptor, PathFormat};
pub use result::Result;
pub use traits::FileSystem;
pub use types::*;
