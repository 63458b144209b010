//! Raw buffer primitives for fsporter
//!
//! This crate provides the RAII-owned native buffer used whenever the
//! filesystem layer hands back a variably-sized block of raw data, such as
//! reparse-point payloads or security descriptors:
//!
//! - **Owned region**: exactly one fixed-length allocation per buffer
//! - **Checked access**: every copy in/out is bounds-validated before any
//!   memory is touched
//! - **Guaranteed release**: the region is freed exactly once, on explicit
//!   release or on drop, whichever comes first
//!
//! # Examples
//!
//! ```rust
//! use fsporter_io::NativeBuffer;
//!
//! # fn example() -> fsporter_types::Result<()> {
//! let mut buffer = NativeBuffer::allocate(16)?;
//! buffer.copy_in(b"reparse payload", 0)?;
//! let bytes = buffer.to_byte_sequence(0, 7)?;
//! assert_eq!(&bytes[..], b"reparse");
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod buffer;

pub use buffer::NativeBuffer;
