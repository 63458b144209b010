//! fsporter integration test suite
//!
//! This crate holds the cross-crate integration tests and the criterion
//! benchmarks for the fsporter workspace. The library part only carries
//! shared helpers; the actual coverage lives in `tests/` and `benches/`.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Unified test utilities
///
/// Tree builders and data generators shared between the integration
/// tests and the benchmarks.
pub mod test_utils;
