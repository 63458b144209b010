//! Tree census
//!
//! Walks a directory tree and tallies what a transfer of that tree would
//! visit. Useful for sizing progress reporting up front and for checking a
//! completed transfer against its source.

use crate::std_fs::from_walkdir;
use fsporter_types::{Result, TreeCensus};
use std::path::Path;
use walkdir::WalkDir;

/// Count the files, directories, and bytes under `root`
///
/// The root itself is not counted, matching how a transfer reports totals.
/// Symbolic links are tallied as zero-byte files and never followed.
///
/// # Errors
///
/// Fails with the classified filesystem error when a subtree cannot be read.
pub fn take_census(root: &Path) -> Result<TreeCensus> {
    let mut census = TreeCensus::new();
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry.map_err(from_walkdir)?;
        if entry.file_type().is_dir() {
            census.add_directory();
        } else if entry.file_type().is_file() {
            let bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
            census.add_file(bytes);
        } else {
            census.add_file(0);
        }
    }
    Ok(census)
}
