//! Shared helpers for the integration tests and benchmarks
//!
//! The tree builders return the [`TreeCensus`] a faithful copy of the
//! built tree should produce, so tests can cross-check engine totals
//! against an independent count.

use fsporter_fs::MemoryFileSystem;
use fsporter_types::TreeCensus;
use std::fs;
use std::io;
use std::path::Path;

/// Generate deterministic content resembling a real file
pub fn patterned_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| ((i * 7 + 13) % 256) as u8).collect()
}

/// Write one file with `size` patterned bytes, creating parents as needed
pub fn create_test_file(path: &Path, size: usize) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, patterned_data(size))
}

/// File layout used by the directory-transfer tests
pub const TREE_FILES: [(&str, usize); 5] = [
    ("small.txt", 1024),
    ("medium.bin", 64 * 1024),
    ("docs/readme.md", 2048),
    ("docs/api/reference.md", 4096),
    ("assets/logo.dat", 512),
];

/// Build the standard test tree under `base` on the real filesystem
///
/// Returns the census a copy of the tree should produce: five files,
/// three directories (`docs`, `docs/api`, `assets`).
pub fn seed_source_tree(base: &Path) -> io::Result<TreeCensus> {
    let mut census = TreeCensus::new();
    for (name, size) in TREE_FILES {
        create_test_file(&base.join(name), size)?;
        census.add_file(size as u64);
    }
    census.add_directory();
    census.add_directory();
    census.add_directory();
    Ok(census)
}

/// Build the standard test tree under `base` on a memory backend
pub fn seed_memory_tree(fs: &MemoryFileSystem, base: &str) -> TreeCensus {
    let mut census = TreeCensus::new();
    for (name, size) in TREE_FILES {
        fs.add_file(format!("{base}/{name}"), &patterned_data(size));
        census.add_file(size as u64);
    }
    census.add_directory();
    census.add_directory();
    census.add_directory();
    census
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_patterned_data_is_deterministic() {
        assert_eq!(patterned_data(16), patterned_data(16));
        assert_eq!(patterned_data(3), vec![13, 20, 27]);
    }

    #[test]
    fn test_seed_source_tree_reports_its_own_shape() {
        let temp = TempDir::new().unwrap();
        let census = seed_source_tree(temp.path()).unwrap();
        assert_eq!(census.files, 5);
        assert_eq!(census.directories, 3);
        assert!(temp.path().join("docs/api/reference.md").exists());
    }
}
