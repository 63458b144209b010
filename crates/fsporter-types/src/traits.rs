//! Collaborator traits for fsporter operations
//!
//! This module defines the contract between the transfer engine and the
//! filesystem it operates on. The engine is written entirely against
//! [`FileSystem`], which keeps the orchestration logic testable against
//! in-memory and fault-injecting backends.

use crate::result::Result;
use crate::types::{EntryInfo, LinkKind, LinkTarget, Operation, TransactionHandle};
use std::path::Path;

/// The filesystem operations the transfer engine delegates to
///
/// Every call blocks until the underlying operation completes. Implementations
/// should classify OS failures through `TransferError::from_io` so the
/// taxonomy stays meaningful across backends.
pub trait FileSystem {
    /// Classify one entry and return its attributes
    ///
    /// With `resolve_links` set, attributes describe the link target;
    /// otherwise they describe the link itself (a directory symbolic link
    /// reports both `is_symlink` and `is_directory`).
    fn entry_info(&self, path: &Path, resolve_links: bool) -> Result<EntryInfo>;

    /// Read the target stored in a symbolic link or reparse point
    fn link_target(&self, path: &Path) -> Result<LinkTarget>;

    /// Create a symbolic link at `path` pointing at `target`
    fn create_symlink(&self, path: &Path, target: &Path, kind: LinkKind) -> Result<()>;

    /// Create a directory, including missing parents
    ///
    /// Idempotent: an already-existing directory is success, so a move that
    /// the OS partially completed can be resumed.
    fn create_dir(&self, path: &Path) -> Result<()>;

    /// Copy or rename one filesystem object, returning bytes transferred
    ///
    /// Any transaction handle is applied to this single operation; backends
    /// that cannot honor it must fail with `PlatformUnsupported` rather than
    /// silently dropping it.
    fn transfer_entry(
        &self,
        source: &Path,
        destination: &Path,
        operation: &Operation,
        transaction: Option<&TransactionHandle>,
    ) -> Result<u64>;

    /// Recursively delete a tree
    ///
    /// With `continue_on_not_found`, a missing entry (top-level or nested) is
    /// success. With `ignore_read_only`, read-only attributes are cleared
    /// before deletion instead of failing the delete.
    fn delete_tree(
        &self,
        path: &Path,
        continue_on_not_found: bool,
        ignore_read_only: bool,
    ) -> Result<()>;

    /// Enumerate the direct children of a directory
    ///
    /// The sequence is lazy, finite, and not restartable mid-fault: a fault
    /// surfaces as an `Err` item and the caller must re-enumerate from
    /// scratch if it decides to retry. Ordering is backend-defined.
    fn enumerate_children<'a>(
        &'a self,
        dir: &Path,
    ) -> Box<dyn Iterator<Item = Result<EntryInfo>> + 'a>;
}
