//! Fault-injecting filesystem wrapper
//!
//! Wraps any [`FileSystem`] and fails scripted operations a bounded number
//! of times before letting them through. Every intercepted call is counted,
//! so tests can assert exactly how often the engine attempted an operation
//! while a retry policy was absorbing failures.

use fsporter_types::{
    EntryInfo, FileSystem, LinkKind, LinkTarget, Operation, Result, TransactionHandle,
    TransferError,
};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// The operation a scripted fault intercepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultSite {
    /// `entry_info` lookups
    EntryInfo,
    /// `link_target` reads
    LinkTarget,
    /// `transfer_entry` copies and renames
    Transfer,
    /// `delete_tree` removals
    DeleteTree,
    /// `enumerate_children` listings
    Enumerate,
}

type ErrorBuilder = Box<dyn Fn(&Path) -> TransferError + Send>;

struct Fault {
    site: FaultSite,
    path: PathBuf,
    remaining: u32,
    build: ErrorBuilder,
}

/// Filesystem wrapper that injects scripted failures
pub struct FaultFs<F> {
    inner: F,
    faults: Mutex<Vec<Fault>>,
    invocations: Mutex<HashMap<(FaultSite, PathBuf), u32>>,
}

impl<F> FaultFs<F> {
    /// Wrap a backend with no faults scripted
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            faults: Mutex::new(Vec::new()),
            invocations: Mutex::new(HashMap::new()),
        }
    }

    /// Access the wrapped backend
    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// Fail the next `times` invocations of `site` on `path`
    pub fn fail_times(
        &self,
        site: FaultSite,
        path: impl Into<PathBuf>,
        times: u32,
        build: impl Fn(&Path) -> TransferError + Send + 'static,
    ) {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Fault {
                site,
                path: path.into(),
                remaining: times,
                build: Box::new(build),
            });
    }

    /// Fail every invocation of `site` on `path`
    pub fn fail_always(
        &self,
        site: FaultSite,
        path: impl Into<PathBuf>,
        build: impl Fn(&Path) -> TransferError + Send + 'static,
    ) {
        self.fail_times(site, path, u32::MAX, build);
    }

    /// How many times `site` was invoked on `path`, successes included
    pub fn invocations(&self, site: FaultSite, path: impl AsRef<Path>) -> u32 {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(site, path.as_ref().to_path_buf()))
            .copied()
            .unwrap_or(0)
    }

    fn check(&self, site: FaultSite, path: &Path) -> Option<TransferError> {
        *self
            .invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((site, path.to_path_buf()))
            .or_insert(0) += 1;
        let mut faults = self.faults.lock().unwrap_or_else(PoisonError::into_inner);
        for fault in faults.iter_mut() {
            if fault.site == site && fault.path == path && fault.remaining > 0 {
                fault.remaining -= 1;
                return Some((fault.build)(path));
            }
        }
        None
    }
}

impl<F: fmt::Debug> fmt::Debug for FaultFs<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultFs")
            .field("inner", &self.inner)
            .field(
                "faults",
                &self
                    .faults
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .len(),
            )
            .finish()
    }
}

impl<F: FileSystem> FileSystem for FaultFs<F> {
    fn entry_info(&self, path: &Path, resolve_links: bool) -> Result<EntryInfo> {
        if let Some(error) = self.check(FaultSite::EntryInfo, path) {
            return Err(error);
        }
        self.inner.entry_info(path, resolve_links)
    }

    fn link_target(&self, path: &Path) -> Result<LinkTarget> {
        if let Some(error) = self.check(FaultSite::LinkTarget, path) {
            return Err(error);
        }
        self.inner.link_target(path)
    }

    fn create_symlink(&self, path: &Path, target: &Path, kind: LinkKind) -> Result<()> {
        self.inner.create_symlink(path, target, kind)
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        self.inner.create_dir(path)
    }

    fn transfer_entry(
        &self,
        source: &Path,
        destination: &Path,
        operation: &Operation,
        transaction: Option<&TransactionHandle>,
    ) -> Result<u64> {
        if let Some(error) = self.check(FaultSite::Transfer, source) {
            return Err(error);
        }
        self.inner
            .transfer_entry(source, destination, operation, transaction)
    }

    fn delete_tree(
        &self,
        path: &Path,
        continue_on_not_found: bool,
        ignore_read_only: bool,
    ) -> Result<()> {
        if let Some(error) = self.check(FaultSite::DeleteTree, path) {
            return Err(error);
        }
        self.inner
            .delete_tree(path, continue_on_not_found, ignore_read_only)
    }

    fn enumerate_children<'a>(
        &'a self,
        dir: &Path,
    ) -> Box<dyn Iterator<Item = Result<EntryInfo>> + 'a> {
        if let Some(error) = self.check(FaultSite::Enumerate, dir) {
            return Box::new(std::iter::once(Err(error)));
        }
        self.inner.enumerate_children(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryFileSystem;
    use fsporter_types::{CopyOptions, ErrorKind};

    fn copy_op() -> Operation {
        Operation::Copy(CopyOptions::new())
    }

    #[test]
    fn test_fault_fires_then_clears() {
        let fs = FaultFs::new(MemoryFileSystem::new());
        fs.inner().add_file("/src.txt", b"abc");
        fs.fail_times(FaultSite::Transfer, "/src.txt", 2, |path| {
            TransferError::SharingViolation {
                path: path.to_path_buf(),
            }
        });

        for _ in 0..2 {
            let error = fs
                .transfer_entry("/src.txt".as_ref(), "/dst.txt".as_ref(), &copy_op(), None)
                .unwrap_err();
            assert_eq!(error.kind(), ErrorKind::SharingViolation);
        }
        fs.transfer_entry("/src.txt".as_ref(), "/dst.txt".as_ref(), &copy_op(), None)
            .unwrap();

        assert_eq!(fs.invocations(FaultSite::Transfer, "/src.txt"), 3);
        assert_eq!(fs.inner().file_data("/dst.txt").unwrap(), b"abc");
    }

    #[test]
    fn test_enumeration_fault_surfaces_as_error_item() {
        let fs = FaultFs::new(MemoryFileSystem::new());
        fs.inner().add_file("/dir/a.txt", b"1");
        fs.fail_times(FaultSite::Enumerate, "/dir", 1, |path| {
            TransferError::access_denied(path)
        });

        let first = fs.enumerate_children("/dir".as_ref()).next().unwrap();
        assert_eq!(first.unwrap_err().kind(), ErrorKind::AccessDenied);

        let entries: Vec<_> = fs
            .enumerate_children("/dir".as_ref())
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_unscripted_operations_pass_through() {
        let fs = FaultFs::new(MemoryFileSystem::new());
        fs.inner().add_file("/a.txt", b"xyz");

        let info = fs.entry_info("/a.txt".as_ref(), false).unwrap();
        assert_eq!(info.file_size, 3);
        assert_eq!(fs.invocations(FaultSite::EntryInfo, "/a.txt"), 1);
        assert_eq!(fs.invocations(FaultSite::Transfer, "/a.txt"), 0);
    }
}
