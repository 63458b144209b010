//! Standard filesystem backend
//!
//! Maps the [`FileSystem`] contract onto `std::fs`. Failures are classified
//! through `TransferError::from_io` so retry decisions see the same taxonomy
//! as every other backend. Renames that cross a device boundary are emulated
//! with copy-and-delete when the move options allow it.

use filetime::FileTime;
use fsporter_types::{
    CopyOptions, EntryInfo, FileSystem, LinkKind, LinkTarget, MoveOptions, Operation, Result,
    TransactionHandle, TransferError,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;
use walkdir::WalkDir;

/// Backend that operates on the real filesystem through `std::fs`
///
/// Stateless; one value can serve any number of transfers.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl StdFileSystem {
    /// Create a new standard filesystem backend
    pub fn new() -> Self {
        Self
    }

    fn copy_entry(&self, source: &Path, destination: &Path, options: &CopyOptions) -> Result<u64> {
        if options.fail_if_exists && fs::symlink_metadata(destination).is_ok() {
            return Err(TransferError::path_conflict(format!(
                "destination already exists: {}",
                destination.display()
            )));
        }
        let metadata =
            fs::symlink_metadata(source).map_err(|e| TransferError::from_io(e, source))?;
        if metadata.file_type().is_symlink() && options.copy_symbolic_link {
            let link = self.link_target(source)?;
            self.create_symlink(destination, &link.target, link.kind)?;
            return Ok(0);
        }
        let bytes =
            fs::copy(source, destination).map_err(|e| TransferError::from_io(e, destination))?;
        preserve_metadata(source, destination)?;
        Ok(bytes)
    }

    fn move_entry(&self, source: &Path, destination: &Path, options: &MoveOptions) -> Result<u64> {
        if options.delay_until_reboot {
            return Err(TransferError::platform_unsupported("deferred moves"));
        }
        if !options.replace_existing && fs::symlink_metadata(destination).is_ok() {
            return Err(TransferError::path_conflict(format!(
                "destination already exists: {}",
                destination.display()
            )));
        }
        match fs::rename(source, destination) {
            Ok(()) => {
                if options.write_through {
                    flush_destination(destination)?;
                }
                Ok(0)
            }
            Err(error) => {
                let classified = TransferError::from_io(error, destination);
                if !classified.is_cross_device() || !options.copy_allowed {
                    return Err(classified);
                }
                debug!(
                    source = %source.display(),
                    destination = %destination.display(),
                    "rename crossed a device boundary, emulating with copy and delete"
                );
                let bytes = self.emulate_cross_device_move(source, destination)?;
                if options.write_through {
                    flush_destination(destination)?;
                }
                Ok(bytes)
            }
        }
    }

    fn emulate_cross_device_move(&self, source: &Path, destination: &Path) -> Result<u64> {
        let metadata =
            fs::symlink_metadata(source).map_err(|e| TransferError::from_io(e, source))?;
        let file_type = metadata.file_type();

        if file_type.is_symlink() {
            let link = self.link_target(source)?;
            self.create_symlink(destination, &link.target, link.kind)?;
            fs::remove_file(source).map_err(|e| TransferError::from_io(e, source))?;
            return Ok(0);
        }
        if !file_type.is_dir() {
            let bytes = fs::copy(source, destination)
                .map_err(|e| TransferError::from_io(e, destination))?;
            preserve_metadata(source, destination)?;
            fs::remove_file(source).map_err(|e| TransferError::from_io(e, source))?;
            return Ok(bytes);
        }

        let mut total = 0u64;
        for entry in WalkDir::new(source) {
            let entry = entry.map_err(from_walkdir)?;
            let Ok(relative) = entry.path().strip_prefix(source) else {
                continue;
            };
            let target = destination.join(relative);
            let entry_type = entry.file_type();
            if entry_type.is_dir() {
                fs::create_dir_all(&target).map_err(|e| TransferError::from_io(e, &target))?;
            } else if entry_type.is_symlink() {
                let link = self.link_target(entry.path())?;
                self.create_symlink(&target, &link.target, link.kind)?;
            } else {
                total += fs::copy(entry.path(), &target)
                    .map_err(|e| TransferError::from_io(e, &target))?;
                preserve_metadata(entry.path(), &target)?;
            }
        }
        fs::remove_dir_all(source).map_err(|e| TransferError::from_io(e, source))?;
        Ok(total)
    }

    fn dir_entry_info(entry: &fs::DirEntry) -> Result<EntryInfo> {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|e| TransferError::from_io(e, &path))?;
        let metadata = entry
            .metadata()
            .map_err(|e| TransferError::from_io(e, &path))?;
        let mut info = EntryInfo {
            file_size: if file_type.is_file() {
                metadata.len()
            } else {
                0
            },
            is_directory: file_type.is_dir(),
            is_symlink: file_type.is_symlink(),
            is_reparse_point: file_type.is_symlink(),
            read_only: metadata.permissions().readonly(),
            path,
        };
        if info.is_symlink {
            // A link's classification follows its target, the link flag stays set.
            if let Ok(target) = fs::metadata(&info.path) {
                info.is_directory = target.is_dir();
            }
        }
        Ok(info)
    }
}

impl FileSystem for StdFileSystem {
    fn entry_info(&self, path: &Path, resolve_links: bool) -> Result<EntryInfo> {
        let metadata = if resolve_links {
            fs::metadata(path)
        } else {
            fs::symlink_metadata(path)
        }
        .map_err(|e| TransferError::from_io(e, path))?;
        let file_type = metadata.file_type();
        let mut info = EntryInfo {
            path: path.to_path_buf(),
            file_size: if file_type.is_file() {
                metadata.len()
            } else {
                0
            },
            is_directory: file_type.is_dir(),
            is_symlink: file_type.is_symlink(),
            is_reparse_point: file_type.is_symlink(),
            read_only: metadata.permissions().readonly(),
        };
        if info.is_symlink {
            if let Ok(target) = fs::metadata(path) {
                info.is_directory = target.is_dir();
            }
        }
        Ok(info)
    }

    fn link_target(&self, path: &Path) -> Result<LinkTarget> {
        let target = fs::read_link(path).map_err(|e| TransferError::from_io(e, path))?;
        let kind = match fs::metadata(path) {
            Ok(metadata) if metadata.is_dir() => LinkKind::Directory,
            _ => LinkKind::File,
        };
        Ok(LinkTarget {
            print_name: target.to_string_lossy().into_owned(),
            target,
            kind,
        })
    }

    fn create_symlink(&self, path: &Path, target: &Path, kind: LinkKind) -> Result<()> {
        #[cfg(unix)]
        {
            let _ = kind;
            std::os::unix::fs::symlink(target, path).map_err(|e| TransferError::from_io(e, path))
        }
        #[cfg(windows)]
        {
            let result = match kind {
                LinkKind::Directory => std::os::windows::fs::symlink_dir(target, path),
                LinkKind::File => std::os::windows::fs::symlink_file(target, path),
            };
            result.map_err(|e| TransferError::from_io(e, path))
        }
        #[cfg(not(any(unix, windows)))]
        {
            let _ = (path, target, kind);
            Err(TransferError::platform_unsupported("symbolic links"))
        }
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| TransferError::from_io(e, path))
    }

    fn transfer_entry(
        &self,
        source: &Path,
        destination: &Path,
        operation: &Operation,
        transaction: Option<&TransactionHandle>,
    ) -> Result<u64> {
        if transaction.is_some() {
            return Err(TransferError::platform_unsupported(
                "transacted filesystem operations",
            ));
        }
        match operation {
            Operation::Copy(options) => self.copy_entry(source, destination, options),
            Operation::Move(options) => self.move_entry(source, destination, options),
        }
    }

    fn delete_tree(
        &self,
        path: &Path,
        continue_on_not_found: bool,
        ignore_read_only: bool,
    ) -> Result<()> {
        let metadata = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(error) if error.kind() == io::ErrorKind::NotFound && continue_on_not_found => {
                return Ok(());
            }
            Err(error) => return Err(TransferError::from_io(error, path)),
        };
        debug!(path = %path.display(), "deleting tree");

        if !metadata.is_dir() {
            if ignore_read_only {
                let _ = clear_read_only(path);
            }
            return match fs::remove_file(path) {
                Ok(()) => Ok(()),
                Err(error) if error.kind() == io::ErrorKind::NotFound && continue_on_not_found => {
                    Ok(())
                }
                Err(error) => Err(TransferError::from_io(error, path)),
            };
        }

        // Read-only directories block removal of their children, so they are
        // cleared on the way down before the bottom-up removal pass.
        if ignore_read_only {
            for entry in WalkDir::new(path).into_iter().flatten() {
                if entry.file_type().is_dir() {
                    let _ = clear_read_only(entry.path());
                }
            }
        }

        for entry in WalkDir::new(path).contents_first(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    if continue_on_not_found && is_walkdir_not_found(&error) {
                        continue;
                    }
                    return Err(from_walkdir(error));
                }
            };
            let entry_path = entry.path();
            if ignore_read_only && !entry.file_type().is_dir() {
                let _ = clear_read_only(entry_path);
            }
            let removed = if entry.file_type().is_dir() {
                fs::remove_dir(entry_path)
            } else {
                fs::remove_file(entry_path)
            };
            if let Err(error) = removed {
                if continue_on_not_found && error.kind() == io::ErrorKind::NotFound {
                    continue;
                }
                return Err(TransferError::from_io(error, entry_path));
            }
        }
        Ok(())
    }

    fn enumerate_children<'a>(
        &'a self,
        dir: &Path,
    ) -> Box<dyn Iterator<Item = Result<EntryInfo>> + 'a> {
        let dir = dir.to_path_buf();
        match fs::read_dir(&dir) {
            Ok(read_dir) => Box::new(read_dir.map(move |entry| {
                let entry = entry.map_err(|e| TransferError::from_io(e, dir.clone()))?;
                Self::dir_entry_info(&entry)
            })),
            Err(error) => Box::new(std::iter::once(Err(TransferError::from_io(error, dir)))),
        }
    }
}

/// Carry timestamps (and permissions on Unix) from `source` to `destination`
fn preserve_metadata(source: &Path, destination: &Path) -> Result<()> {
    let metadata = fs::metadata(source).map_err(|e| TransferError::from_io(e, source))?;
    let accessed = metadata.accessed().unwrap_or_else(|_| SystemTime::now());
    let modified = metadata.modified().unwrap_or_else(|_| SystemTime::now());
    filetime::set_file_times(
        destination,
        FileTime::from_system_time(accessed),
        FileTime::from_system_time(modified),
    )
    .map_err(|e| TransferError::from_io(e, destination))?;

    #[cfg(unix)]
    {
        fs::set_permissions(destination, metadata.permissions())
            .map_err(|e| TransferError::from_io(e, destination))?;
    }
    Ok(())
}

fn clear_read_only(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    let mut permissions = metadata.permissions();
    if permissions.readonly() {
        #[allow(clippy::permissions_set_readonly_false)]
        permissions.set_readonly(false);
        fs::set_permissions(path, permissions)?;
    }
    Ok(())
}

fn flush_destination(destination: &Path) -> Result<()> {
    let is_file = fs::metadata(destination)
        .map(|m| m.is_file())
        .unwrap_or(false);
    if is_file {
        let file = fs::File::open(destination).map_err(|e| TransferError::from_io(e, destination))?;
        file.sync_all()
            .map_err(|e| TransferError::from_io(e, destination))?;
    }
    Ok(())
}

fn is_walkdir_not_found(error: &walkdir::Error) -> bool {
    error
        .io_error()
        .map(|e| e.kind() == io::ErrorKind::NotFound)
        .unwrap_or(false)
}

pub(crate) fn from_walkdir(error: walkdir::Error) -> TransferError {
    let path = error
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(PathBuf::new);
    match error.into_io_error() {
        Some(io_error) => TransferError::from_io(io_error, path),
        None => TransferError::Io {
            message: "filesystem walk followed a symbolic link cycle".to_string(),
            code: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsporter_types::ErrorKind;
    use std::fs;

    fn copy_op() -> Operation {
        Operation::Copy(CopyOptions::new())
    }

    fn move_op() -> Operation {
        Operation::Move(MoveOptions::new())
    }

    #[test]
    fn test_entry_info_classifies_file_and_directory() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("data.bin");
        fs::write(&file, b"abcdef").unwrap();
        let dir = temp.path().join("nested");
        fs::create_dir(&dir).unwrap();

        let fs_impl = StdFileSystem::new();
        let file_info = fs_impl.entry_info(&file, false).unwrap();
        assert!(file_info.is_file());
        assert_eq!(file_info.file_size, 6);
        assert!(!file_info.is_symlink);

        let dir_info = fs_impl.entry_info(&dir, false).unwrap();
        assert!(dir_info.is_directory);
        assert_eq!(dir_info.file_size, 0);
    }

    #[test]
    fn test_entry_info_missing_path_is_not_found() {
        let temp = tempfile::tempdir().unwrap();
        let fs_impl = StdFileSystem::new();
        let error = fs_impl
            .entry_info(&temp.path().join("missing"), false)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_symlink_reports_both_flags() {
        let temp = tempfile::tempdir().unwrap();
        let target = temp.path().join("real");
        fs::create_dir(&target).unwrap();
        let link = temp.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let fs_impl = StdFileSystem::new();
        let info = fs_impl.entry_info(&link, false).unwrap();
        assert!(info.is_symlink);
        assert!(info.is_directory);
        assert!(info.is_reparse_point);

        let resolved = fs_impl.entry_info(&link, true).unwrap();
        assert!(!resolved.is_symlink);
        assert!(resolved.is_directory);
    }

    #[test]
    fn test_copy_preserves_content_and_timestamps() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("source.txt");
        fs::write(&source, b"payload").unwrap();
        let destination = temp.path().join("copy.txt");

        let fs_impl = StdFileSystem::new();
        let bytes = fs_impl
            .transfer_entry(&source, &destination, &copy_op(), None)
            .unwrap();
        assert_eq!(bytes, 7);
        assert_eq!(fs::read(&destination).unwrap(), b"payload");

        let source_modified = FileTime::from_last_modification_time(&fs::metadata(&source).unwrap());
        let copied_modified =
            FileTime::from_last_modification_time(&fs::metadata(&destination).unwrap());
        assert_eq!(source_modified, copied_modified);
    }

    #[test]
    fn test_copy_fail_if_exists_conflicts() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("a");
        let destination = temp.path().join("b");
        fs::write(&source, b"x").unwrap();
        fs::write(&destination, b"y").unwrap();

        let fs_impl = StdFileSystem::new();
        let operation = Operation::Copy(CopyOptions::new().with_fail_if_exists(true));
        let error = fs_impl
            .transfer_entry(&source, &destination, &operation, None)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::PathConflict);
        assert_eq!(fs::read(&destination).unwrap(), b"y");
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_symbolic_link_replicates_the_link() {
        let temp = tempfile::tempdir().unwrap();
        let target = temp.path().join("target.txt");
        fs::write(&target, b"content").unwrap();
        let link = temp.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();
        let destination = temp.path().join("link-copy");

        let fs_impl = StdFileSystem::new();
        let operation = Operation::Copy(CopyOptions::new().with_copy_symbolic_link(true));
        let bytes = fs_impl
            .transfer_entry(&link, &destination, &operation, None)
            .unwrap();
        assert_eq!(bytes, 0);
        assert_eq!(fs::read_link(&destination).unwrap(), target);
    }

    #[test]
    fn test_move_renames_within_volume() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("old");
        fs::write(&source, b"payload").unwrap();
        let destination = temp.path().join("new");

        let fs_impl = StdFileSystem::new();
        fs_impl
            .transfer_entry(&source, &destination, &move_op(), None)
            .unwrap();
        assert!(!source.exists());
        assert_eq!(fs::read(&destination).unwrap(), b"payload");
    }

    #[test]
    fn test_move_existing_destination_requires_replace() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("old");
        let destination = temp.path().join("new");
        fs::write(&source, b"fresh").unwrap();
        fs::write(&destination, b"stale").unwrap();

        let fs_impl = StdFileSystem::new();
        let error = fs_impl
            .transfer_entry(&source, &destination, &move_op(), None)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::PathConflict);

        let replacing = Operation::Move(MoveOptions::new().with_replace_existing(true));
        fs_impl
            .transfer_entry(&source, &destination, &replacing, None)
            .unwrap();
        assert_eq!(fs::read(&destination).unwrap(), b"fresh");
    }

    #[test]
    fn test_deferred_move_is_unsupported() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("old");
        fs::write(&source, b"x").unwrap();

        let fs_impl = StdFileSystem::new();
        let operation = Operation::Move(MoveOptions::new().with_delay_until_reboot(true));
        let error = fs_impl
            .transfer_entry(&source, &temp.path().join("new"), &operation, None)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::PlatformUnsupported);
        assert!(source.exists());
    }

    #[test]
    fn test_transacted_transfer_is_unsupported() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("a");
        fs::write(&source, b"x").unwrap();

        let fs_impl = StdFileSystem::new();
        let transaction = TransactionHandle::new(7);
        let error = fs_impl
            .transfer_entry(
                &source,
                &temp.path().join("b"),
                &copy_op(),
                Some(&transaction),
            )
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::PlatformUnsupported);
    }

    #[test]
    fn test_cross_device_emulation_relocates_a_tree() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("tree");
        fs::create_dir_all(source.join("nested")).unwrap();
        fs::write(source.join("top.txt"), b"12345").unwrap();
        fs::write(source.join("nested/leaf.txt"), b"678").unwrap();
        let destination = temp.path().join("relocated");

        let fs_impl = StdFileSystem::new();
        let bytes = fs_impl
            .emulate_cross_device_move(&source, &destination)
            .unwrap();
        assert_eq!(bytes, 8);
        assert!(!source.exists());
        assert_eq!(fs::read(destination.join("top.txt")).unwrap(), b"12345");
        assert_eq!(
            fs::read(destination.join("nested/leaf.txt")).unwrap(),
            b"678"
        );
    }

    #[test]
    fn test_delete_tree_removes_nested_structure() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("tree");
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("a/file.txt"), b"1").unwrap();
        fs::write(root.join("a/b/deep.txt"), b"2").unwrap();

        let fs_impl = StdFileSystem::new();
        fs_impl.delete_tree(&root, false, false).unwrap();
        assert!(!root.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_delete_tree_clears_read_only_directories() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("tree");
        let locked = root.join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("inner.txt"), b"1").unwrap();
        let mut permissions = fs::metadata(&locked).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&locked, permissions).unwrap();

        let fs_impl = StdFileSystem::new();
        fs_impl.delete_tree(&root, false, true).unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn test_delete_tree_missing_path() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("missing");

        let fs_impl = StdFileSystem::new();
        fs_impl.delete_tree(&missing, true, false).unwrap();

        let error = fs_impl.delete_tree(&missing, false, false).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_enumerate_children_lists_direct_entries() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("one.txt"), b"11").unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("sub/nested.txt"), b"d").unwrap();

        let fs_impl = StdFileSystem::new();
        let mut entries: Vec<EntryInfo> = fs_impl
            .enumerate_children(temp.path())
            .collect::<Result<_>>()
            .unwrap();
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_file());
        assert_eq!(entries[0].file_size, 2);
        assert!(entries[1].is_directory);
    }

    #[test]
    fn test_enumerate_children_missing_directory_yields_error_item() {
        let temp = tempfile::tempdir().unwrap();
        let fs_impl = StdFileSystem::new();
        let mut items = fs_impl.enumerate_children(&temp.path().join("missing"));
        let first = items.next().unwrap();
        assert_eq!(first.unwrap_err().kind(), ErrorKind::NotFound);
        assert!(items.next().is_none());
    }
}
