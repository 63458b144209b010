//! In-memory filesystem backend
//!
//! Keeps an entire tree in a `BTreeMap` keyed by path, which makes
//! enumeration order deterministic and lets tests assert on exact state
//! without touching the disk. Transaction handles passed to
//! [`transfer_entry`](fsporter_types::FileSystem::transfer_entry) are
//! recorded so tests can verify they reach every per-entry operation.

use fsporter_types::{
    CopyOptions, EntryInfo, FileSystem, LinkKind, LinkTarget, MoveOptions, Operation, Result,
    TransactionHandle, TransferError,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    File { data: Vec<u8>, read_only: bool },
    Directory,
    Link { target: PathBuf, kind: LinkKind },
}

/// Filesystem backend backed by an in-memory tree
///
/// Paths can be assigned to numbered devices with [`set_device`], which
/// makes renames across the boundary fail the way a real OS refuses a
/// cross-device `rename` unless the move options allow a copy fallback.
///
/// [`set_device`]: MemoryFileSystem::set_device
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    nodes: Mutex<BTreeMap<PathBuf, Node>>,
    devices: Mutex<Vec<(PathBuf, u64)>>,
    transactions: Mutex<Vec<Option<TransactionHandle>>>,
}

impl MemoryFileSystem {
    /// Create an empty in-memory filesystem
    pub fn new() -> Self {
        Self::default()
    }

    fn nodes(&self) -> MutexGuard<'_, BTreeMap<PathBuf, Node>> {
        self.nodes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a file, creating missing parent directories
    pub fn add_file(&self, path: impl Into<PathBuf>, data: &[u8]) {
        let path = path.into();
        let mut nodes = self.nodes();
        insert_parents(&mut nodes, &path);
        nodes.insert(
            path,
            Node::File {
                data: data.to_vec(),
                read_only: false,
            },
        );
    }

    /// Insert a directory, creating missing parent directories
    pub fn add_directory(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let mut nodes = self.nodes();
        insert_parents(&mut nodes, &path);
        nodes.insert(path, Node::Directory);
    }

    /// Insert a symbolic link, creating missing parent directories
    pub fn add_link(&self, path: impl Into<PathBuf>, target: impl Into<PathBuf>, kind: LinkKind) {
        let path = path.into();
        let mut nodes = self.nodes();
        insert_parents(&mut nodes, &path);
        nodes.insert(
            path,
            Node::Link {
                target: target.into(),
                kind,
            },
        );
    }

    /// Mark an existing file read-only (or writable again)
    pub fn set_read_only(&self, path: impl AsRef<Path>, value: bool) {
        let mut nodes = self.nodes();
        if let Some(Node::File { read_only, .. }) = nodes.get_mut(path.as_ref()) {
            *read_only = value;
        }
    }

    /// Whether any entry exists at `path`
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.nodes().contains_key(path.as_ref())
    }

    /// The content of the file at `path`, if one exists
    pub fn file_data(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.nodes().get(path.as_ref()) {
            Some(Node::File { data, .. }) => Some(data.clone()),
            _ => None,
        }
    }

    /// Total number of entries, implicit parent directories included
    pub fn entry_count(&self) -> usize {
        self.nodes().len()
    }

    /// The transaction handle seen by each `transfer_entry` call, in order
    pub fn recorded_transactions(&self) -> Vec<Option<TransactionHandle>> {
        self.transactions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Assign every path under `prefix` to a numbered device
    ///
    /// Paths not covered by any prefix belong to device 0. The longest
    /// matching prefix wins.
    pub fn set_device(&self, prefix: impl Into<PathBuf>, device: u64) {
        self.devices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((prefix.into(), device));
    }

    fn device_of(&self, path: &Path) -> u64 {
        self.devices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(prefix, _)| path.starts_with(prefix))
            .max_by_key(|(prefix, _)| prefix.components().count())
            .map_or(0, |(_, device)| *device)
    }

    fn copy_node(
        nodes: &mut BTreeMap<PathBuf, Node>,
        source: &Path,
        destination: &Path,
        options: &CopyOptions,
    ) -> Result<u64> {
        let node = nodes
            .get(source)
            .cloned()
            .ok_or_else(|| TransferError::not_found(source))?;
        if options.fail_if_exists && nodes.contains_key(destination) {
            return Err(TransferError::path_conflict(format!(
                "destination already exists: {}",
                destination.display()
            )));
        }
        match node {
            Node::File { data, read_only } => {
                let bytes = data.len() as u64;
                insert_parents(nodes, destination);
                nodes.insert(destination.to_path_buf(), Node::File { data, read_only });
                Ok(bytes)
            }
            Node::Link { target, kind } => {
                if options.copy_symbolic_link {
                    insert_parents(nodes, destination);
                    nodes.insert(destination.to_path_buf(), Node::Link { target, kind });
                    return Ok(0);
                }
                // Without the flag the copy follows the link, like CopyFileEx.
                match nodes.get(&target).cloned() {
                    Some(Node::File { data, read_only }) => {
                        let bytes = data.len() as u64;
                        insert_parents(nodes, destination);
                        nodes.insert(destination.to_path_buf(), Node::File { data, read_only });
                        Ok(bytes)
                    }
                    Some(_) => Err(TransferError::invalid_argument(format!(
                        "link target is not a file: {}",
                        target.display()
                    ))),
                    None => Err(TransferError::not_found(target)),
                }
            }
            Node::Directory => Err(TransferError::invalid_argument(format!(
                "cannot copy a directory as a single entry: {}",
                source.display()
            ))),
        }
    }

    fn move_node(
        nodes: &mut BTreeMap<PathBuf, Node>,
        source: &Path,
        destination: &Path,
        options: &MoveOptions,
        crosses_devices: bool,
    ) -> Result<u64> {
        if options.delay_until_reboot {
            return Err(TransferError::platform_unsupported("deferred moves"));
        }
        if crosses_devices && !options.copy_allowed {
            return Err(TransferError::cross_device());
        }
        let node = nodes
            .get(source)
            .cloned()
            .ok_or_else(|| TransferError::not_found(source))?;
        if let Some(existing) = nodes.get(destination) {
            if !options.replace_existing {
                return Err(TransferError::path_conflict(format!(
                    "destination already exists: {}",
                    destination.display()
                )));
            }
            // Renames replace files, never directories, like MoveFileEx.
            if matches!(node, Node::Directory) || matches!(existing, Node::Directory) {
                return Err(TransferError::path_conflict(format!(
                    "cannot replace a directory by renaming: {}",
                    destination.display()
                )));
            }
        }
        if matches!(node, Node::Directory) {
            let descendants: Vec<PathBuf> = nodes
                .keys()
                .filter(|key| key.starts_with(source))
                .cloned()
                .collect();
            insert_parents(nodes, destination);
            for old_key in descendants {
                let Some(moved) = nodes.remove(&old_key) else {
                    continue;
                };
                let Ok(relative) = old_key.strip_prefix(source) else {
                    continue;
                };
                nodes.insert(destination.join(relative), moved);
            }
        } else {
            nodes.remove(source);
            insert_parents(nodes, destination);
            nodes.insert(destination.to_path_buf(), node);
        }
        Ok(0)
    }
}

impl FileSystem for MemoryFileSystem {
    fn entry_info(&self, path: &Path, resolve_links: bool) -> Result<EntryInfo> {
        let nodes = self.nodes();
        let node = nodes
            .get(path)
            .ok_or_else(|| TransferError::not_found(path))?;
        if resolve_links {
            if let Node::Link { target, .. } = node {
                let resolved = nodes
                    .get(target)
                    .ok_or_else(|| TransferError::not_found(target.clone()))?;
                let mut info = describe(path, resolved);
                info.is_symlink = false;
                info.is_reparse_point = false;
                return Ok(info);
            }
        }
        Ok(describe(path, node))
    }

    fn link_target(&self, path: &Path) -> Result<LinkTarget> {
        match self.nodes().get(path) {
            Some(Node::Link { target, kind }) => Ok(LinkTarget {
                print_name: target.to_string_lossy().into_owned(),
                target: target.clone(),
                kind: *kind,
            }),
            Some(_) => Err(TransferError::invalid_argument(format!(
                "not a symbolic link: {}",
                path.display()
            ))),
            None => Err(TransferError::not_found(path)),
        }
    }

    fn create_symlink(&self, path: &Path, target: &Path, kind: LinkKind) -> Result<()> {
        let mut nodes = self.nodes();
        if nodes.contains_key(path) {
            return Err(TransferError::path_conflict(format!(
                "entry already exists: {}",
                path.display()
            )));
        }
        insert_parents(&mut nodes, path);
        nodes.insert(
            path.to_path_buf(),
            Node::Link {
                target: target.to_path_buf(),
                kind,
            },
        );
        Ok(())
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        let mut nodes = self.nodes();
        match nodes.get(path) {
            Some(Node::Directory) => Ok(()),
            Some(_) => Err(TransferError::path_conflict(format!(
                "a non-directory entry occupies {}",
                path.display()
            ))),
            None => {
                insert_parents(&mut nodes, path);
                nodes.insert(path.to_path_buf(), Node::Directory);
                Ok(())
            }
        }
    }

    fn transfer_entry(
        &self,
        source: &Path,
        destination: &Path,
        operation: &Operation,
        transaction: Option<&TransactionHandle>,
    ) -> Result<u64> {
        self.transactions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(transaction.copied());
        let crosses_devices = self.device_of(source) != self.device_of(destination);
        let mut nodes = self.nodes();
        match operation {
            Operation::Copy(options) => Self::copy_node(&mut nodes, source, destination, options),
            Operation::Move(options) => {
                Self::move_node(&mut nodes, source, destination, options, crosses_devices)
            }
        }
    }

    fn delete_tree(
        &self,
        path: &Path,
        continue_on_not_found: bool,
        ignore_read_only: bool,
    ) -> Result<()> {
        let mut nodes = self.nodes();
        let keys: Vec<PathBuf> = nodes
            .keys()
            .filter(|key| key.starts_with(path))
            .cloned()
            .collect();
        if keys.is_empty() {
            if continue_on_not_found {
                return Ok(());
            }
            return Err(TransferError::not_found(path));
        }
        if !ignore_read_only {
            for key in &keys {
                if matches!(
                    nodes.get(key),
                    Some(Node::File {
                        read_only: true,
                        ..
                    })
                ) {
                    return Err(TransferError::access_denied(key.clone()));
                }
            }
        }
        for key in keys {
            nodes.remove(&key);
        }
        Ok(())
    }

    fn enumerate_children<'a>(
        &'a self,
        dir: &Path,
    ) -> Box<dyn Iterator<Item = Result<EntryInfo>> + 'a> {
        let nodes = self.nodes();
        match nodes.get(dir) {
            Some(Node::Directory) => {}
            Some(_) => {
                return Box::new(std::iter::once(Err(TransferError::invalid_argument(
                    format!("not a directory: {}", dir.display()),
                ))));
            }
            None => {
                return Box::new(std::iter::once(Err(TransferError::not_found(dir))));
            }
        }
        let children: Vec<EntryInfo> = nodes
            .iter()
            .filter(|(key, _)| key.parent() == Some(dir))
            .map(|(key, node)| describe(key, node))
            .collect();
        Box::new(children.into_iter().map(Ok))
    }
}

fn describe(path: &Path, node: &Node) -> EntryInfo {
    match node {
        Node::File { data, read_only } => EntryInfo {
            path: path.to_path_buf(),
            file_size: data.len() as u64,
            is_directory: false,
            is_symlink: false,
            is_reparse_point: false,
            read_only: *read_only,
        },
        Node::Directory => EntryInfo::directory(path.to_path_buf()),
        Node::Link { kind, .. } => EntryInfo {
            path: path.to_path_buf(),
            file_size: 0,
            is_directory: *kind == LinkKind::Directory,
            is_symlink: true,
            is_reparse_point: true,
            read_only: false,
        },
    }
}

fn insert_parents(nodes: &mut BTreeMap<PathBuf, Node>, path: &Path) {
    for ancestor in path.ancestors().skip(1) {
        if ancestor.as_os_str().is_empty() {
            continue;
        }
        nodes
            .entry(ancestor.to_path_buf())
            .or_insert(Node::Directory);
    }
}
