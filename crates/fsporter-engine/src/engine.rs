//! Transfer orchestration
//!
//! [`TransferEngine`] runs one copy or move per request: classify the
//! source, validate the endpoint combination, then either walk the tree
//! (directory copy) or hand the whole entry to the backend in a single
//! `transfer_entry` call (files, directory moves). Every call produces a
//! fresh [`TransferResult`]; terminal errors are returned instead of it.

use crate::request::{EnumerationFilters, TransferRequest};
use crate::retry::{Attempt, RetryPolicy};
use crate::tree::{report_progress, transfer_tree};
use fsporter_fs::StdFileSystem;
use fsporter_types::{
    CopyOptions, EntryInfo, FileSystem, Operation, Result, TransferError, TransferResult,
};
use std::path::Path;
use tracing::{debug, info, warn};

/// Orchestrates copy and move transfers over a [`FileSystem`] backend
///
/// The default engine works against the real filesystem; tests swap in
/// [`MemoryFileSystem`](fsporter_fs::MemoryFileSystem) or wrap a backend
/// in [`FaultFs`](fsporter_fs::FaultFs).
#[derive(Debug, Default)]
pub struct TransferEngine<F = StdFileSystem> {
    fs: F,
}

impl TransferEngine<StdFileSystem> {
    /// Create an engine over the real filesystem
    pub fn new() -> Self {
        Self::default()
    }
}

impl<F: FileSystem> TransferEngine<F> {
    /// Create an engine over the given backend
    pub fn with_filesystem(fs: F) -> Self {
        Self { fs }
    }

    /// The backend this engine operates on
    pub fn filesystem(&self) -> &F {
        &self.fs
    }

    /// Run one transfer
    ///
    /// Returns the populated result, partial if entries were skipped or
    /// the progress callback cancelled. An error is returned only when the
    /// transfer could not continue: a failed validation, or a per-entry
    /// error the retry policy aborted on.
    pub fn execute(&self, request: &TransferRequest) -> Result<TransferResult> {
        let source_descriptor = request.source.resolve()?;
        let destination_descriptor = request.destination.resolve()?;
        let source = source_descriptor.as_path();
        let destination = destination_descriptor.as_path();

        debug!(
            request_id = %request.request_id,
            operation = if request.operation.is_copy() { "copy" } else { "move" },
            source = %source.display(),
            destination = %destination.display(),
            "transfer admitted"
        );

        let policy = RetryPolicy::from_filters(&request.filters);
        let source_entry = self.classify_source(source, &request.filters)?;
        let destination_exists = match self.fs.entry_info(destination, false) {
            Ok(_) => true,
            Err(TransferError::NotFound { .. }) => false,
            Err(error) => return Err(error),
        };
        validate(
            source,
            destination,
            &source_entry,
            destination_exists,
            &request.operation,
        )?;

        let mut result = TransferResult::new(&request.operation, source_entry.is_directory);
        result.start_clock();
        match &request.operation {
            Operation::Copy(options) => {
                self.run_copy(request, &policy, &source_entry, destination, options, &mut result)?;
            }
            Operation::Move(options) => {
                if source_entry.is_directory
                    && destination_exists
                    && options.replace_existing
                    && !options.delay_until_reboot
                {
                    // A native move cannot replace an existing directory.
                    self.fs.delete_tree(destination, true, true)?;
                }
                self.transfer_single(request, &policy, &source_entry, destination, &mut result)?;
            }
        }
        result.stop_clock();

        info!(
            request_id = %request.request_id,
            files = result.total_files,
            folders = result.total_folders,
            bytes = result.total_bytes,
            cancelled = result.cancelled,
            "transfer finished"
        );
        Ok(result)
    }

    /// Look up the source entry, assuming a directory when the lookup
    /// races a deletion and the caller opted into retry handling
    fn classify_source(&self, source: &Path, filters: &EnumerationFilters) -> Result<EntryInfo> {
        match self.fs.entry_info(source, false) {
            Ok(info) => Ok(info),
            Err(TransferError::NotFound { .. }) if filters.error_filter.is_some() => {
                warn!(
                    source = %source.display(),
                    "source metadata unavailable, assuming a directory"
                );
                // Classification can race deletions; downstream calls
                // re-validate and route failures through the policy.
                Ok(EntryInfo::directory(source))
            }
            Err(error) => Err(error),
        }
    }

    fn run_copy(
        &self,
        request: &TransferRequest,
        policy: &RetryPolicy,
        source_entry: &EntryInfo,
        destination: &Path,
        options: &CopyOptions,
        result: &mut TransferResult,
    ) -> Result<()> {
        if source_entry.is_directory && source_entry.is_symlink && options.copy_symbolic_link {
            // A tree walk cannot preserve a directory link; recreate it.
            let link = self.fs.link_target(&source_entry.path)?;
            self.fs.create_symlink(destination, &link.target, link.kind)?;
            report_progress(request, source_entry, result);
            if !result.cancelled {
                result.add_folder();
            }
            Ok(())
        } else if source_entry.is_directory {
            // The destination root is created outside the walk; only
            // enumerated entries reach the totals.
            self.fs.create_dir(destination)?;
            transfer_tree(
                &self.fs,
                request,
                policy,
                source_entry,
                &source_entry.path,
                destination,
                result,
            )
        } else {
            self.transfer_single(request, policy, source_entry, destination, result)
        }
    }

    /// Move the source, or copy a single file, in one backend call
    fn transfer_single(
        &self,
        request: &TransferRequest,
        policy: &RetryPolicy,
        source_entry: &EntryInfo,
        destination: &Path,
        result: &mut TransferResult,
    ) -> Result<()> {
        match policy.run(source_entry, || {
            self.fs.transfer_entry(
                &source_entry.path,
                destination,
                &request.operation,
                request.transaction.as_ref(),
            )
        })? {
            Attempt::Completed(bytes) => {
                report_progress(request, source_entry, result);
                if result.cancelled {
                    return Ok(());
                }
                if source_entry.is_directory {
                    // Whole-tree relocation; the per-entry breakdown is
                    // the backend's business.
                    result.total_folders = 1;
                } else {
                    result.add_file(bytes);
                }
            }
            Attempt::Skipped(error) => {
                warn!(entry = %source_entry.path.display(), "skipping entry: {error}");
                result.record_error(&error);
                report_progress(request, source_entry, result);
            }
        }
        Ok(())
    }
}

/// Reject endpoint combinations no backend call could make sense of
fn validate(
    source: &Path,
    destination: &Path,
    source_entry: &EntryInfo,
    destination_exists: bool,
    operation: &Operation,
) -> Result<()> {
    if source == destination {
        return Err(TransferError::path_conflict(format!(
            "source and destination are the same path: {}",
            source.display()
        )));
    }
    if source_entry.is_directory && destination.starts_with(source) {
        return Err(TransferError::path_conflict(format!(
            "destination {} lies inside source {}",
            destination.display(),
            source.display()
        )));
    }
    match operation {
        Operation::Copy(options) => {
            if options.fail_if_exists && destination_exists {
                return Err(TransferError::path_conflict(format!(
                    "destination already exists: {}",
                    destination.display()
                )));
            }
        }
        Operation::Move(options) => {
            if options.copy_allowed && options.delay_until_reboot {
                return Err(TransferError::invalid_argument(
                    "a move deferred to reboot cannot also allow copy emulation",
                ));
            }
            if !options.replace_existing && destination_exists {
                return Err(TransferError::path_conflict(format!(
                    "destination already exists: {}",
                    destination.display()
                )));
            }
        }
    }
    Ok(())
}
