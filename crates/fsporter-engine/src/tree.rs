//! Depth-first tree copy
//!
//! Parents are created before their children. Symbolic links are
//! transferred as entries in their own right, never followed, so a link
//! into the tree cannot make the walk revisit it.

use crate::request::{ProgressDecision, TransferRequest};
use crate::retry::{Attempt, RetryPolicy};
use fsporter_types::{EntryInfo, FileSystem, Result, TransferResult};
use std::path::Path;
use tracing::warn;

/// Copy the children of `source` into `destination`, recursing into
/// sub-directories
///
/// `destination` must already exist. A directory's listing is collected
/// in full before any of it is transferred, so a retried enumeration
/// starts from scratch with nothing partially done.
pub(crate) fn transfer_tree<F: FileSystem>(
    fs: &F,
    request: &TransferRequest,
    policy: &RetryPolicy,
    root: &EntryInfo,
    source: &Path,
    destination: &Path,
    result: &mut TransferResult,
) -> Result<()> {
    let listing = match policy.run(root, || {
        fs.enumerate_children(source).collect::<Result<Vec<_>>>()
    })? {
        Attempt::Completed(listing) => listing,
        Attempt::Skipped(error) => {
            warn!(directory = %source.display(), "skipping unreadable directory: {error}");
            result.record_error(&error);
            return Ok(());
        }
    };

    for entry in listing {
        if result.cancelled {
            return Ok(());
        }
        let Some(name) = entry.file_name() else {
            continue;
        };
        let target = destination.join(name);

        if entry.is_directory && !entry.is_symlink {
            if let Some(filter) = &request.filters.recursion_filter {
                if !filter(&entry) {
                    continue;
                }
            }
            match policy.run(&entry, || fs.create_dir(&target))? {
                Attempt::Completed(()) => {
                    report_progress(request, &entry, result);
                    if result.cancelled {
                        return Ok(());
                    }
                    result.add_folder();
                    transfer_tree(fs, request, policy, &entry, &entry.path, &target, result)?;
                }
                Attempt::Skipped(error) => {
                    warn!(entry = %entry.path.display(), "skipping directory: {error}");
                    result.record_error(&error);
                    report_progress(request, &entry, result);
                }
            }
        } else {
            // Directory links land here too; the inclusion filter only
            // sees plain entries.
            let included = entry.is_directory
                || request
                    .filters
                    .inclusion_filter
                    .as_ref()
                    .map_or(true, |filter| filter(&entry));
            if !included {
                continue;
            }
            match policy.run(&entry, || {
                fs.transfer_entry(
                    &entry.path,
                    &target,
                    &request.operation,
                    request.transaction.as_ref(),
                )
            })? {
                Attempt::Completed(_) => {
                    report_progress(request, &entry, result);
                    if result.cancelled {
                        return Ok(());
                    }
                    if entry.is_directory {
                        result.add_folder();
                    } else {
                        result.add_file(entry.file_size);
                    }
                }
                Attempt::Skipped(error) => {
                    warn!(entry = %entry.path.display(), "skipping entry: {error}");
                    result.record_error(&error);
                    report_progress(request, &entry, result);
                }
            }
        }
    }
    Ok(())
}

/// Invoke the request's progress callback, if any, and fold a `Cancel`
/// answer into the result
///
/// Callers poll before counting, so an entry the callback cancels on
/// never reaches the totals.
pub(crate) fn report_progress(
    request: &TransferRequest,
    entry: &EntryInfo,
    result: &mut TransferResult,
) {
    if let Some(callback) = &request.progress {
        if callback(entry, result) == ProgressDecision::Cancel {
            result.cancelled = true;
        }
    }
}
