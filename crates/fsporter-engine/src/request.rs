//! Transfer requests and their tuning knobs
//!
//! A [`TransferRequest`] bundles everything one transfer needs: the two
//! endpoint descriptors, the operation with its options, an optional
//! transaction handle, the enumeration filters, and an optional progress
//! callback. Requests are built with the `with_*` methods and handed to
//! [`TransferEngine::execute`](crate::TransferEngine::execute) by reference,
//! so one request can drive repeated transfers.

use crate::retry::{ErrorFilter, RetryVerdict};
use fsporter_types::{
    CopyOptions, EntryInfo, MoveOptions, Operation, PathDescriptor, RequestId, TransactionHandle,
    TransferError, TransferResult,
};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Answer a progress callback gives after each completed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressDecision {
    /// Keep transferring
    Continue,
    /// Stop the transfer; the partial result is kept and the entry in
    /// flight stays out of its totals
    Cancel,
}

/// Callback consulted after each entry's operation, before the entry
/// joins the running totals
pub type ProgressCallback = Arc<dyn Fn(&EntryInfo, &TransferResult) -> ProgressDecision + Send + Sync>;

/// Predicate over enumerated entries
pub type EntryFilter = Arc<dyn Fn(&EntryInfo) -> bool + Send + Sync>;

/// Tuning knobs applied while walking a directory tree
///
/// All fields default to off: no retries, nothing filtered out.
#[derive(Clone, Default)]
pub struct EnumerationFilters {
    /// Decision function for failed entry operations; its presence switches
    /// retry handling on
    pub error_filter: Option<ErrorFilter>,
    /// Retry ceiling per entry; zero together with a zero timeout selects
    /// the built-in defaults when an error filter is set
    pub retry_count: u32,
    /// Delay between attempts on the same entry
    pub retry_timeout: Duration,
    /// Keeps only matching non-directory entries; directories are always
    /// created at the destination
    pub inclusion_filter: Option<EntryFilter>,
    /// Gates descent: a subdirectory failing the predicate is neither
    /// created nor walked
    pub recursion_filter: Option<EntryFilter>,
}

impl EnumerationFilters {
    /// Create filters with everything switched off
    pub fn new() -> Self {
        Self::default()
    }

    /// Canned filter that retries transient errors and aborts on the rest
    ///
    /// Sharing violations and uncategorized I/O errors are re-attempted
    /// with the default ceiling and delay.
    pub fn retry_transient() -> Self {
        Self::new().with_error_filter(|error, _| {
            if error.is_retryable() {
                RetryVerdict::Retry
            } else {
                RetryVerdict::Abort
            }
        })
    }

    /// Set the error filter
    pub fn with_error_filter(
        mut self,
        filter: impl Fn(&TransferError, &EntryInfo) -> RetryVerdict + Send + Sync + 'static,
    ) -> Self {
        self.error_filter = Some(Arc::new(filter));
        self
    }

    /// Set the retry ceiling and the delay between attempts
    pub fn with_retry(mut self, count: u32, timeout: Duration) -> Self {
        self.retry_count = count;
        self.retry_timeout = timeout;
        self
    }

    /// Set the inclusion filter for non-directory entries
    pub fn with_inclusion_filter(
        mut self,
        filter: impl Fn(&EntryInfo) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.inclusion_filter = Some(Arc::new(filter));
        self
    }

    /// Set the recursion filter for subdirectories
    pub fn with_recursion_filter(
        mut self,
        filter: impl Fn(&EntryInfo) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.recursion_filter = Some(Arc::new(filter));
        self
    }
}

impl fmt::Debug for EnumerationFilters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumerationFilters")
            .field("error_filter", &self.error_filter.is_some())
            .field("retry_count", &self.retry_count)
            .field("retry_timeout", &self.retry_timeout)
            .field("inclusion_filter", &self.inclusion_filter.is_some())
            .field("recursion_filter", &self.recursion_filter.is_some())
            .finish()
    }
}

/// One copy or move to perform
///
/// # Examples
///
/// ```
/// use fsporter_engine::TransferRequest;
/// use fsporter_types::CopyOptions;
///
/// let request = TransferRequest::copy("/data/in", "/data/out", CopyOptions::new());
/// assert!(request.operation.is_copy());
/// assert!(request.progress.is_none());
/// ```
#[derive(Clone)]
pub struct TransferRequest {
    /// Where the content comes from
    pub source: PathDescriptor,
    /// Where the content goes
    pub destination: PathDescriptor,
    /// Copy or move, with the respective options
    pub operation: Operation,
    /// Transaction the backend should enlist in, if any
    pub transaction: Option<TransactionHandle>,
    /// Retry and enumeration tuning
    pub filters: EnumerationFilters,
    /// Invoked after each completed entry
    pub progress: Option<ProgressCallback>,
    /// Correlates log lines for this transfer
    pub request_id: RequestId,
}

impl TransferRequest {
    /// Create a copy request from plain paths
    pub fn copy(
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        options: CopyOptions,
    ) -> Self {
        Self::with_descriptors(
            PathDescriptor::relative(source),
            PathDescriptor::relative(destination),
            Operation::Copy(options),
        )
    }

    /// Create a move request from plain paths
    pub fn move_entry(
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        options: MoveOptions,
    ) -> Self {
        Self::with_descriptors(
            PathDescriptor::relative(source),
            PathDescriptor::relative(destination),
            Operation::Move(options),
        )
    }

    /// Create a request from pre-built path descriptors
    pub fn with_descriptors(
        source: PathDescriptor,
        destination: PathDescriptor,
        operation: Operation,
    ) -> Self {
        Self {
            source,
            destination,
            operation,
            transaction: None,
            filters: EnumerationFilters::default(),
            progress: None,
            request_id: RequestId::new_v4(),
        }
    }

    /// Enlist the transfer in a transaction
    pub fn with_transaction(mut self, transaction: TransactionHandle) -> Self {
        self.transaction = Some(transaction);
        self
    }

    /// Replace the enumeration filters
    pub fn with_filters(mut self, filters: EnumerationFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Set the progress callback
    pub fn with_progress(
        mut self,
        callback: impl Fn(&EntryInfo, &TransferResult) -> ProgressDecision + Send + Sync + 'static,
    ) -> Self {
        self.progress = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for TransferRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferRequest")
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("operation", &self.operation)
            .field("transaction", &self.transaction)
            .field("filters", &self.filters)
            .field("progress", &self.progress.is_some())
            .field("request_id", &self.request_id)
            .finish()
    }
}
