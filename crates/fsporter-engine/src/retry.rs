//! Per-entry retry policy
//!
//! Decides, for each failed entry operation, whether to re-attempt it after
//! a delay, skip the entry and continue, or abort the whole transfer. The
//! decision defers to a caller-supplied error filter; without one, every
//! error aborts.

use crate::request::EnumerationFilters;
use fsporter_types::{EntryInfo, Result, TransferError};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// What to do with a failed per-entry operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryVerdict {
    /// Re-attempt the same entry after the configured delay
    Retry,
    /// Record the error on the result and continue with the next entry
    Skip,
    /// Stop the transfer and propagate the error
    Abort,
}

/// Caller-supplied decision function consulted for each failed entry
pub type ErrorFilter = Arc<dyn Fn(&TransferError, &EntryInfo) -> RetryVerdict + Send + Sync>;

/// How a guarded operation ended when the policy did not abort
#[derive(Debug)]
pub enum Attempt<T> {
    /// The operation succeeded, possibly after retries
    Completed(T),
    /// The policy skipped the entry; the terminal error is carried along
    Skipped(TransferError),
}

const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_RETRY_TIMEOUT: Duration = Duration::from_millis(10);

/// Retry decision logic for one transfer
///
/// The default policy is fail-fast: no filter, no retries.
#[derive(Clone, Default)]
pub struct RetryPolicy {
    max_retries: u32,
    retry_timeout: Duration,
    filter: Option<ErrorFilter>,
}

impl RetryPolicy {
    /// Build the policy a request's enumeration filters imply
    ///
    /// Retry is switched on by the presence of an error filter. A filter
    /// with both knobs at zero selects the defaults (2 retries, 10 ms), so
    /// callers opting in always get a working ceiling and delay.
    pub fn from_filters(filters: &EnumerationFilters) -> Self {
        let filter = filters.error_filter.clone();
        let (max_retries, retry_timeout) =
            if filter.is_some() && filters.retry_count == 0 && filters.retry_timeout.is_zero() {
                (DEFAULT_MAX_RETRIES, DEFAULT_RETRY_TIMEOUT)
            } else {
                (filters.retry_count, filters.retry_timeout)
            };
        Self {
            max_retries,
            retry_timeout,
            filter,
        }
    }

    /// The attempt ceiling in force
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// The delay applied between attempts
    pub fn retry_timeout(&self) -> Duration {
        self.retry_timeout
    }

    /// Decide what to do with `error` on the given 1-based attempt
    ///
    /// Exhaustion wins over the filter: once `attempt_number` exceeds the
    /// ceiling, a `Retry` answer is forced to `Abort`.
    pub fn should_retry(
        &self,
        error: &TransferError,
        entry: &EntryInfo,
        attempt_number: u32,
    ) -> RetryVerdict {
        let Some(filter) = &self.filter else {
            return RetryVerdict::Abort;
        };
        match filter(error, entry) {
            RetryVerdict::Retry if attempt_number > self.max_retries => RetryVerdict::Abort,
            verdict => verdict,
        }
    }

    /// Run `operation` for `entry` under this policy
    ///
    /// The delay between attempts is a blocking sleep. `Err` is returned
    /// only when the policy aborts; a skipped entry comes back as
    /// `Ok(Attempt::Skipped)` carrying the terminal error for the caller
    /// to record.
    pub fn run<T>(
        &self,
        entry: &EntryInfo,
        mut operation: impl FnMut() -> Result<T>,
    ) -> Result<Attempt<T>> {
        let mut attempt_number = 0u32;
        loop {
            attempt_number += 1;
            let error = match operation() {
                Ok(value) => return Ok(Attempt::Completed(value)),
                Err(error) => error,
            };
            match self.should_retry(&error, entry, attempt_number) {
                RetryVerdict::Retry => {
                    debug!(
                        entry = %entry.path.display(),
                        attempt_number,
                        "retrying after {:?}: {error}",
                        self.retry_timeout
                    );
                    std::thread::sleep(self.retry_timeout);
                }
                RetryVerdict::Skip => return Ok(Attempt::Skipped(error)),
                RetryVerdict::Abort => return Err(error),
            }
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("retry_timeout", &self.retry_timeout)
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}
