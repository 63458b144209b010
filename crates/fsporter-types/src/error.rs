//! Error types and handling for fsporter
//!
//! This module provides the error taxonomy for transfer operations. Every error
//! carries enough context to be logged, reported on a transfer result, and fed
//! to a retry filter. Cancellation is deliberately not an error: it is a flag
//! on the transfer result.

use std::path::PathBuf;

// Serde is imported conditionally through cfg_attr

/// Error severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Low severity - operation can continue
    Low,
    /// Medium severity - operation may be retried
    Medium,
    /// High severity - operation should be aborted
    High,
    /// Critical severity - the volume itself is in trouble
    Critical,
}

/// Main error type for fsporter operations
#[derive(thiserror::Error, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransferError {
    /// Malformed request or parameter
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the offending argument
        message: String,
    },

    /// Path failed canonicalization or validation
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath {
        /// The path that failed to resolve
        path: PathBuf,
        /// Why the path was rejected
        reason: String,
    },

    /// Source/destination combination is not permitted
    #[error("Path conflict: {message}")]
    PathConflict {
        /// Description of the conflicting paths
        message: String,
    },

    /// Entry does not exist
    #[error("Not found: {path}")]
    NotFound {
        /// Path to the entry that was not found
        path: PathBuf,
    },

    /// Permission denied by the filesystem
    #[error("Access denied: {path}")]
    AccessDenied {
        /// Path to the entry with permission issues
        path: PathBuf,
    },

    /// Entry is locked or in use by another process
    #[error("Sharing violation: {path}")]
    SharingViolation {
        /// Path to the busy entry
        path: PathBuf,
    },

    /// Destination volume is out of space
    #[error("Disk full while writing: {path}")]
    DiskFull {
        /// Path being written when the volume filled up
        path: PathBuf,
    },

    /// Destination volume quota exhausted
    #[error("Quota exceeded while writing: {path}")]
    QuotaExceeded {
        /// Path being written when the quota ran out
        path: PathBuf,
    },

    /// Requested feature is not available on this platform or backend
    #[error("Platform does not support {feature}")]
    PlatformUnsupported {
        /// The feature that cannot be provided
        feature: String,
    },

    /// Uncategorized I/O failure
    #[error("I/O error: {message}")]
    Io {
        /// Error message from the I/O operation
        message: String,
        /// Raw OS status code, when the OS supplied one
        code: Option<i32>,
    },
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed request or parameter
    InvalidArgument,
    /// Path validation failure
    InvalidPath,
    /// Disallowed source/destination combination
    PathConflict,
    /// Missing entry
    NotFound,
    /// Permission failure
    AccessDenied,
    /// Entry locked by another process
    SharingViolation,
    /// Volume out of space
    DiskFull,
    /// Volume quota exhausted
    QuotaExceeded,
    /// Feature unavailable on this platform
    PlatformUnsupported,
    /// Uncategorized I/O failure
    Io,
}

impl TransferError {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::InvalidPath { .. } => ErrorKind::InvalidPath,
            Self::PathConflict { .. } => ErrorKind::PathConflict,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AccessDenied { .. } => ErrorKind::AccessDenied,
            Self::SharingViolation { .. } => ErrorKind::SharingViolation,
            Self::DiskFull { .. } => ErrorKind::DiskFull,
            Self::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
            Self::PlatformUnsupported { .. } => ErrorKind::PlatformUnsupported,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Get the stable numeric status code for this error
    ///
    /// Codes follow the Win32 status numbering so results stay comparable
    /// across backends; uncategorized I/O errors keep their raw OS code.
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidArgument { .. } => 87,
            Self::InvalidPath { .. } => 123,
            Self::PathConflict { .. } => 183,
            Self::NotFound { .. } => 2,
            Self::AccessDenied { .. } => 5,
            Self::SharingViolation { .. } => 32,
            Self::DiskFull { .. } => 112,
            Self::QuotaExceeded { .. } => 1295,
            Self::PlatformUnsupported { .. } => 50,
            Self::Io { code, .. } => code.unwrap_or(31),
        }
    }

    /// Get the error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidArgument { .. } | Self::InvalidPath { .. } => ErrorSeverity::High,
            Self::PathConflict { .. } => ErrorSeverity::High,
            Self::NotFound { .. } => ErrorSeverity::Medium,
            Self::AccessDenied { .. } => ErrorSeverity::High,
            Self::SharingViolation { .. } => ErrorSeverity::Medium,
            Self::DiskFull { .. } | Self::QuotaExceeded { .. } => ErrorSeverity::Critical,
            Self::PlatformUnsupported { .. } => ErrorSeverity::High,
            Self::Io { .. } => ErrorSeverity::Medium,
        }
    }

    /// Check if this error is typically transient and worth retrying
    ///
    /// Used by the canned retry filter; a custom error filter is free to
    /// decide differently per entry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SharingViolation { .. } | Self::Io { .. })
    }

    /// Check if this error signals an exhausted volume
    pub fn is_fatal(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }

    /// Create a new invalid-argument error
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a new invalid-path error
    pub fn invalid_path<P: Into<PathBuf>, S: Into<String>>(path: P, reason: S) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new path-conflict error
    pub fn path_conflict<S: Into<String>>(message: S) -> Self {
        Self::PathConflict {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<P: Into<PathBuf>>(path: P) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a new access-denied error
    pub fn access_denied<P: Into<PathBuf>>(path: P) -> Self {
        Self::AccessDenied { path: path.into() }
    }

    /// Create a new platform-unsupported error
    pub fn platform_unsupported<S: Into<String>>(feature: S) -> Self {
        Self::PlatformUnsupported {
            feature: feature.into(),
        }
    }

    /// Create the error an OS reports for a rename across device boundaries
    pub fn cross_device() -> Self {
        Self::Io {
            message: "rename crossed a device boundary".to_string(),
            code: cross_device_code(),
        }
    }

    /// Check if this error is the OS refusing a rename across devices
    pub fn is_cross_device(&self) -> bool {
        matches!(self, Self::Io { code: Some(code), .. } if Some(*code) == cross_device_code())
    }

    /// Classify an OS error against a known path
    ///
    /// Backends should prefer this over the plain `From` conversion so that
    /// not-found, access-denied, sharing, and volume-exhaustion conditions
    /// land in their own taxonomy classes instead of the `Io` catch-all.
    pub fn from_io(error: std::io::Error, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            std::io::ErrorKind::PermissionDenied => Self::AccessDenied { path },
            _ => match error.raw_os_error() {
                Some(code) if is_disk_full(code) => Self::DiskFull { path },
                Some(code) if is_quota_exceeded(code) => Self::QuotaExceeded { path },
                Some(code) if is_sharing_violation(code) => Self::SharingViolation { path },
                code => Self::Io {
                    message: error.to_string(),
                    code,
                },
            },
        }
    }
}

impl From<std::io::Error> for TransferError {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            code: error.raw_os_error(),
            message: error.to_string(),
        }
    }
}

// ERROR_NOT_SAME_DEVICE
#[cfg(windows)]
fn cross_device_code() -> Option<i32> {
    Some(17)
}

// EXDEV
#[cfg(unix)]
fn cross_device_code() -> Option<i32> {
    Some(18)
}

#[cfg(not(any(unix, windows)))]
fn cross_device_code() -> Option<i32> {
    None
}

// ERROR_DISK_FULL / ERROR_HANDLE_DISK_FULL
#[cfg(windows)]
fn is_disk_full(code: i32) -> bool {
    code == 112 || code == 39
}

// ENOSPC
#[cfg(unix)]
fn is_disk_full(code: i32) -> bool {
    code == 28
}

#[cfg(not(any(unix, windows)))]
fn is_disk_full(_code: i32) -> bool {
    false
}

// ERROR_DISK_QUOTA_EXCEEDED
#[cfg(windows)]
fn is_quota_exceeded(code: i32) -> bool {
    code == 1295
}

// EDQUOT
#[cfg(unix)]
fn is_quota_exceeded(code: i32) -> bool {
    code == 122
}

#[cfg(not(any(unix, windows)))]
fn is_quota_exceeded(_code: i32) -> bool {
    false
}

// ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION
#[cfg(windows)]
fn is_sharing_violation(code: i32) -> bool {
    code == 32 || code == 33
}

// EBUSY / ETXTBSY
#[cfg(unix)]
fn is_sharing_violation(code: i32) -> bool {
    code == 16 || code == 26
}

#[cfg(not(any(unix, windows)))]
fn is_sharing_violation(_code: i32) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::path::PathBuf;

    // Property tests for error classification
    proptest! {
        #[test]
        fn test_error_kind_consistency(
            message in ".*"
        ) {
            let path = PathBuf::from("/some/path");
            let errors = vec![
                TransferError::InvalidArgument { message: message.clone() },
                TransferError::InvalidPath { path: path.clone(), reason: message.clone() },
                TransferError::PathConflict { message: message.clone() },
                TransferError::NotFound { path: path.clone() },
                TransferError::AccessDenied { path: path.clone() },
                TransferError::SharingViolation { path: path.clone() },
                TransferError::DiskFull { path: path.clone() },
                TransferError::QuotaExceeded { path: path.clone() },
                TransferError::PlatformUnsupported { feature: message.clone() },
                TransferError::Io { message: message.clone(), code: None },
            ];

            for error in errors {
                let severity = error.severity();

                // Every error maps to a valid severity and a non-zero code
                prop_assert!(matches!(severity,
                    ErrorSeverity::Low | ErrorSeverity::Medium |
                    ErrorSeverity::High | ErrorSeverity::Critical));
                prop_assert!(error.code() != 0);

                // Retryable errors are never fatal
                if error.is_retryable() {
                    prop_assert!(!error.is_fatal());
                }

                // Fatal errors are exactly the critical ones
                prop_assert_eq!(error.is_fatal(), severity == ErrorSeverity::Critical);
            }
        }

        #[test]
        fn test_io_code_passthrough(
            code in 1i32..10_000i32,
            message in ".*"
        ) {
            let error = TransferError::Io { message, code: Some(code) };
            prop_assert_eq!(error.code(), code);
            prop_assert_eq!(error.kind(), ErrorKind::Io);
        }
    }

    #[test]
    fn test_error_severity_ordering() {
        assert!(ErrorSeverity::Low < ErrorSeverity::Medium);
        assert!(ErrorSeverity::Medium < ErrorSeverity::High);
        assert!(ErrorSeverity::High < ErrorSeverity::Critical);
    }

    #[test]
    fn test_stable_status_codes() {
        assert_eq!(TransferError::invalid_argument("x").code(), 87);
        assert_eq!(TransferError::not_found("/a").code(), 2);
        assert_eq!(TransferError::access_denied("/a").code(), 5);
        assert_eq!(
            TransferError::SharingViolation { path: "/a".into() }.code(),
            32
        );
        assert_eq!(TransferError::DiskFull { path: "/a".into() }.code(), 112);
        assert_eq!(TransferError::path_conflict("x").code(), 183);
        assert_eq!(TransferError::platform_unsupported("x").code(), 50);
    }

    #[test]
    fn test_io_error_conversion_keeps_raw_code() {
        let io_error = std::io::Error::from_raw_os_error(5);
        let error = TransferError::from(io_error);

        assert_eq!(error.kind(), ErrorKind::Io);
        assert_eq!(error.code(), 5);
    }

    #[test]
    fn test_from_io_classifies_not_found() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error = TransferError::from_io(io_error, "/missing/file.txt");

        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert!(error.to_string().contains("/missing/file.txt"));
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_from_io_classifies_permission_denied() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let error = TransferError::from_io(io_error, "/protected");

        assert_eq!(error.kind(), ErrorKind::AccessDenied);
        assert_eq!(error.severity(), ErrorSeverity::High);
        assert!(!error.is_retryable());
    }

    #[cfg(unix)]
    #[test]
    fn test_from_io_classifies_disk_full() {
        let io_error = std::io::Error::from_raw_os_error(28);
        let error = TransferError::from_io(io_error, "/mnt/full");

        assert_eq!(error.kind(), ErrorKind::DiskFull);
        assert!(error.is_fatal());
        assert!(!error.is_retryable());
    }

    #[cfg(unix)]
    #[test]
    fn test_from_io_classifies_busy_as_sharing_violation() {
        let io_error = std::io::Error::from_raw_os_error(16);
        let error = TransferError::from_io(io_error, "/busy/file");

        assert_eq!(error.kind(), ErrorKind::SharingViolation);
        assert!(error.is_retryable());
    }

    #[test]
    fn test_sharing_violation_is_retryable_not_fatal() {
        let error = TransferError::SharingViolation {
            path: PathBuf::from("/locked.db"),
        };

        assert!(error.is_retryable());
        assert!(!error.is_fatal());
        assert_eq!(error.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_quota_exceeded_is_fatal() {
        let error = TransferError::QuotaExceeded {
            path: PathBuf::from("/home/user"),
        };

        assert!(error.is_fatal());
        assert!(!error.is_retryable());
        assert_eq!(error.code(), 1295);
    }

    #[cfg(any(unix, windows))]
    #[test]
    fn test_cross_device_classification_is_symmetric() {
        let error = TransferError::cross_device();
        assert!(error.is_cross_device());
        assert!(!TransferError::not_found("/x").is_cross_device());
        assert!(
            !TransferError::Io {
                message: "other".to_string(),
                code: Some(9999),
            }
            .is_cross_device()
        );
    }
}
