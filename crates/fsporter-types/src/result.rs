//! Result type alias for fsporter operations

use crate::TransferError;

/// Result type alias for fsporter operations
pub type Result<T> = std::result::Result<T, TransferError>;
