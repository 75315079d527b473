//! Error types for quantastore
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for quantastore operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // Resource Errors
    // -------------------------------------------------------------------------
    #[error("allocation failed")]
    OutOfMemory,

    // -------------------------------------------------------------------------
    // Transfer Errors
    // -------------------------------------------------------------------------
    /// A caller-boundary buffer copy failed mid-transfer. Aborts only the
    /// in-progress operation; the device stays usable.
    #[error("buffer copy fault")]
    AccessFault,

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    /// The wait for a device guard was cancelled. Retryable: the caller is
    /// expected to reissue the operation.
    #[error("guard wait interrupted")]
    Interrupted,

    // -------------------------------------------------------------------------
    // Argument Errors
    // -------------------------------------------------------------------------
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // -------------------------------------------------------------------------
    // Control-Plane Errors
    // -------------------------------------------------------------------------
    #[error("permission denied")]
    PermissionDenied,

    #[error("unsupported control opcode: {opcode:#06x}")]
    NotSupported { opcode: u32 },
}
