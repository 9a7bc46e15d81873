//! Error types for record mapping operations.
//!
//! This module provides the [`MarcMapError`] type for all record mapping
//! operations and the [`Result`] convenience type.

use thiserror::Error;

/// Error type for all record mapping operations.
///
/// Every violation is raised synchronously at the point it is detected; the
/// library performs no retries and no recovery. An inconsistency in
/// caller-supplied input is a programming error and surfaces immediately.
#[derive(Error, Debug)]
pub enum MarcMapError {
    /// An explicit order sequence references a key more times than values
    /// are available for it. A scalar value satisfies exactly one
    /// occurrence; a key absent from the mapping has zero available.
    #[error("Order arity mismatch: {0}")]
    ArityMismatch(String),

    /// An attempted mutation of a container after construction. The
    /// container supports none; callers must build a new instance.
    #[error("Immutable container: {0}")]
    Immutable(String),

    /// Checked indexed access to an absent key.
    #[error("Missing key: {0}")]
    MissingKey(String),

    /// A translated input key matched no registered rule.
    #[error("No matching rule for key: {0}")]
    NoRule(String),

    /// Malformed input at the serialization boundary, such as a non-object
    /// value where a record was expected or a reserved order entry that is
    /// not a list of key names.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience type alias for [`std::result::Result`] with [`MarcMapError`].
pub type Result<T> = std::result::Result<T, MarcMapError>;
