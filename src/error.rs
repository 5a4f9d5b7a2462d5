//! Typed error surface for the public API.
//!
//! Internal glue still favors direct `io::Error` propagation the way the
//! storage layer is written, but every public constructor and mutation
//! returns this enum so callers can match on failure kind instead of
//! string-sniffing a message.

use thiserror::Error;

/// Result alias used throughout the public API.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Failure kinds a graph handle can report.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Open, map, truncate, or close failed at the OS level.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad magic or an internally inconsistent header.
    #[error("bad file format: {reason}")]
    Format {
        /// What about the header failed validation.
        reason: String,
    },

    /// A mutating call was made on a handle opened read-only.
    #[error("graph handle is read-only")]
    ReadOnly,

    /// A node or edge id fell outside the current node/edge count.
    #[error("{what} id {id} is out of range")]
    OutOfRange {
        /// Which kind of id was out of range ("node" or "edge").
        what: &'static str,
        /// The offending id.
        id: u64,
    },

    /// The file could not be extended to satisfy an allocation.
    #[error("failed to allocate {requested} bytes")]
    AllocationFailure {
        /// Bytes requested when the allocation failed.
        requested: u64,
    },

    /// A directed operation was attempted on a v1 graph, or vice versa.
    #[error("wrong graph version: expected {expected}, found {found}")]
    WrongVersion {
        /// Version the caller required.
        expected: u8,
        /// Version actually stored in the header.
        found: u8,
    },
}
