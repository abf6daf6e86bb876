//! # Typed Error Surface
//!
//! This module defines `PoolError`, the error type returned by the
//! engine-facing API (`SlotPool` operations and the `vfs` adapter).
//!
//! ## Two-Layer Error Model
//!
//! Internal plumbing (store implementations, header I/O) reports failures
//! as `eyre` results with contextual wrapping. The public surface converts
//! those into structured variants because the consuming engine dispatches
//! on the *kind* of failure: an open that finds no binding is handled very
//! differently from an exhausted pool, and neither should require string
//! matching.
//!
//! ## Propagation Policy
//!
//! Pool-management failures (`PoolExhausted`, `PathTooLong`) are terminal
//! for that call only and never corrupt pool state. Per-file I/O failures
//! surface as `Backend` and the engine retries or aborts by its own
//! policy; no operation here performs automatic retries.
//!
//! A short *read* is not an error: it is reported as a value
//! (`vfs::ReadOutcome::Short`) with the unread tail zero-filled. A header
//! digest mismatch is also never surfaced; reconciliation repairs the slot
//! to the free state.

use thiserror::Error;

/// Error type for slot pool and virtual-file operations.
#[derive(Error, Debug)]
pub enum PoolError {
    /// Open without create, and no binding exists for the path.
    #[error("no slot bound to '{path}'")]
    NotFound { path: String },

    /// Create requested but the free partition is empty. Recoverable only
    /// by the caller adding capacity first; the pool never grows itself.
    #[error("slot pool exhausted: all {capacity} slots are bound")]
    PoolExhausted { capacity: usize },

    /// Encoding the path would overflow the fixed header field. The slot
    /// being rebound is untouched: no header write begins until encoding
    /// succeeds.
    #[error("logical path exceeds the {limit}-byte header field ({len} bytes): '{path}'")]
    PathTooLong {
        path: String,
        len: usize,
        limit: usize,
    },

    /// The path cannot round-trip through the null-padded header field.
    #[error("logical path contains a NUL byte: {path:?}")]
    InvalidPath { path: String },

    /// A write landed fewer bytes than requested.
    #[error("short write at payload offset {offset}: {written} of {expected} bytes")]
    ShortWrite {
        expected: usize,
        written: usize,
        offset: u64,
    },

    /// Failure reported by the storage substrate.
    #[error("storage backend failure: {0}")]
    Backend(eyre::Report),
}

impl From<eyre::Report> for PoolError {
    fn from(report: eyre::Report) -> Self {
        PoolError::Backend(report)
    }
}
