//! # Storage Substrate
//!
//! This module provides the seam between the slot pool and the physical
//! storage it manages: a flat directory of opaque, independently openable
//! storage units with synchronous random-access read/write, explicit
//! truncate, and explicit flush.
//!
//! ## Architecture Overview
//!
//! The pool never performs I/O directly. It consumes two traits:
//!
//! - [`SlotStore`]: directory-level primitives (enumerate, create, open,
//!   remove), with an associated slot handle type
//! - [`SlotIo`]: per-slot primitives (positional read/write, truncate,
//!   flush, length)
//!
//! Everything above this module is substrate-agnostic; the partition
//! bookkeeping, header format, and allocation policy are identical over
//! any backend.
//!
//! ## Backends
//!
//! | Backend    | Medium            | Persistence | Intended use        |
//! |------------|-------------------|-------------|---------------------|
//! | `FsStore`  | flat directory    | durable     | production          |
//! | `MemStore` | shared byte maps  | none        | tests, ephemera     |
//!
//! ## Copy-Based Interface
//!
//! `SlotIo` uses copy semantics (caller-provided buffers, explicit
//! offsets). This matches substrates that cannot hand out stable memory
//! references, and it keeps short reads observable: `read_at` reports how
//! many bytes were actually available so the caller can zero-fill and
//! signal the condition distinctly.
//!
//! ## Thread Safety
//!
//! Slot handles are `Send` but assume one logical operation in flight at a
//! time; callers that share a handle wrap it in a lock (the pool wraps
//! every slot in `Arc<Mutex<..>>`).

mod driver;
mod fs;
mod mem;

pub use driver::{SlotIo, SlotStore};
pub use fs::{FsSlot, FsStore};
pub use mem::{MemSlot, MemStore};
