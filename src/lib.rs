//! # poolfs - Slot-Pooled Virtual File Namespace
//!
//! poolfs presents a database engine with an arbitrary number of named
//! logical files, backed by a *pre-allocated* pool of physical storage
//! slots, on substrates that only offer synchronous handle-based block
//! storage with no file names the engine understands. The name↔slot
//! association is persisted durably in a per-slot header and recovered by
//! reconciliation on every startup.
//!
//! ## Quick Start
//!
//! ```ignore
//! use poolfs::{OpenFlags, PoolVfs};
//!
//! let mut vfs = PoolVfs::open_dir("./pool")?;
//! vfs.add_capacity(4)?;
//!
//! let db = vfs.open("/main.db", OpenFlags::CREATE)?;
//! db.write(b"page zero", 0)?;
//! db.sync()?;
//! vfs.close(db)?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │       Database engine (caller)       │
//! ├─────────────────────────────────────┤
//! │   vfs: PoolVfs / FileHandle / flags  │
//! ├─────────────────────────────────────┤
//! │   pool: SlotPool / SlotHeader        │
//! ├─────────────────────────────────────┤
//! │   store: SlotStore / SlotIo seam     │
//! ├─────────────────────────────────────┤
//! │   FsStore (directory) │ MemStore     │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Slot Layout
//!
//! ```text
//! pool_dir/
//! ├── 000000.slot    # [path: 512B][crc64: 8B][payload...]
//! ├── 000001.slot
//! └── ...
//! ```
//!
//! Physical names are opaque; the logical namespace lives entirely in the
//! slot headers. Every bound slot carries its path and a digest over the
//! padded path field, so a restart (or a crash mid-write) reconstructs
//! exactly the bindings that were durably committed, and corrupt headers
//! self-heal to the free state.
//!
//! ## Capacity Model
//!
//! The pool never grows on its own. Opening with create on an exhausted
//! pool fails; the caller adds capacity explicitly and retries. Capacity
//! contraction only ever removes free slots.
//!
//! ## Module Overview
//!
//! - [`config`]: persistent layout constants
//! - [`error`]: the typed error surface
//! - [`store`]: substrate traits plus filesystem and in-memory backends
//! - [`pool`]: the slot pool manager and header format
//! - [`vfs`]: the engine-facing adapter

pub mod config;
pub mod error;
pub mod pool;
pub mod store;
pub mod vfs;

pub use error::PoolError;
pub use pool::{SlotHeader, SlotPool};
pub use store::{FsStore, MemStore, SlotIo, SlotStore};
pub use vfs::{FileHandle, OpenFlags, PoolVfs, ReadOutcome};
