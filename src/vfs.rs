//! # Engine Adapter
//!
//! `PoolVfs` presents the slot pool to the consuming database engine as a
//! virtual file namespace: named files that can be opened, read, written,
//! truncated, synced, and deleted, all backed by pooled slots.
//!
//! ## Layering
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │        Database engine (caller)       │
//! ├──────────────────────────────────────┤
//! │   PoolVfs / FileHandle  (this file)   │  names, flags, outcomes
//! ├──────────────────────────────────────┤
//! │        SlotPool  (pool module)        │  bindings, partitions
//! ├──────────────────────────────────────┤
//! │   SlotStore / SlotIo (store module)   │  physical slots
//! └──────────────────────────────────────┘
//! ```
//!
//! All logical offsets are relative to payload start; the translation past
//! the slot header happens in the pool layer and nowhere else.
//!
//! ## Call Discipline
//!
//! One logical operation in flight at a time. Capacity changes and the
//! constructor (which runs reconciliation) must complete before any
//! per-file call is issued; per-file calls are synchronous and never
//! suspend. File handles are ephemeral per open call; the underlying
//! slots stay open for the pool's lifetime.

use std::path::Path;

use bitflags::bitflags;

use crate::error::PoolError;
use crate::pool::{SharedSlot, SlotPool};
use crate::store::{FsStore, SlotIo, SlotStore};

bitflags! {
    /// Flags for [`PoolVfs::open`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenFlags: u32 {
        /// Bind a free slot if the path has no binding yet.
        const CREATE = 1 << 0;
        /// Destroy the binding when the handle is closed.
        const DELETE_ON_CLOSE = 1 << 1;
    }
}

/// Result of a read: either the buffer was filled, or only a prefix was
/// available and the tail has been zero-filled.
///
/// A short read is an ordinary outcome, not an error; the caller decides
/// whether reading past the end of a file matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The whole buffer was filled from the file.
    Complete,
    /// Only `valid` bytes existed at the offset; the rest of the buffer
    /// is zeroed.
    Short { valid: usize },
}

impl ReadOutcome {
    pub fn is_short(&self) -> bool {
        matches!(self, ReadOutcome::Short { .. })
    }
}

/// An ephemeral handle to an open virtual file.
///
/// Holds the logical path, the open flags, and a shared reference to the
/// bound slot. Dropping a handle without going through
/// [`PoolVfs::close`] leaks nothing but skips delete-on-close.
#[derive(Debug)]
pub struct FileHandle<H: SlotIo> {
    path: String,
    flags: OpenFlags,
    slot: SharedSlot<H>,
}

impl<H: SlotIo> FileHandle<H> {
    /// The logical path this handle was opened under.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn flags(&self) -> OpenFlags {
        self.flags
    }

    /// Reads `buf.len()` bytes at logical `offset`. When fewer bytes are
    /// available the tail of `buf` is zero-filled and the outcome says
    /// how many bytes were real.
    pub fn read(&self, buf: &mut [u8], offset: u64) -> Result<ReadOutcome, PoolError> {
        let valid = self.slot.lock().payload_read(buf, offset)?;

        if valid < buf.len() {
            buf[valid..].fill(0);
            Ok(ReadOutcome::Short { valid })
        } else {
            Ok(ReadOutcome::Complete)
        }
    }

    /// Writes `buf` at logical `offset`, extending the file as needed.
    pub fn write(&self, buf: &[u8], offset: u64) -> Result<(), PoolError> {
        let written = self.slot.lock().payload_write(buf, offset)?;

        if written < buf.len() {
            return Err(PoolError::ShortWrite {
                expected: buf.len(),
                written,
                offset,
            });
        }

        Ok(())
    }

    /// Resizes the file to exactly `size` bytes.
    pub fn truncate(&self, size: u64) -> Result<(), PoolError> {
        self.slot.lock().payload_truncate(size)?;
        Ok(())
    }

    /// Forces the file's writes to durable storage.
    pub fn sync(&self) -> Result<(), PoolError> {
        self.slot.lock().flush()?;
        Ok(())
    }

    /// Current file size in bytes.
    pub fn size(&self) -> Result<u64, PoolError> {
        Ok(self.slot.lock().payload_len()?)
    }
}

/// The virtual filesystem facade over a slot pool.
pub struct PoolVfs<S: SlotStore> {
    pool: SlotPool<S>,
}

impl PoolVfs<FsStore> {
    /// Opens (creating if necessary) a pool directory on the local
    /// filesystem and reconciles it.
    pub fn open_dir<P: AsRef<Path>>(dir: P) -> Result<Self, PoolError> {
        let store = FsStore::new(dir)?;
        Self::new(store)
    }
}

impl<S: SlotStore> PoolVfs<S> {
    /// Builds the namespace over `store`, running startup reconciliation
    /// to completion before returning.
    pub fn new(store: S) -> Result<Self, PoolError> {
        Ok(Self {
            pool: SlotPool::open(store)?,
        })
    }

    /// Opens the file named `path`.
    ///
    /// Without [`OpenFlags::CREATE`], an unbound path is
    /// [`PoolError::NotFound`]. With it, an unbound path takes the next
    /// free slot, or fails with [`PoolError::PoolExhausted`] when none is
    /// left — recoverable only by calling [`PoolVfs::add_capacity`]
    /// first.
    pub fn open(
        &mut self,
        path: &str,
        flags: OpenFlags,
    ) -> Result<FileHandle<S::Slot>, PoolError> {
        let slot = self
            .pool
            .acquire(path, flags.contains(OpenFlags::CREATE))?;

        Ok(FileHandle {
            path: path.to_string(),
            flags,
            slot,
        })
    }

    /// Releases `handle`, honoring [`OpenFlags::DELETE_ON_CLOSE`]. The
    /// underlying slot stays open in the pool.
    pub fn close(&mut self, handle: FileHandle<S::Slot>) -> Result<(), PoolError> {
        if handle.flags.contains(OpenFlags::DELETE_ON_CLOSE) {
            self.pool.release(&handle.path)?;
        }
        Ok(())
    }

    /// Destroys the binding for `path`; a no-op if none exists.
    pub fn delete(&mut self, path: &str) -> Result<(), PoolError> {
        self.pool.release(path)
    }

    /// True iff a binding currently exists for `path`.
    pub fn exists(&self, path: &str) -> bool {
        self.pool.contains(path)
    }

    /// Adds `n` slots to the pool. See [`SlotPool::add_capacity`].
    pub fn add_capacity(&mut self, n: usize) -> Result<usize, PoolError> {
        self.pool.add_capacity(n)
    }

    /// Removes up to `n` free slots. See [`SlotPool::remove_capacity`].
    pub fn remove_capacity(&mut self, n: usize) -> Result<usize, PoolError> {
        self.pool.remove_capacity(n)
    }

    /// Flushes every open slot.
    pub fn sync_all(&mut self) -> Result<(), PoolError> {
        self.pool.sync_all()
    }

    /// The underlying pool, for capacity and binding queries.
    pub fn pool(&self) -> &SlotPool<S> {
        &self.pool
    }
}
