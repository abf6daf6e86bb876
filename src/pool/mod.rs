//! # Slot Pool Manager
//!
//! This module owns the complete mapping between logical paths and
//! physical slots: the persistent header scheme, the free/bound
//! partition, the allocation policy, and capacity changes. It is the only
//! layer with real invariants; everything above it is adaptation and
//! everything below it is plumbing.
//!
//! ## Partition Structure
//!
//! The pool is an explicit two-region structure:
//!
//! ```text
//! free:  VecDeque<slot>     ── next allocation is always pop_front, O(1)
//! bound: HashMap<path,slot> ── exactly one slot per bound logical path
//! ```
//!
//! A slot is in exactly one region at any time. The on-disk header of a
//! free slot holds the canonical empty encoding; the header of a bound
//! slot holds its path and a matching digest. Keeping the regions as two
//! separate collections makes the free-before-bound invariant structural
//! rather than an artifact of insertion order.
//!
//! ## Allocation Policy
//!
//! - `acquire` pops the head of the free queue: deterministic, O(1), and
//!   starvation-free.
//! - `release` pushes the freed slot to the *front*, so the most recently
//!   freed slot is reused first.
//! - `add_capacity` pushes new slots to the *back*, so new capacity is
//!   consumed only after older free slots.
//! - `remove_capacity` pops from the back, the mirror image of
//!   `add_capacity`.
//!
//! ## Startup Reconciliation
//!
//! `SlotPool::open` enumerates the store, reads every slot header, and
//! partitions: verified non-empty headers register a binding; everything
//! else lands in the free queue, with corrupt headers repaired to the
//! canonical empty encoding so corruption self-heals to "free" instead of
//! persisting as an error. The pool value only exists after
//! reconciliation has run to completion, which is what makes the
//! two-phase lifecycle a construction invariant instead of caller
//! discipline.
//!
//! ## Durability
//!
//! Every header rewrite flushes before returning. A crash between an
//! unflushed rebind and the next startup must never leave a slot whose
//! header disagrees with its partition; flushing at the rebind point
//! closes that window, and the digest catches the torn remainder.
//!
//! ## Thread Safety
//!
//! The pool assumes one logical operation in flight at a time (the
//! consuming engine serializes calls). Slots are handed out as
//! `Arc<Mutex<SlotEntry>>` so ephemeral file handles can alias a slot
//! safely, but the pool itself takes `&mut self` for every mutation and
//! provides no internal cross-operation locking.

mod header;

pub use header::SlotHeader;

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use eyre::{Result, WrapErr};
use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::config::{SLOT_FILE_SUFFIX, SLOT_HEADER_SIZE};
use crate::error::PoolError;
use crate::store::{SlotIo, SlotStore};

/// A pooled slot: its opaque physical name plus the open substrate handle.
///
/// Slots stay open for the lifetime of the pool; only capacity contraction
/// or dropping the pool closes them.
#[derive(Debug)]
pub struct SlotEntry<H: SlotIo> {
    name: String,
    io: H,
}

/// Shared reference to a pooled slot, as handed to file handles.
pub type SharedSlot<H> = Arc<Mutex<SlotEntry<H>>>;

impl<H: SlotIo> SlotEntry<H> {
    /// The opaque physical name of this slot.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads payload bytes at a logical offset, returning how many bytes
    /// were available. Logical offset 0 is the first byte after the
    /// header.
    pub fn payload_read(&mut self, buf: &mut [u8], offset: u64) -> Result<usize> {
        self.io.read_at(buf, SLOT_HEADER_SIZE as u64 + offset)
    }

    /// Writes payload bytes at a logical offset, extending the slot as
    /// needed. Returns the number of bytes written.
    pub fn payload_write(&mut self, buf: &[u8], offset: u64) -> Result<usize> {
        self.io.write_at(buf, SLOT_HEADER_SIZE as u64 + offset)
    }

    /// Resizes the payload to exactly `len` bytes.
    pub fn payload_truncate(&mut self, len: u64) -> Result<()> {
        self.io.truncate(SLOT_HEADER_SIZE as u64 + len)
    }

    /// Current payload size in bytes.
    pub fn payload_len(&mut self) -> Result<u64> {
        Ok(self.io.len()?.saturating_sub(SLOT_HEADER_SIZE as u64))
    }

    /// Flushes pending writes to durable storage.
    pub fn flush(&mut self) -> Result<()> {
        self.io.flush()
    }
}

/// Rewrites a slot to the bound state and makes the header durable.
fn write_bound<H: SlotIo>(entry: &mut SlotEntry<H>, header: &SlotHeader) -> Result<()> {
    header.write_to(&mut entry.io)?;
    entry.io.flush()
}

/// Rewrites a slot to the canonical free state: empty header, no payload,
/// flushed.
fn write_free<H: SlotIo>(entry: &mut SlotEntry<H>) -> Result<()> {
    SlotHeader::free().write_to(&mut entry.io)?;
    entry.io.truncate(SLOT_HEADER_SIZE as u64)?;
    entry.io.flush()
}

fn parse_slot_name(name: &str) -> Option<u64> {
    name.strip_suffix(SLOT_FILE_SUFFIX)?
        .strip_suffix('.')?
        .parse()
        .ok()
}

/// Fixed-capacity pool of storage slots backing a logical file namespace.
pub struct SlotPool<S: SlotStore> {
    store: S,
    free: VecDeque<SharedSlot<S::Slot>>,
    bound: HashMap<String, SharedSlot<S::Slot>>,
    next_name: u64,
}

impl<S: SlotStore> SlotPool<S> {
    /// Opens a pool over `store`, reconciling in-memory state from the
    /// persistent slot headers.
    ///
    /// Every enumerated slot is opened, its header read and verified, and
    /// the slot placed in the bound or free partition. Corrupt headers
    /// (digest mismatch, undecodable path, duplicate binding) are
    /// repaired to the canonical free encoding. Per-file operations are
    /// only reachable through the returned value, so nothing can observe
    /// a half-reconciled pool.
    pub fn open(store: S) -> std::result::Result<Self, PoolError> {
        let names = store.list().wrap_err("failed to enumerate slot store")?;

        let mut pool = Self {
            store,
            free: VecDeque::with_capacity(names.len()),
            bound: HashMap::new(),
            next_name: 0,
        };

        for name in names {
            if let Some(seq) = parse_slot_name(&name) {
                pool.next_name = pool.next_name.max(seq + 1);
            }

            let mut io = pool
                .store
                .open(&name)
                .wrap_err_with(|| format!("failed to open slot '{name}'"))?;
            let header = SlotHeader::read_from(&mut io)?;
            let mut entry = SlotEntry { name, io };

            if !header.verify() {
                warn!(
                    "slot {}: header digest mismatch, repairing to free",
                    entry.name
                );
                write_free(&mut entry)?;
                pool.free.push_back(Arc::new(Mutex::new(entry)));
            } else if let Some(path) = header.logical_path() {
                if pool.bound.contains_key(path) {
                    warn!(
                        "slot {}: duplicate binding for '{}', repairing to free",
                        entry.name, path
                    );
                    write_free(&mut entry)?;
                    pool.free.push_back(Arc::new(Mutex::new(entry)));
                } else {
                    debug!("slot {}: bound to '{}'", entry.name, path);
                    let path = path.to_string();
                    pool.bound.insert(path, Arc::new(Mutex::new(entry)));
                }
            } else if header.is_free() {
                debug!("slot {}: free", entry.name);
                pool.free.push_back(Arc::new(Mutex::new(entry)));
            } else {
                warn!(
                    "slot {}: undecodable path field, repairing to free",
                    entry.name
                );
                write_free(&mut entry)?;
                pool.free.push_back(Arc::new(Mutex::new(entry)));
            }
        }

        info!(
            "slot pool ready: {} slots ({} bound, {} free)",
            pool.capacity(),
            pool.bound.len(),
            pool.free.len()
        );

        Ok(pool)
    }

    /// Resolves `path` to its bound slot.
    ///
    /// An existing binding is returned as-is. Otherwise, with `create`
    /// set, the head of the free queue is rebound to `path`; without it
    /// the call fails with [`PoolError::NotFound`]. An empty free queue
    /// fails with [`PoolError::PoolExhausted`] — the pool never grows
    /// itself implicitly.
    pub fn acquire(
        &mut self,
        path: &str,
        create: bool,
    ) -> std::result::Result<SharedSlot<S::Slot>, PoolError> {
        if let Some(slot) = self.bound.get(path) {
            return Ok(Arc::clone(slot));
        }

        if !create {
            return Err(PoolError::NotFound {
                path: path.to_string(),
            });
        }

        // Encode before touching any slot: an unencodable path must not
        // disturb pool state.
        let header = SlotHeader::bind(path)?;

        let Some(slot) = self.free.pop_front() else {
            return Err(PoolError::PoolExhausted {
                capacity: self.capacity(),
            });
        };

        {
            let mut entry = slot.lock();
            if let Err(e) = write_bound(&mut entry, &header) {
                drop(entry);
                self.free.push_front(slot);
                return Err(e.into());
            }
            debug!("slot {}: bound to '{}'", entry.name, path);
        }

        self.bound.insert(path.to_string(), Arc::clone(&slot));
        Ok(slot)
    }

    /// Destroys the binding for `path`, if any.
    ///
    /// The slot's header is rewritten to the canonical empty encoding,
    /// its payload truncated away, and the slot moved to the head of the
    /// free queue. A path with no binding is a no-op, not an error. If
    /// the header rewrite fails, the binding is left intact.
    pub fn release(&mut self, path: &str) -> std::result::Result<(), PoolError> {
        let Some(slot) = self.bound.get(path).cloned() else {
            return Ok(());
        };

        {
            let mut entry = slot.lock();
            write_free(&mut entry)?;
            debug!("slot {}: released '{}'", entry.name, path);
        }

        self.bound.remove(path);
        self.free.push_front(slot);
        Ok(())
    }

    /// True iff a binding currently exists for `path`. Pure lookup.
    pub fn contains(&self, path: &str) -> bool {
        self.bound.contains_key(path)
    }

    /// Creates `n` new slots, each initialized to the free state, and
    /// appends them to the free queue. Returns the number added.
    ///
    /// Creation is per-slot atomic: a failure partway through propagates,
    /// but every slot created before it remains registered and counted. A
    /// slot file orphaned between creation and registration is re-adopted
    /// as free by the next reconciliation.
    pub fn add_capacity(&mut self, n: usize) -> std::result::Result<usize, PoolError> {
        for added in 0..n {
            let name = self.mint_name();

            let io = self.store.create(&name).wrap_err_with(|| {
                format!("failed to create slot '{name}' after adding {added} of {n}")
            })?;

            let mut entry = SlotEntry { name, io };
            write_free(&mut entry)?;

            debug!("slot {}: created free", entry.name);
            self.free.push_back(Arc::new(Mutex::new(entry)));
        }

        info!(
            "capacity extended by {}: {} slots ({} bound, {} free)",
            n,
            self.capacity(),
            self.bound.len(),
            self.free.len()
        );

        Ok(n)
    }

    /// Closes and physically deletes up to `n` free slots, stopping early
    /// when the free queue drains. Returns the number actually removed.
    ///
    /// Bound slots are never touched: capacity cannot drop below the
    /// current number of bindings.
    pub fn remove_capacity(&mut self, n: usize) -> std::result::Result<usize, PoolError> {
        let mut removed = 0;

        while removed < n {
            let Some(slot) = self.free.pop_back() else {
                break;
            };

            let name = slot.lock().name.clone();
            // Last pool reference: dropping closes the substrate handle
            // before the physical remove.
            drop(slot);

            self.store
                .remove(&name)
                .wrap_err_with(|| format!("failed to remove slot '{name}'"))?;

            debug!("slot {name}: removed");
            removed += 1;
        }

        info!(
            "capacity reduced by {}: {} slots ({} bound, {} free)",
            removed,
            self.capacity(),
            self.bound.len(),
            self.free.len()
        );

        Ok(removed)
    }

    /// Flushes every open slot to durable storage.
    pub fn sync_all(&mut self) -> std::result::Result<(), PoolError> {
        for slot in self.bound.values().chain(self.free.iter()) {
            slot.lock().io.flush()?;
        }
        Ok(())
    }

    /// Total number of slots, free and bound.
    pub fn capacity(&self) -> usize {
        self.free.len() + self.bound.len()
    }

    /// Number of slots currently free.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Number of slots currently bound.
    pub fn bound_count(&self) -> usize {
        self.bound.len()
    }

    /// Sorted snapshot of the bound logical paths.
    pub fn bound_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.bound.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn mint_name(&mut self) -> String {
        let name = format!("{:06}.{}", self.next_name, SLOT_FILE_SUFFIX);
        self.next_name += 1;
        name
    }
}
