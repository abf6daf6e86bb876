//! # Substrate Driver Traits
//!
//! `SlotStore` and `SlotIo` abstract the backing storage so the pool can
//! run over a real directory of files, an in-memory map in tests, or any
//! other flat namespace of randomly addressable storage units.
//!
//! ## Design Notes
//!
//! The store hands out owned slot handles rather than borrowed views:
//! slots stay open for the lifetime of the pool, and the pool decides how
//! to share them (it wraps each in `Arc<Mutex<..>>`). `read_at` and
//! `write_at` take `&mut self` because positional I/O on a plain file
//! handle moves a cursor; backends without a cursor simply ignore the
//! exclusivity.
//!
//! Errors are `eyre` results with context supplied by the implementation;
//! the pool wraps them into its typed surface at the API boundary.

use eyre::Result;

/// Per-slot synchronous I/O primitives.
///
/// Offsets are absolute within the slot (header included). Payload offset
/// translation happens a layer up, in the pool.
pub trait SlotIo: Send {
    /// Reads up to `buf.len()` bytes starting at `offset`, returning how
    /// many bytes were actually available. A short count is not an error;
    /// bytes past the returned count are left untouched.
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> Result<usize>;

    /// Writes `buf` at `offset`, extending the slot if the range lies past
    /// the current end. Returns the number of bytes written.
    fn write_at(&mut self, buf: &[u8], offset: u64) -> Result<usize>;

    /// Resizes the slot to exactly `len` bytes.
    fn truncate(&mut self, len: u64) -> Result<()>;

    /// Forces all buffered writes to durable storage.
    fn flush(&mut self) -> Result<()>;

    /// Current slot size in bytes.
    fn len(&mut self) -> Result<u64>;
}

/// Directory-level primitives of the backing substrate.
///
/// Physical names are opaque strings chosen by the pool; the substrate
/// imposes no structure on them beyond uniqueness within the store.
pub trait SlotStore {
    /// The slot handle type produced by this store.
    type Slot: SlotIo;

    /// Enumerates the physical names of every slot currently in the
    /// store, in a deterministic order. Entries that are not storage
    /// units (e.g. subdirectories) are omitted.
    fn list(&self) -> Result<Vec<String>>;

    /// Creates a new empty slot under `name` and opens it. Fails if a
    /// slot with that name already exists.
    fn create(&self, name: &str) -> Result<Self::Slot>;

    /// Opens an existing slot for synchronous access.
    fn open(&self, name: &str) -> Result<Self::Slot>;

    /// Removes a slot from the store. The caller is responsible for
    /// dropping any open handle first.
    fn remove(&self, name: &str) -> Result<()>;
}
