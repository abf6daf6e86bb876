//! # In-Memory Store
//!
//! `MemStore` keeps every slot as a byte vector in a shared map. Nothing
//! persists past the process, which is exactly what tests want: cloning
//! the store clones a handle to the *same* underlying map, so a pool can
//! be dropped and rebuilt over identical "physical" state to simulate a
//! restart.

use std::collections::HashMap;
use std::sync::Arc;

use eyre::{bail, ensure, Result};
use parking_lot::Mutex;

use super::driver::{SlotIo, SlotStore};

type SharedBytes = Arc<Mutex<Vec<u8>>>;

/// A slot backed by a shared byte vector.
#[derive(Debug)]
pub struct MemSlot {
    name: String,
    data: SharedBytes,
}

impl SlotIo for MemSlot {
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> Result<usize> {
        let data = self.data.lock();
        let offset = offset as usize;

        if offset >= data.len() {
            return Ok(0);
        }

        let available = data.len() - offset;
        let n = buf.len().min(available);
        buf[..n].copy_from_slice(&data[offset..offset + n]);

        Ok(n)
    }

    fn write_at(&mut self, buf: &[u8], offset: u64) -> Result<usize> {
        let mut data = self.data.lock();
        let offset = offset as usize;
        let end = offset + buf.len();

        if data.len() < end {
            data.resize(end, 0);
        }
        data[offset..end].copy_from_slice(buf);

        Ok(buf.len())
    }

    fn truncate(&mut self, len: u64) -> Result<()> {
        self.data.lock().resize(len as usize, 0);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn len(&mut self) -> Result<u64> {
        Ok(self.data.lock().len() as u64)
    }
}

impl MemSlot {
    /// The physical name this handle was opened under.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A shared in-memory slot namespace.
///
/// Clones share the same backing map, mirroring how separate handles to
/// one directory see the same files.
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    slots: Arc<Mutex<HashMap<String, SharedBytes>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStore for MemStore {
    type Slot = MemSlot;

    fn list(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.slots.lock().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn create(&self, name: &str) -> Result<Self::Slot> {
        let mut slots = self.slots.lock();

        ensure!(!slots.contains_key(name), "slot '{}' already exists", name);

        let data: SharedBytes = Arc::new(Mutex::new(Vec::new()));
        slots.insert(name.to_string(), Arc::clone(&data));

        Ok(MemSlot {
            name: name.to_string(),
            data,
        })
    }

    fn open(&self, name: &str) -> Result<Self::Slot> {
        match self.slots.lock().get(name) {
            Some(data) => Ok(MemSlot {
                name: name.to_string(),
                data: Arc::clone(data),
            }),
            None => bail!("no slot named '{}'", name),
        }
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.slots.lock().remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_same_namespace() {
        let store = MemStore::new();
        let alias = store.clone();

        store.create("000001.slot").unwrap();

        assert_eq!(alias.list().unwrap(), vec!["000001.slot"]);
    }

    #[test]
    fn handles_share_one_backing_vector() {
        let store = MemStore::new();
        let mut a = store.create("000001.slot").unwrap();
        let mut b = store.open("000001.slot").unwrap();

        a.write_at(b"shared", 0).unwrap();

        let mut buf = [0u8; 6];
        assert_eq!(b.read_at(&mut buf, 0).unwrap(), 6);
        assert_eq!(&buf, b"shared");
    }

    #[test]
    fn open_unknown_slot_fails() {
        let store = MemStore::new();

        assert!(store.open("missing.slot").is_err());
    }

    #[test]
    fn truncate_extends_with_zeros() {
        let store = MemStore::new();
        let mut slot = store.create("000001.slot").unwrap();

        slot.write_at(b"ab", 0).unwrap();
        slot.truncate(4).unwrap();

        let mut buf = [0xFFu8; 4];
        slot.read_at(&mut buf, 0).unwrap();
        assert_eq!(&buf, &[b'a', b'b', 0, 0]);
    }

    #[test]
    fn remove_is_idempotent() {
        let store = MemStore::new();
        store.create("000001.slot").unwrap();

        store.remove("000001.slot").unwrap();
        store.remove("000001.slot").unwrap();

        assert!(store.list().unwrap().is_empty());
    }
}
