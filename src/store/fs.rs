//! # Filesystem Store
//!
//! `FsStore` backs the pool with a flat directory of ordinary files, one
//! per slot. Physical names are plain file names; there is no nesting.
//!
//! ## I/O Model
//!
//! Positional access is implemented as seek-then-read/write on a plain
//! `std::fs::File`, the portable shape for handle-based storage. Reads
//! loop until the buffer fills or the file ends, so a short count always
//! means end-of-slot rather than a transient partial read. `flush` maps to
//! `sync_all`, which is what gives rebind its durability guarantee.
//!
//! ## Durability
//!
//! Slot creation does not sync the parent directory; the pool's header
//! write-and-flush sequence is what makes a slot's *state* durable. A slot
//! created but lost to a crash before its free header is flushed simply
//! reappears as a corrupt (all-short) header and self-heals to free on the
//! next reconciliation.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use eyre::{ensure, Result, WrapErr};

use super::driver::{SlotIo, SlotStore};

/// A slot backed by a regular file.
#[derive(Debug)]
pub struct FsSlot {
    file: File,
    path: PathBuf,
}

impl SlotIo for FsSlot {
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> Result<usize> {
        self.file
            .seek(SeekFrom::Start(offset))
            .wrap_err_with(|| format!("failed to seek '{}' to {}", self.path.display(), offset))?;

        let mut filled = 0;
        while filled < buf.len() {
            let n = self
                .file
                .read(&mut buf[filled..])
                .wrap_err_with(|| format!("failed to read from '{}'", self.path.display()))?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        Ok(filled)
    }

    fn write_at(&mut self, buf: &[u8], offset: u64) -> Result<usize> {
        self.file
            .seek(SeekFrom::Start(offset))
            .wrap_err_with(|| format!("failed to seek '{}' to {}", self.path.display(), offset))?;

        self.file
            .write_all(buf)
            .wrap_err_with(|| format!("failed to write to '{}'", self.path.display()))?;

        Ok(buf.len())
    }

    fn truncate(&mut self, len: u64) -> Result<()> {
        self.file
            .set_len(len)
            .wrap_err_with(|| format!("failed to truncate '{}' to {}", self.path.display(), len))
    }

    fn flush(&mut self) -> Result<()> {
        self.file
            .sync_all()
            .wrap_err_with(|| format!("failed to sync '{}'", self.path.display()))
    }

    fn len(&mut self) -> Result<u64> {
        let metadata = self
            .file
            .metadata()
            .wrap_err_with(|| format!("failed to stat '{}'", self.path.display()))?;
        Ok(metadata.len())
    }
}

/// A flat directory of slot files.
#[derive(Debug)]
pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    /// Opens `dir` as a slot store, creating the directory if missing.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();

        fs::create_dir_all(&dir)
            .wrap_err_with(|| format!("failed to create pool directory '{}'", dir.display()))?;

        Ok(Self { dir })
    }

    /// The backing directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

impl SlotStore for FsStore {
    type Slot = FsSlot;

    fn list(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.dir)
            .wrap_err_with(|| format!("failed to read pool directory '{}'", self.dir.display()))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.wrap_err("failed to read directory entry")?;
            let file_type = entry.file_type().wrap_err("failed to stat directory entry")?;
            if !file_type.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }

        // read_dir order is platform-dependent; sort so reconciliation is
        // deterministic across runs.
        names.sort();

        Ok(names)
    }

    fn create(&self, name: &str) -> Result<Self::Slot> {
        let path = self.slot_path(name);

        ensure!(!path.exists(), "slot '{}' already exists", path.display());

        let file = OpenOptions::new()
            .create_new(true)
            .read(true)
            .write(true)
            .open(&path)
            .wrap_err_with(|| format!("failed to create slot '{}'", path.display()))?;

        Ok(FsSlot { file, path })
    }

    fn open(&self, name: &str) -> Result<Self::Slot> {
        let path = self.slot_path(name);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .wrap_err_with(|| format!("failed to open slot '{}'", path.display()))?;

        Ok(FsSlot { file, path })
    }

    fn remove(&self, name: &str) -> Result<()> {
        let path = self.slot_path(name);

        fs::remove_file(&path)
            .wrap_err_with(|| format!("failed to remove slot '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn new_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("pool");

        let store = FsStore::new(&nested).unwrap();

        assert!(nested.is_dir());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn create_then_list_returns_sorted_names() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path()).unwrap();

        store.create("000002.slot").unwrap();
        store.create("000001.slot").unwrap();

        assert_eq!(store.list().unwrap(), vec!["000001.slot", "000002.slot"]);
    }

    #[test]
    fn list_skips_subdirectories() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path()).unwrap();

        store.create("000001.slot").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        assert_eq!(store.list().unwrap(), vec!["000001.slot"]);
    }

    #[test]
    fn create_rejects_existing_slot() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path()).unwrap();

        store.create("000001.slot").unwrap();

        assert!(store.create("000001.slot").is_err());
    }

    #[test]
    fn remove_deletes_the_backing_file() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path()).unwrap();

        drop(store.create("000001.slot").unwrap());
        store.remove("000001.slot").unwrap();

        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn read_at_reports_available_bytes() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path()).unwrap();
        let mut slot = store.create("000001.slot").unwrap();

        slot.write_at(b"hello", 0).unwrap();

        let mut buf = [0u8; 8];
        let n = slot.read_at(&mut buf, 0).unwrap();

        assert_eq!(n, 5);
        assert_eq!(&buf[..5], b"hello");
    }

    #[test]
    fn read_at_past_end_returns_zero() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path()).unwrap();
        let mut slot = store.create("000001.slot").unwrap();

        slot.write_at(b"abc", 0).unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(slot.read_at(&mut buf, 100).unwrap(), 0);
    }

    #[test]
    fn write_at_past_end_extends_with_zeros() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path()).unwrap();
        let mut slot = store.create("000001.slot").unwrap();

        slot.write_at(b"xy", 4).unwrap();

        assert_eq!(slot.len().unwrap(), 6);

        let mut buf = [0xFFu8; 6];
        slot.read_at(&mut buf, 0).unwrap();
        assert_eq!(&buf, &[0, 0, 0, 0, b'x', b'y']);
    }

    #[test]
    fn truncate_shrinks_and_grows() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path()).unwrap();
        let mut slot = store.create("000001.slot").unwrap();

        slot.write_at(b"abcdef", 0).unwrap();
        slot.truncate(2).unwrap();
        assert_eq!(slot.len().unwrap(), 2);

        slot.truncate(10).unwrap();
        assert_eq!(slot.len().unwrap(), 10);
    }

    #[test]
    fn reopen_sees_flushed_data() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path()).unwrap();

        let mut slot = store.create("000001.slot").unwrap();
        slot.write_at(b"persist", 0).unwrap();
        slot.flush().unwrap();
        drop(slot);

        let mut reopened = store.open("000001.slot").unwrap();
        let mut buf = [0u8; 7];
        assert_eq!(reopened.read_at(&mut buf, 0).unwrap(), 7);
        assert_eq!(&buf, b"persist");
    }
}
