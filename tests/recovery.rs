//! # Recovery Tests
//!
//! Restart and corruption behavior of the slot pool:
//! 1. Reconciliation rebuilds exactly the bindings that were durably
//!    committed before the pool was discarded
//! 2. A flipped bit anywhere in a header classifies the slot as free and
//!    rewrites the canonical empty encoding, never a partial path
//! 3. Rebind is durable on its own: no whole-pool sync is needed for a
//!    binding to survive a restart
//! 4. Foreign or truncated slot files are adopted as free capacity
//!    instead of failing startup
//!
//! ## Background
//!
//! The pool's only persistent state is the per-slot header. These tests
//! manipulate the backing files directly (bit flips, truncation, foreign
//! content) and assert on what the next reconciliation builds from them.

use std::fs;
use std::io::{Read, Seek, SeekFrom, Write};

use poolfs::config::{PATH_FIELD_SIZE, SLOT_HEADER_SIZE};
use poolfs::{FsStore, OpenFlags, PoolVfs, SlotHeader, SlotStore};
use tempfile::tempdir;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn flip_byte(path: &std::path::Path, offset: u64) {
    let mut file = fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .unwrap();

    let mut byte = [0u8; 1];
    file.seek(SeekFrom::Start(offset)).unwrap();
    file.read_exact(&mut byte).unwrap();

    byte[0] ^= 0x01;
    file.seek(SeekFrom::Start(offset)).unwrap();
    file.write_all(&byte).unwrap();
    file.sync_all().unwrap();
}

mod restart_tests {
    use super::*;

    #[test]
    fn reconciliation_restores_committed_bindings() {
        init_logging();
        let dir = tempdir().unwrap();

        {
            let mut vfs = PoolVfs::open_dir(dir.path()).unwrap();
            vfs.add_capacity(3).unwrap();

            for path in ["/main.db", "/main.db-journal"] {
                let handle = vfs.open(path, OpenFlags::CREATE).unwrap();
                handle.write(path.as_bytes(), 0).unwrap();
                handle.sync().unwrap();
                vfs.close(handle).unwrap();
            }
        }

        let mut vfs = PoolVfs::open_dir(dir.path()).unwrap();

        assert_eq!(vfs.pool().capacity(), 3);
        assert_eq!(
            vfs.pool().bound_paths(),
            vec!["/main.db", "/main.db-journal"]
        );
        assert_eq!(vfs.pool().free_count(), 1);

        // Payload comes back with the binding.
        let handle = vfs.open("/main.db", OpenFlags::empty()).unwrap();
        let mut buf = [0u8; 8];
        handle.read(&mut buf, 0).unwrap();
        assert_eq!(&buf, b"/main.db");
    }

    #[test]
    fn rebind_is_durable_without_an_explicit_sync() {
        init_logging();
        let dir = tempdir().unwrap();

        {
            let mut vfs = PoolVfs::open_dir(dir.path()).unwrap();
            vfs.add_capacity(1).unwrap();
            // No handle.sync(), no sync_all: the rebind itself must have
            // flushed the header.
            let handle = vfs.open("/a.db", OpenFlags::CREATE).unwrap();
            vfs.close(handle).unwrap();
        }

        let vfs = PoolVfs::open_dir(dir.path()).unwrap();
        assert!(vfs.exists("/a.db"));
    }

    #[test]
    fn deleted_paths_stay_deleted_across_restarts() {
        init_logging();
        let dir = tempdir().unwrap();

        {
            let mut vfs = PoolVfs::open_dir(dir.path()).unwrap();
            vfs.add_capacity(2).unwrap();
            let handle = vfs.open("/gone.db", OpenFlags::CREATE).unwrap();
            vfs.close(handle).unwrap();
            vfs.delete("/gone.db").unwrap();
        }

        let vfs = PoolVfs::open_dir(dir.path()).unwrap();

        assert!(!vfs.exists("/gone.db"));
        assert_eq!(vfs.pool().free_count(), 2);
    }
}

mod corruption_tests {
    use super::*;

    #[test]
    fn digest_bit_flip_heals_to_a_free_slot() {
        init_logging();
        let dir = tempdir().unwrap();

        {
            let mut vfs = PoolVfs::open_dir(dir.path()).unwrap();
            vfs.add_capacity(1).unwrap();
            let handle = vfs.open("/victim.db", OpenFlags::CREATE).unwrap();
            handle.write(b"payload", 0).unwrap();
            handle.sync().unwrap();
            vfs.close(handle).unwrap();
        }

        flip_byte(&dir.path().join("000000.slot"), PATH_FIELD_SIZE as u64);

        let vfs = PoolVfs::open_dir(dir.path()).unwrap();

        assert!(!vfs.exists("/victim.db"));
        assert_eq!(vfs.pool().free_count(), 1);

        // The header was rewritten to the canonical empty encoding and
        // the stale payload truncated away.
        let store = FsStore::new(dir.path()).unwrap();
        let mut slot = store.open("000000.slot").unwrap();
        let header = SlotHeader::read_from(&mut slot).unwrap();
        assert!(header.verify());
        assert!(header.is_free());
        assert_eq!(
            fs::metadata(dir.path().join("000000.slot")).unwrap().len(),
            SLOT_HEADER_SIZE as u64
        );
    }

    #[test]
    fn path_field_bit_flip_heals_to_a_free_slot() {
        init_logging();
        let dir = tempdir().unwrap();

        {
            let mut vfs = PoolVfs::open_dir(dir.path()).unwrap();
            vfs.add_capacity(1).unwrap();
            let handle = vfs.open("/victim.db", OpenFlags::CREATE).unwrap();
            vfs.close(handle).unwrap();
        }

        flip_byte(&dir.path().join("000000.slot"), 3);

        let vfs = PoolVfs::open_dir(dir.path()).unwrap();

        // Neither the original nor the mangled path may survive.
        assert!(!vfs.exists("/victim.db"));
        assert_eq!(vfs.pool().bound_count(), 0);
        assert_eq!(vfs.pool().free_count(), 1);
    }

    #[test]
    fn foreign_file_is_adopted_as_free_capacity() {
        init_logging();
        let dir = tempdir().unwrap();

        fs::write(dir.path().join("stray.bin"), b"not a slot header").unwrap();

        let vfs = PoolVfs::open_dir(dir.path()).unwrap();

        assert_eq!(vfs.pool().capacity(), 1);
        assert_eq!(vfs.pool().free_count(), 1);

        // Repaired in place to a valid empty header.
        let store = FsStore::new(dir.path()).unwrap();
        let mut slot = store.open("stray.bin").unwrap();
        let header = SlotHeader::read_from(&mut slot).unwrap();
        assert!(header.verify());
        assert!(header.is_free());
    }

    #[test]
    fn truncated_header_is_repaired_to_full_length() {
        init_logging();
        let dir = tempdir().unwrap();

        {
            let mut vfs = PoolVfs::open_dir(dir.path()).unwrap();
            vfs.add_capacity(1).unwrap();
            let handle = vfs.open("/short.db", OpenFlags::CREATE).unwrap();
            vfs.close(handle).unwrap();
        }

        // Chop the file mid-path-field: the binding must not survive.
        let slot_path = dir.path().join("000000.slot");
        let file = fs::OpenOptions::new().write(true).open(&slot_path).unwrap();
        file.set_len(100).unwrap();
        file.sync_all().unwrap();
        drop(file);

        let vfs = PoolVfs::open_dir(dir.path()).unwrap();

        assert!(!vfs.exists("/short.db"));
        assert_eq!(vfs.pool().free_count(), 1);
        assert_eq!(
            fs::metadata(&slot_path).unwrap().len(),
            SLOT_HEADER_SIZE as u64
        );
    }
}
