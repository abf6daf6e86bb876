//! # Slot Header
//!
//! Every slot begins with a fixed 520-byte header that records which
//! logical path the slot is bound to, if any:
//!
//! ```text
//! Offset  Size  Description
//! 0       512   Logical path, UTF-8, null-padded (empty = free slot)
//! 512     8     CRC-64 over the padded path field (little-endian)
//! 520     ...   Payload
//! ```
//!
//! The digest is a corruption detector, not a security boundary: it exists
//! so a torn or truncated header write is recognized on the next startup
//! instead of resurrecting a partial path. CRC-64/ECMA-182 is used for its
//! speed, determinism, and avalanche behavior.
//!
//! A fully zeroed header is the canonical free encoding and verifies as
//! such (the CRC of an all-zero field under this polynomial is zero), so a
//! freshly truncated slot is already in a valid free state.
//!
//! ## Zerocopy Safety
//!
//! The struct derives `FromBytes`/`IntoBytes`/`Immutable`/`KnownLayout`/
//! `Unaligned`, so it can be read from and written as raw bytes with
//! compile-time size verification and no hand-rolled (de)serialization.

use std::fmt;

use crc::{Crc, CRC_64_ECMA_182};
use eyre::{Result, WrapErr};
use zerocopy::little_endian::U64;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::config::{PATH_FIELD_SIZE, SLOT_HEADER_SIZE};
use crate::error::PoolError;
use crate::store::SlotIo;

const CRC64: Crc<u64> = Crc::<u64>::new(&CRC_64_ECMA_182);

#[repr(C)]
#[derive(Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct SlotHeader {
    path: [u8; PATH_FIELD_SIZE],
    digest: U64,
}

const _: () = assert!(std::mem::size_of::<SlotHeader>() == SLOT_HEADER_SIZE);

impl SlotHeader {
    /// The canonical free (unbound) encoding: empty path, matching digest.
    pub fn free() -> Self {
        Self::seal([0u8; PATH_FIELD_SIZE])
    }

    /// Encodes a binding to `path`.
    ///
    /// Fails before producing a header if the path cannot round-trip
    /// through the fixed field, so callers can guarantee no slot write
    /// begins for an unencodable path.
    pub fn bind(path: &str) -> std::result::Result<Self, PoolError> {
        if path.is_empty() || path.as_bytes().contains(&0) {
            return Err(PoolError::InvalidPath {
                path: path.to_string(),
            });
        }

        let bytes = path.as_bytes();
        if bytes.len() > PATH_FIELD_SIZE {
            return Err(PoolError::PathTooLong {
                path: path.to_string(),
                len: bytes.len(),
                limit: PATH_FIELD_SIZE,
            });
        }

        let mut field = [0u8; PATH_FIELD_SIZE];
        field[..bytes.len()].copy_from_slice(bytes);

        Ok(Self::seal(field))
    }

    fn seal(field: [u8; PATH_FIELD_SIZE]) -> Self {
        let digest = CRC64.checksum(&field);
        Self {
            path: field,
            digest: U64::new(digest),
        }
    }

    /// True iff the stored digest matches the digest recomputed from the
    /// path field. A mismatch means the header is corrupt and the slot
    /// must be treated as unbound.
    pub fn verify(&self) -> bool {
        CRC64.checksum(&self.path) == self.digest.get()
    }

    /// True iff the path field holds the empty (free) encoding.
    pub fn is_free(&self) -> bool {
        self.path[0] == 0
    }

    /// The bound logical path, or `None` when the slot is free or the
    /// field does not decode as UTF-8. Does not check the digest; callers
    /// verify first.
    pub fn logical_path(&self) -> Option<&str> {
        if self.is_free() {
            return None;
        }

        let end = self
            .path
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(PATH_FIELD_SIZE);

        std::str::from_utf8(&self.path[..end]).ok()
    }

    pub fn digest(&self) -> u64 {
        self.digest.get()
    }

    /// Reads the header region of a slot. A slot shorter than the header
    /// yields a zero-padded read; the truncation is caught by `verify`
    /// unless the missing tail was all zeros anyway, in which case the
    /// header is the canonical free encoding and the classification is
    /// still correct.
    pub fn read_from(io: &mut impl SlotIo) -> Result<Self> {
        let mut buf = [0u8; SLOT_HEADER_SIZE];
        io.read_at(&mut buf, 0).wrap_err("failed to read slot header")?;

        SlotHeader::read_from_bytes(&buf[..])
            .map_err(|e| eyre::eyre!("failed to decode slot header: {:?}", e))
    }

    /// Writes the header region of a slot: path field first, digest
    /// second, so a tear between the two leaves a detectable mismatch.
    /// Does not flush; the caller owns the durability point.
    pub fn write_to(&self, io: &mut impl SlotIo) -> Result<()> {
        io.write_at(&self.path, 0)
            .wrap_err("failed to write slot header path field")?;
        io.write_at(self.digest.as_bytes(), PATH_FIELD_SIZE as u64)
            .wrap_err("failed to write slot header digest field")?;
        Ok(())
    }
}

impl fmt::Debug for SlotHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotHeader")
            .field("path", &self.logical_path())
            .field("digest", &format_args!("{:#018x}", self.digest.get()))
            .field("valid", &self.verify())
            .finish()
    }
}
