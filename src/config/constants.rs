//! # Poolfs Layout Constants
//!
//! This module centralizes the persistent layout constants, grouping
//! interdependent values together and documenting their relationships.
//! Constants that depend on each other are co-located to prevent mismatch
//! bugs.
//!
//! ## Dependency Graph
//!
//! The following diagram shows how constants relate to each other. When
//! changing any constant, check if dependent constants need adjustment.
//!
//! ```text
//! PATH_FIELD_SIZE (512 bytes)
//!       │
//!       ├─> SLOT_HEADER_SIZE (derived: PATH_FIELD_SIZE + DIGEST_SIZE)
//!       │     Every payload offset is shifted by this amount. The header
//!       │     encoder, the reconciliation reader, and the per-file I/O
//!       │     layer must all agree on it.
//!       │
//!       └─> Maximum encodable logical path length (512 bytes of UTF-8)
//!
//! DIGEST_SIZE (8 bytes)
//!       │
//!       └─> Width of the CRC-64 field following the path field. The
//!           digest covers the full padded PATH_FIELD_SIZE bytes, so the
//!           two constants are coupled through the verification path.
//! ```
//!
//! ## Critical Invariants
//!
//! Enforced by compile-time assertions:
//!
//! 1. `SLOT_HEADER_SIZE == PATH_FIELD_SIZE + DIGEST_SIZE` (derived correctly)
//! 2. `DIGEST_SIZE == size_of::<u64>()` (digest field holds a CRC-64 value)
//!
//! ## Modifying Constants
//!
//! Both field widths are a breaking on-disk format change. Every existing
//! slot encodes its header with these widths; changing either requires a
//! migration pass over all slots in a pool directory before the new build
//! may open it.

// ============================================================================
// SLOT HEADER LAYOUT
// These define the persistent per-slot header format
// ============================================================================

/// Width of the fixed, null-padded UTF-8 logical path field at offset 0
/// of every slot. Also the maximum encodable logical path length in bytes.
pub const PATH_FIELD_SIZE: usize = 512;

/// Width of the integrity digest field that follows the path field.
/// Holds a CRC-64 computed over the full padded path field.
pub const DIGEST_SIZE: usize = 8;

/// Total slot header size. All payload bytes begin at this offset.
pub const SLOT_HEADER_SIZE: usize = PATH_FIELD_SIZE + DIGEST_SIZE;

const _: () = assert!(
    SLOT_HEADER_SIZE == PATH_FIELD_SIZE + DIGEST_SIZE,
    "SLOT_HEADER_SIZE derivation mismatch"
);

const _: () = assert!(
    DIGEST_SIZE == std::mem::size_of::<u64>(),
    "digest field must hold a 64-bit CRC"
);

// ============================================================================
// PHYSICAL NAMING
// ============================================================================

/// Suffix for physical slot names in the backing directory. Physical names
/// are opaque to the engine; the logical namespace lives in slot headers.
pub const SLOT_FILE_SUFFIX: &str = "slot";
