//! # Poolfs Configuration Module
//!
//! This module centralizes the on-disk layout constants for poolfs. The
//! slot header geometry is a persistence format: every constant here is
//! load-bearing for files already written to disk, and interdependencies
//! are documented and enforced through compile-time assertions.
//!
//! ## Why Centralization?
//!
//! The header constants are consumed from three places (header encoding,
//! payload offset translation, reconciliation). Scattering them invites a
//! mismatch between the size a header claims and the offset the I/O layer
//! skips, which silently corrupts payload data. Co-locating them with
//! compile-time checks prevents that class of bug.
//!
//! ## Module Organization
//!
//! - [`constants`]: All layout values with dependency documentation

pub mod constants;
pub use constants::*;
