//! Deduplicating merge module.
//!
//! This module provides functionality for:
//! - Collision-safe naming in the flat corpus directory
//! - The per-run fingerprint index
//! - File relocation with a cross-device fallback
//! - The merge pass itself

pub mod index;
pub mod merger;
pub mod naming;
pub mod relocate;

pub use index::SeenFingerprintIndex;
pub use merger::{
    FileFault, MergeAction, MergeConfig, MergeError, MergeStats, Merger, DEFAULT_BATCH_SIZE,
};
pub use naming::{resolve_collision, resolve_in_dir};
pub use relocate::{relocate, RelocateError, RelocateMethod};
