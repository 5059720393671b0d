//! In-memory index of fingerprints claimed during one merge run.
//!
//! The index is owned by a single merge invocation and never persisted. A
//! re-run starts from an empty index and re-hashes everything it finds.

use std::collections::{HashMap, HashSet};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::scanner::Fingerprint;

/// Mapping from fingerprint to the corpus file name that first claimed it.
///
/// Also remembers which source paths were relocated, so a path that shows up
/// again in the same run (for example through overlapping roots) is treated
/// as a duplicate of its own earlier claim.
#[derive(Debug, Default, Clone)]
pub struct SeenFingerprintIndex {
    claims: HashMap<Fingerprint, OsString>,
    sources: HashSet<PathBuf>,
}

impl SeenFingerprintIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Corpus name that claimed `fingerprint`, if any.
    #[must_use]
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&OsStr> {
        self.claims.get(fingerprint).map(OsString::as_os_str)
    }

    /// Whether `fingerprint` has been claimed.
    #[must_use]
    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.claims.contains_key(fingerprint)
    }

    /// Whether `source` was already relocated in this run.
    #[must_use]
    pub fn is_claimed_source(&self, source: &Path) -> bool {
        self.sources.contains(source)
    }

    /// Record a claim.
    ///
    /// Returns `false` and leaves the index unchanged if the fingerprint was
    /// already claimed.
    pub fn claim(&mut self, fingerprint: Fingerprint, corpus_name: OsString, source: PathBuf) -> bool {
        if self.claims.contains_key(&fingerprint) {
            return false;
        }
        self.claims.insert(fingerprint, corpus_name);
        self.sources.insert(source);
        true
    }

    /// Number of claimed fingerprints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Whether nothing has been claimed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Iterate over `(fingerprint, corpus name)` claims.
    pub fn iter(&self) -> impl Iterator<Item = (&Fingerprint, &OsStr)> {
        self.claims.iter().map(|(fp, name)| (fp, name.as_os_str()))
    }
}
