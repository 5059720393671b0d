//! Collision-safe destination naming.
//!
//! Given a desired file name and an existence predicate, pick the first free
//! name in the sequence `name.ext`, `name_1.ext`, `name_2.ext`, ... The
//! predicate is injected so the protocol can be exercised without touching
//! the filesystem.
//!
//! Names are handled as [`OsStr`] throughout, so a name that is not valid
//! UTF-8 keeps its exact bytes.
//!
//! # Example
//!
//! ```
//! use std::ffi::OsStr;
//! use tmplmerge::merge::naming::resolve_collision;
//!
//! let taken = [OsStr::new("x.yaml"), OsStr::new("x_1.yaml")];
//! let name = resolve_collision(OsStr::new("x.yaml"), |candidate| taken.contains(&candidate));
//! assert_eq!(name, "x_2.yaml");
//! ```

use std::ffi::{OsStr, OsString};
use std::path::Path;

/// Split a file name into stem and extension (without the dot).
///
/// Only the last dot counts, and a leading or trailing dot does not start an
/// extension: `a.tar.yaml` → (`a.tar`, `yaml`), `.hidden` → (`.hidden`, none).
#[must_use]
pub fn split_name(name: &OsStr) -> (&OsStr, Option<&OsStr>) {
    let path = Path::new(name);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) if !ext.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}

/// Name for the `n`-th collision of `name`.
#[must_use]
pub fn numbered_name(name: &OsStr, n: usize) -> OsString {
    let (stem, extension) = split_name(name);
    let mut numbered = stem.to_os_string();
    numbered.push(format!("_{n}"));
    if let Some(ext) = extension {
        numbered.push(".");
        numbered.push(ext);
    }
    numbered
}

/// Choose the first name not reported as taken by `exists`.
///
/// The desired name is tried first, then `stem_1.ext`, `stem_2.ext`, ...
#[must_use]
pub fn resolve_collision<F>(desired: &OsStr, mut exists: F) -> OsString
where
    F: FnMut(&OsStr) -> bool,
{
    if !exists(desired) {
        return desired.to_os_string();
    }

    let mut counter = 1usize;
    loop {
        let candidate = numbered_name(desired, counter);
        if !exists(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Choose a free name inside `dir`, checking the real filesystem.
///
/// Any existing entry counts as taken, including dangling symlinks and
/// directories.
#[must_use]
pub fn resolve_in_dir(dir: &Path, desired: &OsStr) -> OsString {
    resolve_collision(desired, |candidate| {
        std::fs::symlink_metadata(dir.join(candidate)).is_ok()
    })
}
