//! Path helpers for extension matching and configured-path expansion.
//!
//! Extensions are compared case-insensitively on the final component only,
//! so `rule.tar.YAML` has extension `yaml` and `Makefile` has none.
//!
//! # Example
//!
//! ```
//! use tmplmerge::scanner::path_utils::{extension_of, normalize_extension};
//! use std::path::Path;
//!
//! assert_eq!(extension_of(Path::new("a/b/rule.YML")), Some("yml".to_string()));
//! assert_eq!(normalize_extension(".Yaml"), "yaml");
//! ```

use std::path::{Component, Path, PathBuf};

use directories::BaseDirs;

/// Normalize an extension to lower case without a leading dot.
#[must_use]
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// Normalize a list of extensions, dropping empties and duplicates.
///
/// Order of first occurrence is preserved.
#[must_use]
pub fn normalize_extensions<I, S>(extensions: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for ext in extensions {
        let ext = normalize_extension(ext.as_ref());
        if !ext.is_empty() && !out.contains(&ext) {
            out.push(ext);
        }
    }
    out
}

/// Lower-cased extension of a path's final component.
///
/// Dot-files such as `.yaml` have no extension, matching how the standard
/// library splits file names.
#[must_use]
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .filter(|e| !e.is_empty())
}

/// Expand a leading `~` against the user's home directory.
///
/// Paths without a leading `~` are returned unchanged. If the home directory
/// cannot be determined the path is also returned unchanged.
#[must_use]
pub fn expand_tilde(path: &Path) -> PathBuf {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => match BaseDirs::new() {
            Some(dirs) => dirs.home_dir().join(components.as_path()),
            None => {
                log::warn!(
                    "Could not determine home directory, leaving {} unexpanded",
                    path.display()
                );
                path.to_path_buf()
            }
        },
        _ => path.to_path_buf(),
    }
}

/// Expand `~` and make the path absolute against the current directory.
///
/// Symlinks are not resolved and the path does not need to exist.
#[must_use]
pub fn resolve_path(path: &Path) -> PathBuf {
    let expanded = expand_tilde(path);
    match std::path::absolute(&expanded) {
        Ok(abs) => abs,
        Err(e) => {
            log::debug!("Could not absolutize {}: {}", expanded.display(), e);
            expanded
        }
    }
}
