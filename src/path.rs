//! # Path Normalizer
//!
//! Pure functions that canonicalize and validate namespace paths.
//!
//! ## Responsibility
//! - Turn any accepted input into one canonical absolute form
//! - Reject malformed components and traversal above the root
//! - Structural helpers (`split`, `parent`, `file_name`, `join`) on top of that
//!
//! ## Canonical form
//!
//! ```text
//! "/"            root
//! "/a/b"         no trailing separator, no empty, "." or ".." segments
//! ```
//!
//! Relative inputs normalize as if rooted at `/`; use [`resolve`] to anchor
//! them at a working directory instead. A `..` that would climb above the
//! root is always an error, even transiently (`/a/../../a` is rejected).
//!
//! ## Usage
//!
//! ```rust
//! use pathspace::path;
//!
//! assert_eq!(path::normalize("/a/./b/../c").unwrap(), "/a/c");
//! assert_eq!(path::resolve("/home/user", "../docs").unwrap(), "/home/docs");
//! assert!(path::normalize("/..").is_err());
//! ```

use crate::NsError;

/// The path separator.
pub const SEPARATOR: char = '/';

/// Canonical form of the root path.
pub const ROOT: &str = "/";

/// Device names that Windows refuses as file names, in any case and with any extension.
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Component validation policy.
///
/// The separator and control characters are always rejected; everything
/// else here is configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NamePolicy {
    /// Longest accepted component, in bytes.
    pub max_name_len: usize,
    /// Reject platform-reserved device names such as `CON` or `lpt1.txt`.
    pub reject_reserved: bool,
}

impl NamePolicy {
    /// Policy that additionally rejects reserved device names.
    pub const fn portable() -> Self {
        Self {
            max_name_len: 255,
            reject_reserved: true,
        }
    }

    /// Validate a single path component.
    ///
    /// # Errors
    ///
    /// [`NsError::InvalidPath`] if the name is empty, `.`/`..`, contains the
    /// separator or a control character, is too long, or is reserved under
    /// this policy.
    pub fn validate_component(&self, name: &str) -> Result<(), NsError> {
        if name.is_empty() {
            return Err(NsError::invalid_path(name, "empty component"));
        }
        if name == "." || name == ".." {
            return Err(NsError::invalid_path(name, "relative component used as a name"));
        }
        if name.contains(SEPARATOR) {
            return Err(NsError::invalid_path(name, "separator in component"));
        }
        if name.chars().any(char::is_control) {
            return Err(NsError::invalid_path(name, "control character in component"));
        }
        if name.len() > self.max_name_len {
            return Err(NsError::invalid_path(name, "component too long"));
        }
        if self.reject_reserved && is_reserved(name) {
            return Err(NsError::invalid_path(name, "reserved name"));
        }
        Ok(())
    }

    /// Canonicalize `path` under this policy.
    ///
    /// # Errors
    ///
    /// [`NsError::InvalidPath`] for empty input, an invalid component, or a
    /// `..` with nothing left to pop.
    pub fn normalize(&self, path: &str) -> Result<String, NsError> {
        if path.is_empty() {
            return Err(NsError::invalid_path(path, "empty path"));
        }

        let mut stack: Vec<&str> = Vec::new();
        for segment in path.split(SEPARATOR) {
            match segment {
                "" | "." => {}
                ".." => {
                    if stack.pop().is_none() {
                        return Err(NsError::invalid_path(path, "traversal above root"));
                    }
                }
                name => {
                    // Report the whole input, not just the component.
                    self.validate_component(name).map_err(|e| match e {
                        NsError::InvalidPath { reason, .. } => NsError::invalid_path(path, reason),
                        other => other,
                    })?;
                    stack.push(name);
                }
            }
        }

        if stack.is_empty() {
            return Ok(ROOT.to_string());
        }
        let mut out = String::with_capacity(path.len() + 1);
        for name in stack {
            out.push(SEPARATOR);
            out.push_str(name);
        }
        Ok(out)
    }

    /// Resolve `relative` against `base` under this policy.
    ///
    /// Absolute inputs ignore `base`.
    pub fn resolve(&self, base: &str, relative: &str) -> Result<String, NsError> {
        if relative.is_empty() {
            return Err(NsError::invalid_path(relative, "empty path"));
        }
        if relative.starts_with(SEPARATOR) {
            self.normalize(relative)
        } else {
            self.normalize(&format!("{base}{SEPARATOR}{relative}"))
        }
    }
}

impl Default for NamePolicy {
    fn default() -> Self {
        Self {
            max_name_len: 255,
            reject_reserved: false,
        }
    }
}

fn is_reserved(name: &str) -> bool {
    let stem = name.split('.').next().unwrap_or(name);
    RESERVED_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(stem))
}

// ============================================================================
// Free functions (default policy)
// ============================================================================

/// Canonicalize a path with the default [`NamePolicy`].
pub fn normalize(path: &str) -> Result<String, NsError> {
    NamePolicy::default().normalize(path)
}

/// Resolve `relative` against `base` with the default [`NamePolicy`].
pub fn resolve(base: &str, relative: &str) -> Result<String, NsError> {
    NamePolicy::default().resolve(base, relative)
}

/// Components of the normalized path, root first. The root has none.
pub fn split(path: &str) -> Result<Vec<String>, NsError> {
    let canonical = normalize(path)?;
    Ok(components(&canonical).map(str::to_string).collect())
}

/// Parent of the normalized path, or `None` for the root.
pub fn parent(path: &str) -> Result<Option<String>, NsError> {
    let canonical = normalize(path)?;
    Ok(parent_of(&canonical).map(str::to_string))
}

/// Final component of the normalized path, or `None` for the root.
pub fn file_name(path: &str) -> Result<Option<String>, NsError> {
    let canonical = normalize(path)?;
    Ok(name_of(&canonical).map(str::to_string))
}

/// Append `child` below `base` and normalize the result.
///
/// Unlike [`resolve`], a leading separator on `child` does not discard `base`.
pub fn join(base: &str, child: &str) -> Result<String, NsError> {
    if child.is_empty() {
        return Err(NsError::invalid_path(child, "empty path"));
    }
    normalize(&format!("{base}{SEPARATOR}{child}"))
}

/// Returns `true` if canonical `path` equals `ancestor` or lies below it.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    if ancestor == ROOT {
        return true;
    }
    path == ancestor
        || (path.starts_with(ancestor) && path[ancestor.len()..].starts_with(SEPARATOR))
}

// ============================================================================
// Helpers on already-canonical paths
// ============================================================================

pub(crate) fn components(canonical: &str) -> impl Iterator<Item = &str> {
    canonical.split(SEPARATOR).filter(|s| !s.is_empty())
}

pub(crate) fn parent_of(canonical: &str) -> Option<&str> {
    if canonical == ROOT {
        return None;
    }
    match canonical.rfind(SEPARATOR) {
        Some(0) => Some(ROOT),
        Some(idx) => Some(&canonical[..idx]),
        None => None,
    }
}

pub(crate) fn name_of(canonical: &str) -> Option<&str> {
    if canonical == ROOT {
        return None;
    }
    canonical.rsplit(SEPARATOR).next()
}

pub(crate) fn child_of(canonical: &str, name: &str) -> String {
    if canonical == ROOT {
        format!("{ROOT}{name}")
    } else {
        format!("{canonical}{SEPARATOR}{name}")
    }
}

/// Every path from the root down to `canonical`, inclusive.
pub(crate) fn ancestors_inclusive(canonical: &str) -> Vec<String> {
    let mut out = vec![ROOT.to_string()];
    let mut current = ROOT.to_string();
    for name in components(canonical) {
        current = child_of(&current, name);
        out.push(current.clone());
    }
    out
}
