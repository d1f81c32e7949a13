//! Core types shared by the node tree and the namespace service.

use std::time::SystemTime;

/// Kind of a namespace node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntryKind {
    /// Directory-like node owning named children.
    Container,
    /// File-like node owning a byte buffer.
    Leaf,
}

/// How a leaf write combines with the existing contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WriteMode {
    /// Replace the buffer.
    #[default]
    Overwrite,
    /// Concatenate onto the buffer.
    Append,
}

/// Snapshot of a node's attributes, as returned by `stat`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metadata {
    /// Container or leaf.
    pub kind: EntryKind,
    /// Final path component; empty for the root.
    pub name: String,
    /// Canonical path of the node.
    pub path: String,
    /// Leaf: buffer length. Container: sum of descendant leaf sizes.
    pub size: u64,
    /// Number of direct children (always 0 for a leaf).
    pub children: usize,
    /// Capability descriptor.
    pub permissions: Permissions,
    /// Creation time.
    #[cfg_attr(feature = "serde", serde(with = "system_time_serde"))]
    pub created: SystemTime,
    /// Last modification time.
    #[cfg_attr(feature = "serde", serde(with = "system_time_serde"))]
    pub modified: SystemTime,
}

impl Metadata {
    /// Returns `true` if this is a leaf.
    #[inline]
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::Leaf
    }

    /// Returns `true` if this is a container.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Container
    }
}

/// A single entry returned from `list`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirEntry {
    /// Name of the entry (final component only).
    pub name: String,
    /// Full canonical path to the entry.
    pub path: String,
    /// Kind of the entry.
    pub kind: EntryKind,
    /// Size in bytes (recursive for containers).
    pub size: u64,
}

/// Unix-style permission bits, used as the node capability descriptor.
///
/// Only the owner bits gate access: `0o400` grants read, `0o200` grants
/// write. The remaining bits are carried for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Permissions(u32);

impl Permissions {
    /// Create permissions from a Unix mode (e.g., 0o755).
    #[inline]
    pub const fn from_mode(mode: u32) -> Self {
        Self(mode & 0o7777)
    }

    /// Get the raw mode value.
    #[inline]
    pub const fn mode(&self) -> u32 {
        self.0
    }

    /// Capability check for reads.
    #[inline]
    pub const fn can_read(&self) -> bool {
        self.0 & 0o400 != 0
    }

    /// Capability check for writes.
    #[inline]
    pub const fn can_write(&self) -> bool {
        self.0 & 0o200 != 0
    }

    /// Returns `true` if these permissions deny writing to everyone.
    #[inline]
    pub const fn readonly(&self) -> bool {
        (self.0 & 0o222) == 0
    }

    /// Default permissions for a new leaf (0o644 = rw-r--r--).
    #[inline]
    pub const fn default_file() -> Self {
        Self(0o644)
    }

    /// Default permissions for a new container (0o755 = rwxr-xr-x).
    #[inline]
    pub const fn default_dir() -> Self {
        Self(0o755)
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::default_file()
    }
}

/// Serde support for SystemTime (when serde feature is enabled).
#[cfg(feature = "serde")]
mod system_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let duration = time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        (duration.as_secs(), duration.subsec_nanos()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (secs, nanos): (u64, u32) = Deserialize::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::new(secs, nanos))
    }
}
