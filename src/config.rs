//! Namespace configuration.
//!
//! All knobs have defaults; most callers use [`Namespace::new`](crate::Namespace::new).
//!
//! ```rust
//! use pathspace::{LockEviction, ManualClock, NamePolicy, Namespace, NamespaceConfig};
//! use std::sync::Arc;
//!
//! let config = NamespaceConfig::default()
//!     .with_clock(Arc::new(ManualClock::new()))
//!     .with_lock_eviction(LockEviction::Manual)
//!     .with_name_policy(NamePolicy::portable());
//! let ns = Namespace::with_config(config);
//! assert!(ns.create_file("/CON").is_err());
//! ```

use std::sync::Arc;

use crate::{Clock, NamePolicy, Permissions, SystemClock};

/// When the path lock table forgets an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LockEviction {
    /// Drop the entry as soon as the last holder or waiter releases it.
    #[default]
    OnRelease,
    /// Keep entries until [`PathLockTable::sweep`](crate::PathLockTable::sweep) runs.
    Manual,
}

/// Configuration for a [`Namespace`](crate::Namespace).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NamespaceConfig {
    /// Time source for creation and modification stamps.
    #[cfg_attr(feature = "serde", serde(skip, default = "default_clock"))]
    pub clock: Arc<dyn Clock>,
    /// Lock table eviction policy.
    pub lock_eviction: LockEviction,
    /// Component validation policy.
    pub name_policy: NamePolicy,
    /// Capability given to newly created leaves.
    pub file_permissions: Permissions,
    /// Capability given to newly created containers (and the root).
    pub dir_permissions: Permissions,
}

fn default_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

impl NamespaceConfig {
    /// Use `clock` for timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use `eviction` for the lock table.
    pub fn with_lock_eviction(mut self, eviction: LockEviction) -> Self {
        self.lock_eviction = eviction;
        self
    }

    /// Validate names with `policy`.
    pub fn with_name_policy(mut self, policy: NamePolicy) -> Self {
        self.name_policy = policy;
        self
    }

    /// Permissions for new leaves.
    pub fn with_default_file_permissions(mut self, permissions: Permissions) -> Self {
        self.file_permissions = permissions;
        self
    }

    /// Permissions for new containers.
    pub fn with_default_dir_permissions(mut self, permissions: Permissions) -> Self {
        self.dir_permissions = permissions;
        self
    }
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            clock: default_clock(),
            lock_eviction: LockEviction::default(),
            name_policy: NamePolicy::default(),
            file_permissions: Permissions::default_file(),
            dir_permissions: Permissions::default_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;
    use std::time::UNIX_EPOCH;

    #[test]
    fn defaults() {
        let config = NamespaceConfig::default();
        assert_eq!(config.lock_eviction, LockEviction::OnRelease);
        assert_eq!(config.name_policy, NamePolicy::default());
        assert_eq!(config.file_permissions, Permissions::default_file());
        assert_eq!(config.dir_permissions, Permissions::default_dir());
    }

    #[test]
    fn builder_overrides() {
        let config = NamespaceConfig::default()
            .with_clock(Arc::new(ManualClock::new()))
            .with_lock_eviction(LockEviction::Manual)
            .with_default_file_permissions(Permissions::from_mode(0o600))
            .with_default_dir_permissions(Permissions::from_mode(0o700));
        assert_eq!(config.clock.now(), UNIX_EPOCH);
        assert_eq!(config.lock_eviction, LockEviction::Manual);
        assert_eq!(config.file_permissions.mode(), 0o600);
        assert_eq!(config.dir_permissions.mode(), 0o700);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserializes_partial_config() {
        let config: NamespaceConfig =
            serde_json::from_str(r#"{ "lock_eviction": "Manual" }"#).unwrap();
        assert_eq!(config.lock_eviction, LockEviction::Manual);
        assert_eq!(config.dir_permissions, Permissions::default_dir());
    }
}
