//! # Namespace Service
//!
//! The public operation set over one shared tree.
//!
//! ## Control flow
//!
//! ```text
//! caller ─▶ resolve path(s) against the working directory
//!        ─▶ acquire lock plan through the PathLockTable (sorted)
//!        ─▶ walk from the root, one container lookup per component
//!        ─▶ validate everything, then commit with a single attach/detach
//!        ─▶ release locks, return
//! ```
//!
//! ## Lock scope
//!
//! | Operation | Exclusive | Shared |
//! |-----------|-----------|--------|
//! | `create_file`, `create_directory`, `delete`, `put` | path, parent | other ancestors |
//! | `create_directory` with parents | path and every ancestor | |
//! | `write`, `set_permission` | path | ancestors |
//! | `read`, `list`, `stat`, `get_size`, `exists`, ... | | path, ancestors |
//! | `rename` | src, dst, both parents | other ancestors of src and dst |
//! | `copy` | dst, parent(dst) | src, other ancestors of src and dst |
//!
//! Every operation holds the strict ancestors of its paths at least shared.
//! Moving a container takes the container's own path exclusively, so it
//! excludes every operation on a path below it: a moved subtree is never seen
//! in both places or in neither. Any change to a container's child set holds
//! that container's exclusive lock, so `list` is linearizable with creates,
//! deletes and moves of its direct children. Two crossing moves each hold
//! the other's source as a shared ancestor, so they cannot build a cycle.
//!
//! ## Example
//!
//! ```rust
//! use pathspace::{Namespace, WriteMode};
//!
//! let ns = Namespace::new();
//! ns.create_directory("/home/user", true).unwrap();
//! ns.create_file("/home/user/a.txt").unwrap();
//! ns.write("/home/user/a.txt", b"hi", WriteMode::Overwrite).unwrap();
//! ns.rename("/home/user/a.txt", "/home/user/b.txt").unwrap();
//!
//! assert_eq!(ns.read("/home/user/b.txt").unwrap(), b"hi");
//! assert!(ns.read("/home/user/a.txt").unwrap_err().is_not_found());
//! ```

use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use tracing::{debug, instrument};

use crate::node::Node;
use crate::path::{self, ROOT};
use crate::sync;
use crate::visit;
use crate::{
    Clock, DirEntry, LockMode, Metadata, NamePolicy, NamespaceConfig, NsError, PathLockTable,
    Permissions, WriteMode,
};

type LockPlan = Vec<(String, LockMode)>;

/// Thread-safe in-memory hierarchical namespace.
///
/// # Thread Safety
///
/// All methods take `&self`. Share one instance across threads with
/// `Arc<Namespace>`; locking happens inside each call.
#[derive(Debug)]
pub struct Namespace {
    root: Arc<Node>,
    locks: PathLockTable,
    clock: Arc<dyn Clock>,
    policy: NamePolicy,
    file_permissions: Permissions,
    dir_permissions: Permissions,
    cwd: RwLock<String>,
}

impl Namespace {
    /// Empty namespace with default configuration.
    pub fn new() -> Self {
        Self::with_config(NamespaceConfig::default())
    }

    /// Empty namespace with `config`.
    pub fn with_config(config: NamespaceConfig) -> Self {
        let root = Node::container("", config.dir_permissions, config.clock.now());
        Self {
            root,
            locks: PathLockTable::with_eviction(config.lock_eviction),
            clock: config.clock,
            policy: config.name_policy,
            file_permissions: config.file_permissions,
            dir_permissions: config.dir_permissions,
            cwd: RwLock::new(ROOT.to_string()),
        }
    }

    /// The lock table backing this namespace.
    pub fn lock_table(&self) -> &PathLockTable {
        &self.locks
    }

    // ========================================================================
    // Working directory
    // ========================================================================

    /// Directory relative inputs are resolved against.
    pub fn current_dir(&self) -> String {
        sync::read(&self.cwd).clone()
    }

    /// Change the working directory.
    ///
    /// # Errors
    ///
    /// - [`NsError::NotFound`] if the path does not exist
    /// - [`NsError::NotADirectory`] if it names a leaf
    pub fn set_current_dir(&self, path: &str) -> Result<(), NsError> {
        let target = self.canonical(path)?;
        self.with_shared(&[target.as_str()], || {
            let node = self.lookup(&target)?;
            if !node.is_container() {
                return Err(NsError::NotADirectory { path: target.clone() });
            }
            *sync::write(&self.cwd) = target.clone();
            Ok(())
        })
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Create a container at `path`.
    ///
    /// With `create_parents`, missing ancestors are created too and an
    /// existing container at `path` is not an error.
    ///
    /// # Errors
    ///
    /// - [`NsError::NotFound`] if the parent is missing and `create_parents` is false
    /// - [`NsError::AlreadyExists`] if `path` is taken (by a leaf, or at all
    ///   without `create_parents`)
    /// - [`NsError::NotADirectory`] if an ancestor is a leaf
    /// - [`NsError::PermissionDenied`] if the attaching container is not writable
    #[instrument(level = "debug", skip(self))]
    pub fn create_directory(&self, path: &str, create_parents: bool) -> Result<(), NsError> {
        let target = self.canonical(path)?;
        if target == ROOT {
            return if create_parents {
                Ok(())
            } else {
                Err(NsError::AlreadyExists {
                    path: target,
                    operation: "create directory",
                })
            };
        }

        if create_parents {
            let plan: LockPlan = path::ancestors_inclusive(&target)
                .into_iter()
                .map(|p| (p, LockMode::Exclusive))
                .collect();
            return self.locks.with_locks(plan, || self.create_directory_all(&target));
        }

        let (parent, name) = split_parent(&target);
        self.with_exclusive(&[parent, target.as_str()], || {
            let parent_node = self.lookup(parent)?;
            parent_node
                .add_child(Node::container(name, self.dir_permissions, self.now()), self.now())
                .map_err(|e| with_operation(e, "create directory"))?;
            debug!(path = %target, "created directory");
            Ok(())
        })
    }

    fn create_directory_all(&self, target: &str) -> Result<(), NsError> {
        let names: Vec<&str> = path::components(target).collect();
        let mut current = Arc::clone(&self.root);
        let mut walked = ROOT.to_string();

        for (depth, name) in names.iter().enumerate() {
            let child_path = path::child_of(&walked, name);
            match current.get_child(name)? {
                Some(child) if depth + 1 == names.len() => {
                    return if child.is_container() {
                        Ok(())
                    } else {
                        Err(NsError::AlreadyExists {
                            path: child_path,
                            operation: "create directory",
                        })
                    };
                }
                Some(child) => {
                    if !child.is_container() {
                        return Err(NsError::NotADirectory { path: child_path });
                    }
                    current = child;
                    walked = child_path;
                }
                None => {
                    // Build the missing tail detached, then attach it in one step.
                    let now = self.now();
                    let tail = self.container_chain(&names[depth..], now)?;
                    current.add_child(tail, now)?;
                    debug!(path = %target, created = names.len() - depth, "created directories");
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Nested detached containers `names[0]/names[1]/...`, top returned.
    fn container_chain(&self, names: &[&str], now: SystemTime) -> Result<Arc<Node>, NsError> {
        let mut below: Option<Arc<Node>> = None;
        for name in names.iter().rev() {
            let node = Node::container(*name, Permissions::from_mode(0o700), now);
            if let Some(child) = below.take() {
                node.add_child(child, now)?;
            }
            node.set_permissions(self.dir_permissions, now);
            below = Some(node);
        }
        below.ok_or_else(|| NsError::invalid_path("", "empty path"))
    }

    /// Create an empty leaf at `path`.
    ///
    /// # Errors
    ///
    /// - [`NsError::NotFound`] if the parent does not exist
    /// - [`NsError::NotADirectory`] if the parent is a leaf
    /// - [`NsError::AlreadyExists`] if the name is taken
    /// - [`NsError::PermissionDenied`] if the parent is not writable
    #[instrument(level = "debug", skip(self))]
    pub fn create_file(&self, path: &str) -> Result<(), NsError> {
        let target = self.canonical(path)?;
        if target == ROOT {
            return Err(NsError::AlreadyExists {
                path: target,
                operation: "create file",
            });
        }

        let (parent, name) = split_parent(&target);
        self.with_exclusive(&[parent, target.as_str()], || {
            let parent_node = self.lookup(parent)?;
            let now = self.now();
            parent_node
                .add_child(Node::leaf(name, self.file_permissions, now), now)
                .map_err(|e| with_operation(e, "create file"))?;
            debug!(path = %target, "created file");
            Ok(())
        })
    }

    /// Create the leaf if it is missing, then replace its contents.
    ///
    /// # Errors
    ///
    /// As [`create_file`](Self::create_file) and [`write`](Self::write),
    /// except that an existing leaf is not an error.
    #[instrument(level = "debug", skip(self, data), fields(len = data.len()))]
    pub fn put(&self, path: &str, data: &[u8]) -> Result<(), NsError> {
        let target = self.canonical(path)?;
        if target == ROOT {
            return Err(NsError::IsADirectory { path: target });
        }

        let (parent, name) = split_parent(&target);
        self.with_exclusive(&[parent, target.as_str()], || {
            let parent_node = self.lookup(parent)?;
            let now = self.now();
            match parent_node.get_child(name)? {
                Some(node) => node.write(data, WriteMode::Overwrite, now)?,
                None => {
                    let leaf = Node::leaf_with(name, self.file_permissions, now, data.to_vec());
                    parent_node.add_child(leaf, now)?;
                }
            }
            debug!(path = %target, "put file");
            Ok(())
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Direct children of the container at `path`, ordered by name.
    ///
    /// # Errors
    ///
    /// - [`NsError::NotFound`] if the path does not exist
    /// - [`NsError::NotADirectory`] if it names a leaf
    /// - [`NsError::PermissionDenied`] if the container is not readable
    pub fn list(&self, path: &str) -> Result<Vec<DirEntry>, NsError> {
        let target = self.canonical(path)?;
        self.with_shared(&[target.as_str()], || {
            let node = self.lookup(&target)?;
            let entries = node
                .list_children()?
                .into_iter()
                .map(|child| {
                    let name = child.name();
                    DirEntry {
                        path: path::child_of(&target, &name),
                        name,
                        kind: child.entry_kind(),
                        size: visit::size_of(&child),
                    }
                })
                .collect();
            Ok(entries)
        })
    }

    /// Attributes of the node at `path`.
    ///
    /// # Errors
    ///
    /// - [`NsError::NotFound`] if the path does not exist
    pub fn stat(&self, path: &str) -> Result<Metadata, NsError> {
        let target = self.canonical(path)?;
        self.with_shared(&[target.as_str()], || {
            let node = self.lookup(&target)?;
            Ok(Metadata {
                kind: node.entry_kind(),
                name: node.name(),
                path: target.clone(),
                size: visit::size_of(&node),
                children: node.child_count(),
                permissions: node.permissions(),
                created: node.created(),
                modified: node.modified(),
            })
        })
    }

    /// Returns `true` if `path` resolves to a node.
    ///
    /// A missing node, or a leaf where a container was expected on the way,
    /// is `Ok(false)`.
    ///
    /// # Errors
    ///
    /// - [`NsError::InvalidPath`] if the input is malformed
    /// - [`NsError::PermissionDenied`] if an ancestor is not readable
    pub fn exists(&self, path: &str) -> Result<bool, NsError> {
        let target = self.canonical(path)?;
        self.with_shared(&[target.as_str()], || Ok(self.lookup_opt(&target)?.is_some()))
    }

    /// Existence of several paths, observed at a single instant.
    ///
    /// All paths are read-locked together, so no `rename` can be seen half
    /// done across them.
    pub fn probe<P: AsRef<str>>(&self, paths: &[P]) -> Result<Vec<bool>, NsError> {
        let targets = paths
            .iter()
            .map(|p| self.canonical(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let borrowed: Vec<&str> = targets.iter().map(String::as_str).collect();
        self.with_shared(&borrowed, || {
            targets
                .iter()
                .map(|t| Ok(self.lookup_opt(t)?.is_some()))
                .collect()
        })
    }

    /// Every path below the container at `path`, pre-order.
    ///
    /// # Errors
    ///
    /// - [`NsError::NotFound`] if the path does not exist
    /// - [`NsError::NotADirectory`] if it names a leaf
    /// - [`NsError::PermissionDenied`] if the container is not readable
    pub fn descendants(&self, path: &str) -> Result<Vec<String>, NsError> {
        let target = self.canonical(path)?;
        self.with_shared(&[target.as_str()], || {
            let node = self.lookup(&target)?;
            node.check_listable()?;
            Ok(visit::descendant_paths(&node, &target))
        })
    }

    /// Size of the node at `path`: leaf length or recursive container sum.
    ///
    /// # Errors
    ///
    /// - [`NsError::NotFound`] if the path does not exist
    pub fn get_size(&self, path: &str) -> Result<u64, NsError> {
        let target = self.canonical(path)?;
        self.with_shared(&[target.as_str()], || {
            let node = self.lookup(&target)?;
            Ok(visit::size_of(&node))
        })
    }

    // ========================================================================
    // Leaf contents
    // ========================================================================

    /// Full contents of the leaf at `path`.
    ///
    /// # Errors
    ///
    /// - [`NsError::NotFound`] if the path does not exist
    /// - [`NsError::IsADirectory`] if it names a container
    /// - [`NsError::PermissionDenied`] if the leaf is not readable
    pub fn read(&self, path: &str) -> Result<Vec<u8>, NsError> {
        let target = self.canonical(path)?;
        self.with_shared(&[target.as_str()], || self.lookup(&target)?.read())
    }

    /// Contents of the leaf at `path` as UTF-8 text.
    ///
    /// # Errors
    ///
    /// As [`read`](Self::read), plus [`NsError::InvalidData`] for non-UTF-8 contents.
    pub fn read_to_string(&self, path: &str) -> Result<String, NsError> {
        let target = self.canonical(path)?;
        let bytes = self.read(&target)?;
        String::from_utf8(bytes).map_err(|_| NsError::InvalidData {
            path: target,
            details: "contents are not valid UTF-8".into(),
        })
    }

    /// Overwrite or append to the leaf at `path`.
    ///
    /// # Errors
    ///
    /// - [`NsError::NotFound`] if the path does not exist
    /// - [`NsError::IsADirectory`] if it names a container
    /// - [`NsError::PermissionDenied`] if the leaf is not writable
    #[instrument(level = "debug", skip(self, data), fields(len = data.len()))]
    pub fn write(&self, path: &str, data: &[u8], mode: WriteMode) -> Result<(), NsError> {
        let target = self.canonical(path)?;
        self.with_exclusive(&[target.as_str()], || {
            self.lookup(&target)?.write(data, mode, self.now())?;
            debug!(path = %target, ?mode, "wrote file");
            Ok(())
        })
    }

    // ========================================================================
    // Relocation
    // ========================================================================

    /// Atomically move the node at `src` to `dst`, renaming it if the final
    /// component differs.
    ///
    /// # Errors
    ///
    /// - [`NsError::InvalidOperation`] if `src` is the root or `dst` lies inside `src`
    /// - [`NsError::NotFound`] if `src` or the parent of `dst` does not exist
    /// - [`NsError::AlreadyExists`] if `dst` is taken
    /// - [`NsError::NotADirectory`] if the parent of `dst` is a leaf
    /// - [`NsError::PermissionDenied`] if either parent is not writable
    #[instrument(level = "debug", skip(self))]
    pub fn rename(&self, src: &str, dst: &str) -> Result<(), NsError> {
        let from = self.canonical(src)?;
        let to = self.canonical(dst)?;
        if from == ROOT {
            return Err(NsError::InvalidOperation {
                path: from,
                reason: "cannot move the root",
            });
        }
        check_relocation(&from, &to, "rename")?;

        let (from_parent, from_name) = split_parent(&from);
        let (to_parent, to_name) = split_parent(&to);
        let plan = lock_plan(&[from.as_str(), from_parent, to.as_str(), to_parent], &[]);

        self.locks.with_locks(plan, || {
            let source_parent = self.lookup(from_parent)?;
            let node = source_parent
                .get_child(from_name)?
                .ok_or_else(|| NsError::not_found(from.clone()))?;
            let target_parent = self.target_parent(to_parent, to_name, &to, "rename")?;

            if !source_parent.permissions().can_write() {
                return Err(NsError::denied(from_parent, "rename"));
            }

            let now = self.now();
            source_parent.remove_child(from_name, now)?;
            node.set_name(to_name);
            if let Err(e) = target_parent.add_child(Arc::clone(&node), now) {
                node.set_name(from_name);
                source_parent.add_child(node, now)?;
                return Err(e);
            }
            debug!(from = %from, to = %to, "moved");
            Ok(())
        })
    }

    /// Deep-copy the node at `src` to `dst`.
    ///
    /// The copy is built detached and attached in one step. It reflects `src`
    /// as seen under a shared lock on `src` itself; descendants written
    /// concurrently through their own paths may be observed either way.
    ///
    /// # Errors
    ///
    /// As [`rename`](Self::rename), plus [`NsError::PermissionDenied`] for
    /// any unreadable node inside `src`.
    #[instrument(level = "debug", skip(self))]
    pub fn copy(&self, src: &str, dst: &str) -> Result<(), NsError> {
        let from = self.canonical(src)?;
        let to = self.canonical(dst)?;
        check_relocation(&from, &to, "copy")?;

        let (to_parent, to_name) = split_parent(&to);
        let plan = lock_plan(&[to.as_str(), to_parent], &[from.as_str()]);

        self.locks.with_locks(plan, || {
            let node = self.lookup(&from)?;
            let target_parent = self.target_parent(to_parent, to_name, &to, "copy")?;
            let now = self.now();
            let copy = visit::duplicate(&node, to_name, now)?;
            target_parent.add_child(copy, now)?;
            debug!(from = %from, to = %to, "copied");
            Ok(())
        })
    }

    /// Resolve and validate the container a relocation attaches into.
    fn target_parent(
        &self,
        parent: &str,
        name: &str,
        full: &str,
        operation: &'static str,
    ) -> Result<Arc<Node>, NsError> {
        let node = self.lookup(parent)?;
        if !node.is_container() {
            return Err(NsError::NotADirectory {
                path: parent.to_string(),
            });
        }
        if node.has_child(name)? {
            return Err(NsError::AlreadyExists {
                path: full.to_string(),
                operation,
            });
        }
        if !node.permissions().can_write() {
            return Err(NsError::denied(parent, operation));
        }
        Ok(node)
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Remove the node at `path`.
    ///
    /// Returns `Ok(false)` if there was nothing to remove.
    ///
    /// # Errors
    ///
    /// - [`NsError::InvalidOperation`] if `path` is the root
    /// - [`NsError::NotEmpty`] for a non-empty container without `recursive`
    /// - [`NsError::PermissionDenied`] if the parent is not writable
    #[instrument(level = "debug", skip(self))]
    pub fn delete(&self, path: &str, recursive: bool) -> Result<bool, NsError> {
        let target = self.canonical(path)?;
        if target == ROOT {
            return Err(NsError::InvalidOperation {
                path: target,
                reason: "cannot delete the root",
            });
        }

        let (parent, name) = split_parent(&target);
        self.with_exclusive(&[parent, target.as_str()], || {
            let Some(parent_node) = self.lookup_opt(parent)? else {
                return Ok(false);
            };
            if !parent_node.is_container() {
                return Ok(false);
            }
            let Some(node) = parent_node.get_child(name)? else {
                return Ok(false);
            };
            if !recursive && node.child_count() > 0 {
                return Err(NsError::NotEmpty { path: target.clone() });
            }

            parent_node.remove_child(name, self.now())?;
            debug!(path = %target, recursive, "deleted");
            Ok(true)
        })
    }

    // ========================================================================
    // Permissions
    // ========================================================================

    /// Replace the capability of the node at `path`, and of its whole subtree
    /// when `recursive`.
    ///
    /// # Errors
    ///
    /// - [`NsError::NotFound`] if the path does not exist
    #[instrument(level = "debug", skip(self))]
    pub fn set_permission(
        &self,
        path: &str,
        permissions: Permissions,
        recursive: bool,
    ) -> Result<(), NsError> {
        let target = self.canonical(path)?;
        self.with_exclusive(&[target.as_str()], || {
            let node = self.lookup(&target)?;
            let now = self.now();
            if recursive {
                visit::apply_permissions(&node, permissions, now);
            } else {
                node.set_permissions(permissions, now);
            }
            debug!(path = %target, mode = permissions.mode(), recursive, "set permissions");
            Ok(())
        })
    }

    /// Capability of the node at `path`.
    ///
    /// # Errors
    ///
    /// - [`NsError::NotFound`] if the path does not exist
    pub fn get_permission(&self, path: &str) -> Result<Permissions, NsError> {
        let target = self.canonical(path)?;
        self.with_shared(&[target.as_str()], || Ok(self.lookup(&target)?.permissions()))
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn now(&self) -> SystemTime {
        self.clock.now()
    }

    /// Run `f` with `paths` and their ancestors shared.
    fn with_shared<R>(&self, paths: &[&str], f: impl FnOnce() -> R) -> R {
        self.locks.with_locks(lock_plan(&[], paths), f)
    }

    /// Run `f` with `paths` exclusive and their other ancestors shared.
    fn with_exclusive<R>(&self, paths: &[&str], f: impl FnOnce() -> R) -> R {
        self.locks.with_locks(lock_plan(paths, &[]), f)
    }

    fn canonical(&self, path: &str) -> Result<String, NsError> {
        let base = self.current_dir();
        self.policy.resolve(&base, path)
    }

    /// Walk from the root. Caller holds the locks.
    fn lookup(&self, canonical: &str) -> Result<Arc<Node>, NsError> {
        let mut current = Arc::clone(&self.root);
        for name in path::components(canonical) {
            current = current
                .get_child(name)?
                .ok_or_else(|| NsError::not_found(canonical))?;
        }
        Ok(current)
    }

    /// Like [`lookup`](Self::lookup), with "does not resolve" as `None`.
    fn lookup_opt(&self, canonical: &str) -> Result<Option<Arc<Node>>, NsError> {
        match self.lookup(canonical) {
            Ok(node) => Ok(Some(node)),
            Err(NsError::NotFound { .. } | NsError::NotADirectory { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new()
    }
}

/// Parent path and final name of a canonical, non-root path.
fn split_parent(canonical: &str) -> (&str, &str) {
    let parent = path::parent_of(canonical).unwrap_or(ROOT);
    let name = path::name_of(canonical).unwrap_or_default();
    (parent, name)
}

/// Shared checks for `rename` and `copy` on canonical endpoints.
fn check_relocation(from: &str, to: &str, operation: &'static str) -> Result<(), NsError> {
    if from == to || to == ROOT {
        return Err(NsError::AlreadyExists {
            path: to.to_string(),
            operation,
        });
    }
    if path::is_within(to, from) {
        return Err(NsError::InvalidOperation {
            path: to.to_string(),
            reason: "destination is inside the source",
        });
    }
    Ok(())
}

/// Exclusive `writes`, shared `reads`, and every strict ancestor of either
/// shared. Merging lets an exclusive request win over an ancestor share.
fn lock_plan(writes: &[&str], reads: &[&str]) -> LockPlan {
    let mut plan: LockPlan = Vec::new();
    for p in writes.iter().chain(reads) {
        let mut chain = path::ancestors_inclusive(p);
        chain.pop();
        plan.extend(chain.into_iter().map(|a| (a, LockMode::Shared)));
    }
    plan.extend(reads.iter().map(|p| (p.to_string(), LockMode::Shared)));
    plan.extend(writes.iter().map(|p| (p.to_string(), LockMode::Exclusive)));
    plan
}

/// Re-label `AlreadyExists` from the node layer with the service operation.
fn with_operation(err: NsError, operation: &'static str) -> NsError {
    match err {
        NsError::AlreadyExists { path, .. } => NsError::AlreadyExists { path, operation },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EntryKind, ManualClock};
    use std::time::{Duration, UNIX_EPOCH};

    fn with_clock() -> (Namespace, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let ns = Namespace::with_config(NamespaceConfig::default().with_clock(clock.clone()));
        (ns, clock)
    }

    #[test]
    fn lock_plan_shares_ancestors_and_excludes_endpoints() {
        let plan = lock_plan(&["/a/b", "/a", "/c/d", "/c"], &[]);
        let merged: Vec<_> = crate::lock_table::merge(plan).into_iter().collect();
        assert_eq!(
            merged,
            vec![
                ("/".to_string(), LockMode::Shared),
                ("/a".to_string(), LockMode::Exclusive),
                ("/a/b".to_string(), LockMode::Exclusive),
                ("/c".to_string(), LockMode::Exclusive),
                ("/c/d".to_string(), LockMode::Exclusive),
            ]
        );
    }

    #[test]
    fn lock_plan_shares_ancestors_of_reads() {
        let merged: Vec<_> = crate::lock_table::merge(lock_plan(&[], &["/x/a/f"]))
            .into_iter()
            .collect();
        assert_eq!(
            merged,
            vec![
                ("/".to_string(), LockMode::Shared),
                ("/x".to_string(), LockMode::Shared),
                ("/x/a".to_string(), LockMode::Shared),
                ("/x/a/f".to_string(), LockMode::Shared),
            ]
        );
    }

    #[test]
    fn access_below_a_held_container_waits() {
        let ns = Arc::new(Namespace::new());
        ns.create_directory("/x/a", true).unwrap();
        ns.put("/x/a/f", b"data").unwrap();

        let (done_tx, done_rx) = std::sync::mpsc::channel();
        ns.lock_table().with_write_lock("/x/a", || {
            let worker = Arc::clone(&ns);
            let done_tx = done_tx.clone();
            std::thread::spawn(move || {
                let seen = worker.exists("/x/a/f").unwrap();
                done_tx.send(seen).unwrap();
            });
            // A container move holds its own path exclusively; readers
            // of descendants must not get past it.
            assert!(done_rx.recv_timeout(Duration::from_millis(200)).is_err());
        });
        assert!(done_rx.recv_timeout(Duration::from_secs(30)).unwrap());
    }

    #[test]
    fn get_size_of_leaf_and_container() {
        let ns = Namespace::new();
        ns.create_directory("/d/e", true).unwrap();
        ns.put("/d/a", b"abc").unwrap();
        ns.put("/d/e/b", b"defg").unwrap();
        assert_eq!(ns.get_size("/d/a").unwrap(), 3);
        assert_eq!(ns.get_size("/d").unwrap(), 7);
        assert!(ns.get_size("/nope").unwrap_err().is_not_found());
    }

    #[test]
    fn descendants_checks_kind_and_capability() {
        let ns = Namespace::new();
        ns.create_directory("/d/sub", true).unwrap();
        ns.put("/d/sub/f", b"x").unwrap();
        assert_eq!(ns.descendants("/d").unwrap(), vec!["/d/sub", "/d/sub/f"]);
        assert!(matches!(
            ns.descendants("/d/sub/f"),
            Err(NsError::NotADirectory { .. })
        ));

        ns.set_permission("/d", Permissions::from_mode(0o300), false)
            .unwrap();
        assert!(matches!(
            ns.descendants("/d"),
            Err(NsError::PermissionDenied { operation: "list", .. })
        ));
    }

    #[test]
    fn read_to_string_reports_canonical_path() {
        let ns = Namespace::new();
        ns.create_directory("/d", false).unwrap();
        ns.set_current_dir("/d").unwrap();
        ns.put("bin", &[0xff, 0xfe]).unwrap();

        match ns.read_to_string("./x/../bin") {
            Err(NsError::InvalidData { path, .. }) => assert_eq!(path, "/d/bin"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn split_parent_of_top_level() {
        assert_eq!(split_parent("/a"), ("/", "a"));
        assert_eq!(split_parent("/a/b/c"), ("/a/b", "c"));
    }

    #[test]
    fn timestamps_come_from_injected_clock() {
        let (ns, clock) = with_clock();
        clock.set(Duration::from_secs(10));
        ns.create_file("/f").unwrap();
        clock.advance(Duration::from_secs(5));
        ns.write("/f", b"x", WriteMode::Append).unwrap();

        let meta = ns.stat("/f").unwrap();
        assert_eq!(meta.created, UNIX_EPOCH + Duration::from_secs(10));
        assert_eq!(meta.modified, UNIX_EPOCH + Duration::from_secs(15));
        assert_eq!(meta.kind, EntryKind::Leaf);

        let root = ns.stat("/").unwrap();
        assert_eq!(root.modified, UNIX_EPOCH + Duration::from_secs(10));
        assert_eq!(root.name, "");
        assert_eq!(root.children, 1);
    }

    #[test]
    fn relative_paths_use_working_directory() {
        let ns = Namespace::new();
        ns.create_directory("/home/user", true).unwrap();
        ns.set_current_dir("/home/user").unwrap();
        ns.create_file("notes.txt").unwrap();
        assert!(ns.exists("/home/user/notes.txt").unwrap());
        assert!(ns.exists("../user/notes.txt").unwrap());
        assert_eq!(ns.current_dir(), "/home/user");

        assert!(matches!(
            ns.set_current_dir("notes.txt"),
            Err(NsError::NotADirectory { .. })
        ));
        assert!(matches!(ns.set_current_dir("/nope"), Err(NsError::NotFound { .. })));
        assert_eq!(ns.current_dir(), "/home/user");
    }

    #[test]
    fn create_directory_chain_respects_dir_permissions() {
        let ns = Namespace::with_config(
            NamespaceConfig::default().with_default_dir_permissions(Permissions::from_mode(0o555)),
        );
        // Root itself is read-only now, so nothing can be attached.
        assert!(matches!(
            ns.create_directory("/a/b", true),
            Err(NsError::PermissionDenied { .. })
        ));
        assert!(!ns.exists("/a").unwrap());
    }

    #[test]
    fn lock_table_is_empty_between_operations() {
        let ns = Namespace::new();
        ns.create_directory("/a/b", true).unwrap();
        ns.create_file("/a/b/f").unwrap();
        ns.rename("/a/b/f", "/a/g").unwrap();
        assert!(ns.lock_table().is_empty());
    }

    #[test]
    fn rename_denied_by_source_parent_changes_nothing() {
        let ns = Namespace::new();
        ns.create_directory("/locked", false).unwrap();
        ns.create_file("/locked/f").unwrap();
        ns.set_permission("/locked", Permissions::from_mode(0o555), false)
            .unwrap();

        assert!(matches!(
            ns.rename("/locked/f", "/f"),
            Err(NsError::PermissionDenied { .. })
        ));
        assert!(ns.exists("/locked/f").unwrap());
        assert!(!ns.exists("/f").unwrap());
    }
}
