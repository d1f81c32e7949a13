//! # Namespace Node
//!
//! The tree data model: a [`Node`] is either a container of named children or
//! a leaf holding a byte buffer.
//!
//! ## Ownership
//!
//! ```text
//! Container ──Arc──▶ child        (owning, via the child map)
//! child     ──Weak─▶ Container   (non-owning back-reference)
//! ```
//!
//! Only containers own nodes, so the structure cannot keep itself alive
//! through a parent link. A node's path is never stored; [`Node::path`]
//! rebuilds it from the parent chain.
//!
//! ## Capability checks
//!
//! Every public accessor checks the node's [`Permissions`] first and fails
//! with [`NsError::PermissionDenied`] without touching anything. Crate-internal
//! `*_unchecked` helpers exist for traversals that must see the whole tree.
//!
//! ## Internal lock order
//!
//! Within this module the payload lock (child map or buffer) is always taken
//! before the attribute lock, and attribute locks are never held while
//! another node is locked.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock, Weak};
use std::time::SystemTime;

use crate::path::{ROOT, SEPARATOR};
use crate::sync;
use crate::{EntryKind, NsError, Permissions, WriteMode};

/// Payload of a node.
pub enum NodeKind {
    /// Named children, unique within this container.
    Container(RwLock<BTreeMap<String, Arc<Node>>>),
    /// Leaf contents.
    Leaf(RwLock<Vec<u8>>),
}

/// Mutable attributes shared by both kinds.
#[derive(Debug)]
struct Attributes {
    name: String,
    parent: Weak<Node>,
    permissions: Permissions,
    modified: SystemTime,
}

/// A node in the namespace tree.
pub struct Node {
    created: SystemTime,
    attrs: RwLock<Attributes>,
    kind: NodeKind,
}

impl Node {
    /// A detached, empty container.
    pub fn container(name: impl Into<String>, permissions: Permissions, now: SystemTime) -> Arc<Node> {
        Self::build(name.into(), permissions, now, NodeKind::Container(RwLock::default()))
    }

    /// A detached, empty leaf.
    pub fn leaf(name: impl Into<String>, permissions: Permissions, now: SystemTime) -> Arc<Node> {
        Self::build(name.into(), permissions, now, NodeKind::Leaf(RwLock::default()))
    }

    /// A detached leaf holding `data`.
    pub fn leaf_with(
        name: impl Into<String>,
        permissions: Permissions,
        now: SystemTime,
        data: Vec<u8>,
    ) -> Arc<Node> {
        Self::build(name.into(), permissions, now, NodeKind::Leaf(RwLock::new(data)))
    }

    fn build(name: String, permissions: Permissions, now: SystemTime, kind: NodeKind) -> Arc<Node> {
        Arc::new(Node {
            created: now,
            attrs: RwLock::new(Attributes {
                name,
                parent: Weak::new(),
                permissions,
                modified: now,
            }),
            kind,
        })
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    /// Payload variant.
    #[inline]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Container or leaf.
    pub fn entry_kind(&self) -> EntryKind {
        match self.kind {
            NodeKind::Container(_) => EntryKind::Container,
            NodeKind::Leaf(_) => EntryKind::Leaf,
        }
    }

    /// Returns `true` for containers.
    pub fn is_container(&self) -> bool {
        matches!(self.kind, NodeKind::Container(_))
    }

    /// Name within the parent; empty for the root.
    pub fn name(&self) -> String {
        sync::read(&self.attrs).name.clone()
    }

    /// Parent container, or `None` for the root and detached nodes.
    pub fn parent(&self) -> Option<Arc<Node>> {
        sync::read(&self.attrs).parent.upgrade()
    }

    /// Capability descriptor.
    pub fn permissions(&self) -> Permissions {
        sync::read(&self.attrs).permissions
    }

    /// Creation time.
    pub fn created(&self) -> SystemTime {
        self.created
    }

    /// Last modification time.
    pub fn modified(&self) -> SystemTime {
        sync::read(&self.attrs).modified
    }

    /// Replace the capability descriptor. Not itself capability-gated, so a
    /// locked-out node can always be reopened.
    pub fn set_permissions(&self, permissions: Permissions, now: SystemTime) {
        let mut attrs = sync::write(&self.attrs);
        attrs.permissions = permissions;
        attrs.modified = now;
    }

    /// Full canonical path, rebuilt from the parent chain.
    ///
    /// A detached node reports its path as if it were a child of the root.
    pub fn path(&self) -> String {
        let mut names = Vec::new();
        let (name, mut next) = {
            let attrs = sync::read(&self.attrs);
            (attrs.name.clone(), attrs.parent.upgrade())
        };
        if !name.is_empty() {
            names.push(name);
        }
        while let Some(node) = next {
            let attrs = sync::read(&node.attrs);
            if !attrs.name.is_empty() {
                names.push(attrs.name.clone());
            }
            next = attrs.parent.upgrade();
        }

        if names.is_empty() {
            return ROOT.to_string();
        }
        let mut out = String::new();
        for name in names.iter().rev() {
            out.push(SEPARATOR);
            out.push_str(name);
        }
        out
    }

    fn touch(&self, now: SystemTime) {
        sync::write(&self.attrs).modified = now;
    }

    fn check_read(&self, operation: &'static str) -> Result<(), NsError> {
        if self.permissions().can_read() {
            Ok(())
        } else {
            Err(NsError::denied(self.path(), operation))
        }
    }

    fn check_write(&self, operation: &'static str) -> Result<(), NsError> {
        if self.permissions().can_write() {
            Ok(())
        } else {
            Err(NsError::denied(self.path(), operation))
        }
    }

    fn children(&self) -> Result<&RwLock<BTreeMap<String, Arc<Node>>>, NsError> {
        match &self.kind {
            NodeKind::Container(children) => Ok(children),
            NodeKind::Leaf(_) => Err(NsError::NotADirectory { path: self.path() }),
        }
    }

    fn content(&self) -> Result<&RwLock<Vec<u8>>, NsError> {
        match &self.kind {
            NodeKind::Leaf(data) => Ok(data),
            NodeKind::Container(_) => Err(NsError::IsADirectory { path: self.path() }),
        }
    }

    // ------------------------------------------------------------------
    // Container operations
    // ------------------------------------------------------------------

    /// Attach `child` under its current name.
    ///
    /// # Errors
    ///
    /// - [`NsError::NotADirectory`] if `self` is a leaf
    /// - [`NsError::PermissionDenied`] if `self` is not writable
    /// - [`NsError::AlreadyExists`] if the name is taken; nothing changes
    pub fn add_child(self: &Arc<Self>, child: Arc<Node>, now: SystemTime) -> Result<(), NsError> {
        let children = self.children()?;
        self.check_write("add child")?;

        let name = child.name();
        let mut map = sync::write(children);
        if map.contains_key(&name) {
            drop(map);
            return Err(NsError::AlreadyExists {
                path: crate::path::child_of(&self.path(), &name),
                operation: "add child",
            });
        }
        sync::write(&child.attrs).parent = Arc::downgrade(self);
        map.insert(name, child);
        self.touch(now);
        Ok(())
    }

    /// Detach the child called `name`, clearing its back-reference.
    ///
    /// Returns `Ok(None)` if there is no such child.
    pub fn remove_child(&self, name: &str, now: SystemTime) -> Result<Option<Arc<Node>>, NsError> {
        let children = self.children()?;
        self.check_write("remove child")?;

        let mut map = sync::write(children);
        let removed = map.remove(name);
        if let Some(child) = &removed {
            sync::write(&child.attrs).parent = Weak::new();
            self.touch(now);
        }
        Ok(removed)
    }

    /// Look up a direct child.
    pub fn get_child(&self, name: &str) -> Result<Option<Arc<Node>>, NsError> {
        let children = self.children()?;
        self.check_read("lookup")?;
        Ok(sync::read(children).get(name).cloned())
    }

    /// Returns `true` if a direct child called `name` exists.
    pub fn has_child(&self, name: &str) -> Result<bool, NsError> {
        let children = self.children()?;
        self.check_read("lookup")?;
        Ok(sync::read(children).contains_key(name))
    }

    /// Direct children, ordered by name.
    pub fn list_children(&self) -> Result<Vec<Arc<Node>>, NsError> {
        let children = self.listable()?;
        Ok(sync::read(children).values().cloned().collect())
    }

    /// Fails as [`list_children`](Self::list_children) would, without
    /// collecting anything.
    pub(crate) fn check_listable(&self) -> Result<(), NsError> {
        self.listable().map(|_| ())
    }

    fn listable(&self) -> Result<&RwLock<BTreeMap<String, Arc<Node>>>, NsError> {
        let children = self.children()?;
        self.check_read("list")?;
        Ok(children)
    }

    // ------------------------------------------------------------------
    // Leaf operations
    // ------------------------------------------------------------------

    /// Full buffer contents.
    ///
    /// # Errors
    ///
    /// - [`NsError::IsADirectory`] if `self` is a container
    /// - [`NsError::PermissionDenied`] if `self` is not readable
    pub fn read(&self) -> Result<Vec<u8>, NsError> {
        let content = self.content()?;
        self.check_read("read")?;
        Ok(sync::read(content).clone())
    }

    /// Overwrite or append to the buffer.
    ///
    /// # Errors
    ///
    /// - [`NsError::IsADirectory`] if `self` is a container
    /// - [`NsError::PermissionDenied`] if `self` is not writable
    pub fn write(&self, data: &[u8], mode: WriteMode, now: SystemTime) -> Result<(), NsError> {
        let content = self.content()?;
        self.check_write("write")?;

        let mut buf = sync::write(content);
        match mode {
            WriteMode::Overwrite => {
                buf.clear();
                buf.extend_from_slice(data);
            }
            WriteMode::Append => buf.extend_from_slice(data),
        }
        self.touch(now);
        Ok(())
    }

    /// Size in bytes: buffer length, or the recursive sum for a container.
    pub fn size(&self) -> u64 {
        crate::visit::size_of(self)
    }

    // ------------------------------------------------------------------
    // Unchecked access for traversals
    // ------------------------------------------------------------------

    pub(crate) fn children_unchecked(&self) -> Vec<Arc<Node>> {
        match &self.kind {
            NodeKind::Container(children) => sync::read(children).values().cloned().collect(),
            NodeKind::Leaf(_) => Vec::new(),
        }
    }

    pub(crate) fn child_count(&self) -> usize {
        match &self.kind {
            NodeKind::Container(children) => sync::read(children).len(),
            NodeKind::Leaf(_) => 0,
        }
    }

    pub(crate) fn content_len(&self) -> u64 {
        match &self.kind {
            NodeKind::Leaf(data) => sync::read(data).len() as u64,
            NodeKind::Container(_) => 0,
        }
    }

    /// Rename a node that is not attached anywhere.
    pub(crate) fn set_name(&self, name: &str) {
        sync::write(&self.attrs).name = name.to_string();
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attrs = sync::read(&self.attrs);
        f.debug_struct("Node")
            .field("name", &attrs.name)
            .field("kind", &self.entry_kind())
            .field("permissions", &attrs.permissions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn root() -> Arc<Node> {
        Node::container("", Permissions::default_dir(), at(0))
    }

    #[test]
    fn add_child_sets_parent_and_touches() {
        let root = root();
        let child = Node::container("a", Permissions::default_dir(), at(1));
        root.add_child(Arc::clone(&child), at(5)).unwrap();

        assert!(Arc::ptr_eq(&child.parent().unwrap(), &root));
        assert_eq!(root.modified(), at(5));
        assert_eq!(child.path(), "/a");
        assert!(root.has_child("a").unwrap());
    }

    #[test]
    fn add_child_rejects_duplicates_without_change() {
        let root = root();
        root.add_child(Node::leaf("f", Permissions::default_file(), at(1)), at(1))
            .unwrap();
        let dup = Node::leaf("f", Permissions::default_file(), at(2));
        let err = root.add_child(Arc::clone(&dup), at(2)).unwrap_err();

        assert!(matches!(err, NsError::AlreadyExists { ref path, .. } if path == "/f"));
        assert!(dup.parent().is_none());
        assert_eq!(root.modified(), at(1));
        assert_eq!(root.list_children().unwrap().len(), 1);
    }

    #[test]
    fn add_child_requires_write() {
        let root = Node::container("", Permissions::from_mode(0o555), at(0));
        let err = root
            .add_child(Node::leaf("f", Permissions::default_file(), at(0)), at(0))
            .unwrap_err();
        assert!(matches!(err, NsError::PermissionDenied { .. }));
        assert!(root.list_children().unwrap().is_empty());
    }

    #[test]
    fn remove_child_clears_back_reference() {
        let root = root();
        let child = Node::leaf("f", Permissions::default_file(), at(0));
        root.add_child(Arc::clone(&child), at(1)).unwrap();

        let removed = root.remove_child("f", at(2)).unwrap().unwrap();
        assert!(Arc::ptr_eq(&removed, &child));
        assert!(child.parent().is_none());
        assert_eq!(root.modified(), at(2));
        assert!(root.remove_child("f", at(3)).unwrap().is_none());
        assert_eq!(root.modified(), at(2));
    }

    #[test]
    fn lookups_require_read() {
        let root = Node::container("", Permissions::from_mode(0o300), at(0));
        assert!(matches!(root.get_child("x"), Err(NsError::PermissionDenied { .. })));
        assert!(matches!(root.list_children(), Err(NsError::PermissionDenied { .. })));
        assert!(matches!(root.has_child("x"), Err(NsError::PermissionDenied { .. })));
    }

    #[test]
    fn leaf_write_modes() {
        let leaf = Node::leaf("f", Permissions::default_file(), at(0));
        leaf.write(b"hello", WriteMode::Overwrite, at(1)).unwrap();
        leaf.write(b"world", WriteMode::Append, at(2)).unwrap();
        assert_eq!(leaf.read().unwrap(), b"helloworld");
        assert_eq!(leaf.size(), 10);
        assert_eq!(leaf.modified(), at(2));
        assert_eq!(leaf.created(), at(0));

        leaf.write(b"x", WriteMode::Overwrite, at(3)).unwrap();
        assert_eq!(leaf.read().unwrap(), b"x");
    }

    #[test]
    fn leaf_capabilities_are_checked() {
        let leaf = Node::leaf("f", Permissions::from_mode(0o444), at(0));
        let err = leaf.write(b"x", WriteMode::Append, at(1)).unwrap_err();
        assert!(matches!(err, NsError::PermissionDenied { operation: "write", .. }));
        assert_eq!(leaf.modified(), at(0));

        leaf.set_permissions(Permissions::from_mode(0o200), at(2));
        assert!(matches!(leaf.read(), Err(NsError::PermissionDenied { .. })));
        leaf.write(b"x", WriteMode::Append, at(3)).unwrap();
    }

    #[test]
    fn check_listable_matches_list_children() {
        let dir = root();
        let leaf = Node::leaf("f", Permissions::default_file(), at(0));
        let hidden = Node::container("h", Permissions::from_mode(0o300), at(0));
        assert!(dir.check_listable().is_ok());
        assert!(matches!(leaf.check_listable(), Err(NsError::NotADirectory { .. })));
        assert!(matches!(
            hidden.check_listable(),
            Err(NsError::PermissionDenied { operation: "list", .. })
        ));
    }

    #[test]
    fn kind_mismatches() {
        let dir = root();
        let leaf = Node::leaf("f", Permissions::default_file(), at(0));
        assert!(matches!(dir.read(), Err(NsError::IsADirectory { .. })));
        assert!(matches!(leaf.get_child("x"), Err(NsError::NotADirectory { .. })));
    }

    #[test]
    fn path_follows_parent_chain() {
        let root = root();
        let a = Node::container("a", Permissions::default_dir(), at(0));
        let b = Node::leaf("b.txt", Permissions::default_file(), at(0));
        root.add_child(Arc::clone(&a), at(0)).unwrap();
        a.add_child(Arc::clone(&b), at(0)).unwrap();

        assert_eq!(root.path(), "/");
        assert_eq!(b.path(), "/a/b.txt");

        a.remove_child("b.txt", at(1)).unwrap();
        assert_eq!(b.path(), "/b.txt");
    }

    #[test]
    fn dropping_root_frees_children() {
        let root = root();
        let child = Node::leaf("f", Permissions::default_file(), at(0));
        let weak = Arc::downgrade(&child);
        root.add_child(child, at(0)).unwrap();
        drop(root);
        assert!(weak.upgrade().is_none());
    }
}
