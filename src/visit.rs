//! Cross-cutting traversals over the node tree.
//!
//! Each function branches on [`NodeKind`] and recurses into container
//! children, so concerns like recursive size or permission propagation live
//! here instead of on [`Node`].

use std::sync::Arc;
use std::time::SystemTime;

use crate::node::{Node, NodeKind};
use crate::path;
use crate::{NsError, Permissions};

/// Pre-order walk. `visitor` gets each node and its depth below `node`.
///
/// Ignores capabilities; callers decide what a visit may expose.
pub fn walk<F>(node: &Arc<Node>, visitor: &mut F)
where
    F: FnMut(&Arc<Node>, usize),
{
    walk_at(node, 0, visitor);
}

fn walk_at<F>(node: &Arc<Node>, depth: usize, visitor: &mut F)
where
    F: FnMut(&Arc<Node>, usize),
{
    visitor(node, depth);
    if let NodeKind::Container(_) = node.kind() {
        for child in node.children_unchecked() {
            walk_at(&child, depth + 1, visitor);
        }
    }
}

/// Leaf: buffer length. Container: sum over descendant leaves.
pub fn size_of(node: &Node) -> u64 {
    match node.kind() {
        NodeKind::Leaf(_) => node.content_len(),
        NodeKind::Container(_) => node
            .children_unchecked()
            .iter()
            .map(|child| size_of(child))
            .sum(),
    }
}

/// Number of `(containers, leaves)` strictly below `node`.
pub fn count_entries(node: &Arc<Node>) -> (usize, usize) {
    let mut containers = 0;
    let mut leaves = 0;
    walk(node, &mut |n, depth| {
        if depth == 0 {
            return;
        }
        match n.kind() {
            NodeKind::Container(_) => containers += 1,
            NodeKind::Leaf(_) => leaves += 1,
        }
    });
    (containers, leaves)
}

/// Set `permissions` on `node` and everything below it.
pub fn apply_permissions(node: &Arc<Node>, permissions: Permissions, now: SystemTime) {
    walk(node, &mut |n, _| n.set_permissions(permissions, now));
}

/// Canonical paths of every node strictly below `node`, pre-order.
///
/// `base` is the canonical path of `node` itself.
pub fn descendant_paths(node: &Arc<Node>, base: &str) -> Vec<String> {
    let mut out = Vec::new();
    collect_paths(node, base, &mut out);
    out
}

fn collect_paths(node: &Node, base: &str, out: &mut Vec<String>) {
    if let NodeKind::Container(_) = node.kind() {
        for child in node.children_unchecked() {
            let child_path = path::child_of(base, &child.name());
            out.push(child_path.clone());
            collect_paths(&child, &child_path, out);
        }
    }
}

/// Detached deep copy of `node` named `name`, stamped `now`.
///
/// Reads go through the capability-checked accessors, so an unreadable node
/// anywhere in the subtree fails the whole copy.
pub fn duplicate(node: &Node, name: &str, now: SystemTime) -> Result<Arc<Node>, NsError> {
    match node.kind() {
        NodeKind::Leaf(_) => Ok(Node::leaf_with(name, node.permissions(), now, node.read()?)),
        NodeKind::Container(_) => {
            // Writable while filling; the source capability is applied last.
            let copy = Node::container(name, Permissions::from_mode(0o700), now);
            for child in node.list_children()? {
                let child_copy = duplicate(&child, &child.name(), now)?;
                copy.add_child(child_copy, now)?;
            }
            copy.set_permissions(node.permissions(), now);
            Ok(copy)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WriteMode;
    use std::time::{Duration, UNIX_EPOCH};

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    /// ```text
    /// /
    /// ├── a/
    /// │   ├── x  (3 bytes)
    /// │   └── b/
    /// │       └── y  (4 bytes)
    /// └── z  (5 bytes)
    /// ```
    fn sample() -> Arc<Node> {
        let root = Node::container("", Permissions::default_dir(), at(0));
        let a = Node::container("a", Permissions::default_dir(), at(0));
        let b = Node::container("b", Permissions::default_dir(), at(0));
        let x = Node::leaf_with("x", Permissions::default_file(), at(0), b"xxx".to_vec());
        let y = Node::leaf_with("y", Permissions::default_file(), at(0), b"yyyy".to_vec());
        let z = Node::leaf_with("z", Permissions::default_file(), at(0), b"zzzzz".to_vec());
        b.add_child(y, at(0)).unwrap();
        a.add_child(x, at(0)).unwrap();
        a.add_child(b, at(0)).unwrap();
        root.add_child(a, at(0)).unwrap();
        root.add_child(z, at(0)).unwrap();
        root
    }

    #[test]
    fn size_sums_descendant_leaves() {
        let root = sample();
        assert_eq!(size_of(&root), 12);
        let a = root.get_child("a").unwrap().unwrap();
        assert_eq!(size_of(&a), 7);
    }

    #[test]
    fn walk_is_preorder_with_depth() {
        let root = sample();
        let mut seen = Vec::new();
        walk(&root, &mut |n, depth| seen.push((n.name(), depth)));
        let expected = [("", 0), ("a", 1), ("b", 2), ("y", 3), ("x", 2), ("z", 1)];
        let expected: Vec<_> = expected.iter().map(|(n, d)| (n.to_string(), *d)).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn counts_exclude_start_node() {
        assert_eq!(count_entries(&sample()), (2, 3));
    }

    #[test]
    fn descendant_paths_are_canonical() {
        let root = sample();
        assert_eq!(
            descendant_paths(&root, "/"),
            vec!["/a", "/a/b", "/a/b/y", "/a/x", "/z"]
        );
    }

    #[test]
    fn permissions_propagate_to_subtree() {
        let root = sample();
        let a = root.get_child("a").unwrap().unwrap();
        apply_permissions(&a, Permissions::from_mode(0o700), at(9));

        let mut modes = Vec::new();
        walk(&a, &mut |n, _| modes.push(n.permissions().mode()));
        assert!(modes.iter().all(|m| *m == 0o700));
        assert_eq!(root.permissions(), Permissions::default_dir());
        assert_eq!(a.modified(), at(9));
    }

    #[test]
    fn duplicate_is_deep_and_detached() {
        let root = sample();
        let a = root.get_child("a").unwrap().unwrap();
        let copy = duplicate(&a, "a2", at(4)).unwrap();

        assert!(copy.parent().is_none());
        assert_eq!(copy.name(), "a2");
        assert_eq!(size_of(&copy), 7);

        // Mutating the copy leaves the original alone.
        let x2 = copy.get_child("x").unwrap().unwrap();
        x2.write(b"changed", WriteMode::Overwrite, at(5)).unwrap();
        let x = a.get_child("x").unwrap().unwrap();
        assert_eq!(x.read().unwrap(), b"xxx");
    }

    #[test]
    fn duplicate_fails_on_unreadable_leaf() {
        let root = sample();
        let z = root.get_child("z").unwrap().unwrap();
        z.set_permissions(Permissions::from_mode(0o200), at(1));
        assert!(matches!(
            duplicate(&root, "copy", at(2)),
            Err(NsError::PermissionDenied { .. })
        ));
    }
}
