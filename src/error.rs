//! Error types for the namespace.

/// Namespace error type with contextual variants.
///
/// Every variant names the path that caused the failure, and the operation
/// where that helps the caller. A failing operation never leaves the tree
/// partially modified.
///
/// # Examples
///
/// ```rust
/// use pathspace::NsError;
///
/// let err = NsError::NotFound { path: "/missing".into() };
/// assert_eq!(err.to_string(), "not found: /missing");
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NsError {
    // Path Errors
    /// Malformed path or traversal above the root.
    #[error("invalid path: {path:?} ({reason})")]
    InvalidPath {
        /// The rejected input.
        path: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Path does not resolve to a node.
    #[error("not found: {path}")]
    NotFound {
        /// The path that was not found.
        path: String,
    },

    /// Create or move target is already occupied.
    #[error("{operation}: already exists: {path}")]
    AlreadyExists {
        /// The occupied path.
        path: String,
        /// The operation that failed.
        operation: &'static str,
    },

    // Kind Mismatch
    /// Expected a container but found a leaf.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// The path that is not a container.
        path: String,
    },

    /// Expected a leaf but found a container.
    #[error("is a directory: {path}")]
    IsADirectory {
        /// The path that is a container.
        path: String,
    },

    // Access Errors
    /// Capability check failed.
    #[error("{operation}: permission denied: {path}")]
    PermissionDenied {
        /// The node whose capability refused access.
        path: String,
        /// The operation that was denied.
        operation: &'static str,
    },

    // Structural Errors
    /// Non-recursive delete of a non-empty container.
    #[error("directory not empty: {path}")]
    NotEmpty {
        /// The non-empty container.
        path: String,
    },

    /// Structurally forbidden operation (root removal, move into own subtree).
    #[error("invalid operation on {path}: {reason}")]
    InvalidOperation {
        /// The path the operation targeted.
        path: String,
        /// What made it invalid.
        reason: &'static str,
    },

    // Data Errors
    /// Leaf contents could not be interpreted as requested.
    #[error("invalid data: {path} ({details})")]
    InvalidData {
        /// The leaf with invalid data.
        path: String,
        /// Details about the invalid data.
        details: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),
}

impl NsError {
    pub(crate) fn invalid_path(path: impl Into<String>, reason: &'static str) -> Self {
        NsError::InvalidPath {
            path: path.into(),
            reason,
        }
    }

    pub(crate) fn not_found(path: impl Into<String>) -> Self {
        NsError::NotFound { path: path.into() }
    }

    pub(crate) fn denied(path: impl Into<String>, operation: &'static str) -> Self {
        NsError::PermissionDenied {
            path: path.into(),
            operation,
        }
    }

    /// Returns `true` for [`NsError::NotFound`].
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, NsError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = NsError::NotFound {
            path: "/missing".into(),
        };
        assert_eq!(err.to_string(), "not found: /missing");
    }

    #[test]
    fn already_exists_display() {
        let err = NsError::AlreadyExists {
            path: "/exists".into(),
            operation: "create",
        };
        assert_eq!(err.to_string(), "create: already exists: /exists");
    }

    #[test]
    fn permission_denied_display() {
        let err = NsError::denied("/secret", "read");
        assert_eq!(err.to_string(), "read: permission denied: /secret");
    }

    #[test]
    fn invalid_path_quotes_input() {
        let err = NsError::invalid_path("/a\0b", "control character in component");
        let text = err.to_string();
        assert!(text.starts_with("invalid path: \"/a\\0b\""));
        assert!(text.contains("control character"));
    }

    #[test]
    fn is_not_found_only_matches_not_found() {
        assert!(NsError::not_found("/x").is_not_found());
        assert!(!NsError::NotEmpty { path: "/x".into() }.is_not_found());
    }

    #[test]
    fn errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<NsError>();
    }
}
