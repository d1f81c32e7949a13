//! # Convenience Queries
//!
//! Helpers built only from the public [`Namespace`] operations.
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`is_file`](Namespace::is_file) | Check if path is a leaf |
//! | [`is_dir`](Namespace::is_dir) | Check if path is a container |
//! | [`file_size`](Namespace::file_size) | Size of a leaf |
//!
//! ## JSON Support (Feature-Gated)
//!
//! With the `serde` feature enabled, `read_json` and `write_json` store
//! values as pretty-printed JSON leaves.
//!
//! ```toml
//! [dependencies]
//! pathspace = { version = "0.1", features = ["serde"] }
//! ```

use crate::{Namespace, NsError};

impl Namespace {
    /// Check if the path points to a leaf.
    ///
    /// Returns `Ok(false)` if the path doesn't exist (not an error).
    ///
    /// ```rust
    /// use pathspace::Namespace;
    ///
    /// let ns = Namespace::new();
    /// ns.create_file("/a.txt").unwrap();
    /// assert!(ns.is_file("/a.txt").unwrap());
    /// assert!(!ns.is_file("/missing").unwrap());
    /// ```
    pub fn is_file(&self, path: &str) -> Result<bool, NsError> {
        match self.stat(path) {
            Ok(m) => Ok(m.is_file()),
            Err(NsError::NotFound { .. } | NsError::NotADirectory { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check if the path points to a container.
    ///
    /// Returns `Ok(false)` if the path doesn't exist (not an error).
    pub fn is_dir(&self, path: &str) -> Result<bool, NsError> {
        match self.stat(path) {
            Ok(m) => Ok(m.is_dir()),
            Err(NsError::NotFound { .. } | NsError::NotADirectory { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Size of a leaf in bytes.
    ///
    /// # Errors
    ///
    /// - [`NsError::NotFound`] if the path doesn't exist
    /// - [`NsError::IsADirectory`] if it names a container; use
    ///   [`get_size`](Namespace::get_size) for recursive sizes
    pub fn file_size(&self, path: &str) -> Result<u64, NsError> {
        let meta = self.stat(path)?;
        if meta.is_dir() {
            return Err(NsError::IsADirectory { path: meta.path });
        }
        Ok(meta.size)
    }
}

// =============================================================================
// JSON Support (Feature-Gated)
// =============================================================================

#[cfg(feature = "serde")]
mod json {
    use super::*;
    use serde::{Serialize, de::DeserializeOwned};

    impl Namespace {
        /// Read a leaf and deserialize it as JSON.
        ///
        /// # Errors
        ///
        /// - `NsError::NotFound`: Leaf doesn't exist
        /// - `NsError::InvalidData`: Leaf isn't valid UTF-8
        /// - `NsError::Deserialization`: JSON parsing failed
        pub fn read_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, NsError> {
            let data = self.read_to_string(path)?;
            serde_json::from_str(&data).map_err(|e| NsError::Deserialization(e.to_string()))
        }

        /// Serialize a value and store it as JSON, creating the leaf if needed.
        ///
        /// Uses pretty-printing with 2-space indentation.
        ///
        /// # Errors
        ///
        /// - `NsError::Serialization`: JSON serialization failed
        /// - Other `NsError` variants from the underlying [`put`](Namespace::put) call
        pub fn write_json<T: Serialize>(&self, path: &str, value: &T) -> Result<(), NsError> {
            let json = serde_json::to_string_pretty(value)
                .map_err(|e| NsError::Serialization(e.to_string()))?;
            self.put(path, json.as_bytes())
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Namespace, NsError, WriteMode};

    fn sample() -> Namespace {
        let ns = Namespace::new();
        ns.create_directory("/dir", false).unwrap();
        ns.create_file("/dir/file").unwrap();
        ns.write("/dir/file", b"12345", WriteMode::Overwrite).unwrap();
        ns
    }

    #[test]
    fn is_file_and_is_dir() {
        let ns = sample();
        assert!(ns.is_file("/dir/file").unwrap());
        assert!(!ns.is_dir("/dir/file").unwrap());
        assert!(ns.is_dir("/dir").unwrap());
        assert!(!ns.is_file("/dir").unwrap());
        assert!(!ns.is_file("/missing").unwrap());
        assert!(!ns.is_dir("/dir/file/below").unwrap());
    }

    #[test]
    fn file_size_only_for_leaves() {
        let ns = sample();
        assert_eq!(ns.file_size("/dir/file").unwrap(), 5);
        assert!(matches!(ns.file_size("/dir"), Err(NsError::IsADirectory { .. })));
        assert!(matches!(ns.file_size("/nope"), Err(NsError::NotFound { .. })));
    }

    #[test]
    fn invalid_path_is_still_an_error() {
        let ns = sample();
        assert!(matches!(ns.is_file("/.."), Err(NsError::InvalidPath { .. })));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_round_trip() {
        let ns = sample();
        let value = serde_json::json!({ "name": "pathspace", "items": [1, 2, 3] });
        ns.write_json("/dir/config.json", &value).unwrap();
        let back: serde_json::Value = ns.read_json("/dir/config.json").unwrap();
        assert_eq!(back, value);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn read_json_reports_parse_errors() {
        let ns = sample();
        ns.put("/dir/bad.json", b"{ not json").unwrap();
        assert!(matches!(
            ns.read_json::<serde_json::Value>("/dir/bad.json"),
            Err(NsError::Deserialization(_))
        ));
    }
}
