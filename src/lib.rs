//! # pathspace
//!
//! A thread-safe, in-memory **hierarchical namespace**: containers and leaves
//! addressed by `/`-separated paths, shared across threads, with
//! deadlock-free atomic multi-path operations.
//!
//! ---
//!
//! ## Quick Start
//!
//! ```rust
//! use pathspace::{Namespace, NsError, WriteMode};
//!
//! fn main() -> Result<(), NsError> {
//!     let ns = Namespace::new();
//!     ns.create_directory("/a/b/c", true)?;
//!     ns.create_file("/f.txt")?;
//!     ns.write("/f.txt", b"hello", WriteMode::Overwrite)?;
//!     ns.write("/f.txt", b"world", WriteMode::Append)?;
//!     assert_eq!(ns.read_to_string("/f.txt")?, "helloworld");
//!
//!     ns.rename("/f.txt", "/a/g.txt")?;
//!     assert!(!ns.exists("/f.txt")?);
//!     assert_eq!(ns.get_size("/a")?, 10);
//!     Ok(())
//! }
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Namespace`] | The service every caller uses |
//! | [`PathLockTable`] | Per-path reader/writer locks, ordered multi-lock |
//! | [`Node`] | Tree node, container or leaf |
//! | [`NsError`] | Error taxonomy with path context |
//! | [`Metadata`] / [`DirEntry`] | Results of `stat` / `list` |
//! | [`Permissions`] | Capability descriptor (`can_read` / `can_write`) |
//! | [`NamespaceConfig`] | Clock, lock eviction, name policy, default permissions |
//!
//! ---
//!
//! ## Layers
//!
//! ```text
//! Namespace ──▶ path (normalize/resolve)
//!           ──▶ PathLockTable (sorted acquisition)
//!           ──▶ Node tree (+ visit traversals)
//! ```
//!
//! ---
//!
//! ## Error Handling
//!
//! All operations return `Result<T, NsError>`. Every check runs before the
//! first mutation, so a failed call leaves the tree exactly as it was.
//!
//! ```rust
//! use pathspace::{Namespace, NsError};
//!
//! let ns = Namespace::new();
//! ns.create_directory("/d", false).unwrap();
//! ns.create_file("/d/x").unwrap();
//!
//! let err = ns.delete("/d", false).unwrap_err();
//! assert!(matches!(err, NsError::NotEmpty { .. }));
//! assert!(ns.delete("/d", true).unwrap());
//! assert!(!ns.delete("/d", true).unwrap());
//! ```
//!
//! ---
//!
//! ## Thread Safety
//!
//! `Namespace` is `Send + Sync` and every method takes `&self`. Blocking on
//! a contended path lock is not an error; there is no timeout and no
//! internal retry.
//!
//! ---
//!
//! ## Logging
//!
//! Mutations emit `tracing` events at `debug`, lock traffic at `trace`.
//! The crate never installs a subscriber.
//!
//! ---
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | Serialization for [`Metadata`], [`DirEntry`], [`Permissions`], config; JSON leaf helpers |

// Private modules
mod clock;
mod config;
mod error;
mod ext;
mod lock_table;
mod namespace;
mod node;
mod sync;
mod types;

// Public modules
pub mod path;
pub mod visit;

// Public re-exports - error types
pub use error::NsError;

// Public re-exports - core types
pub use types::{DirEntry, EntryKind, Metadata, Permissions, WriteMode};

// Public re-exports - tree
pub use node::{Node, NodeKind};

// Public re-exports - locking
pub use lock_table::{LockMode, PathLockTable};

// Public re-exports - service and configuration
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{LockEviction, NamespaceConfig};
pub use namespace::Namespace;
pub use path::NamePolicy;
