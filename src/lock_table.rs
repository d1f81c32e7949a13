//! # Path Lock Table
//!
//! Per-path reader/writer locks with deadlock-free multi-path acquisition.
//!
//! ## Overview
//!
//! The table maps a canonical path string to a reader/writer lock, created
//! lazily the first time any operation asks for that path:
//!
//! - **Shared**: any number of holders, excludes exclusive holders
//! - **Exclusive**: a single holder, excludes everyone else
//!
//! Locks are scoped. The closure passed to `with_*` runs while the locks are
//! held, and they are released on every exit path, including unwinding.
//!
//! ## Ordered acquisition
//!
//! [`PathLockTable::with_locks`] collects its requests into a set sorted by
//! byte-wise string order, merges duplicates (exclusive wins), acquires in
//! ascending order and releases in descending order. Every multi-path
//! caller goes through this helper, so all actors request overlapping locks
//! in the same total order and a circular wait cannot form.
//!
//! ```text
//! move /b -> /a      requests {/, /a, /b}  acquires / then /a then /b
//! move /a -> /b      requests {/, /a, /b}  acquires / then /a then /b
//! ```
//!
//! ## Eviction
//!
//! Under [`LockEviction::OnRelease`] an entry is dropped as soon as its last
//! holder or waiter leaves. Under [`LockEviction::Manual`] entries stay until
//! [`PathLockTable::sweep`] removes the idle ones.
//!
//! ## Example
//!
//! ```rust
//! use pathspace::{LockMode, PathLockTable};
//!
//! let table = PathLockTable::new();
//! let total = table.with_locks(
//!     [("/b", LockMode::Exclusive), ("/a", LockMode::Shared)],
//!     || 40 + 2,
//! );
//! assert_eq!(total, 42);
//! assert!(table.is_empty());
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};

use tracing::trace;

use crate::config::LockEviction;
use crate::sync;

/// Mode of a single path lock.
///
/// Ordered so that `Exclusive > Shared`; merging requests keeps the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LockMode {
    /// Shared lock - multiple readers allowed.
    Shared,
    /// Exclusive lock - single writer only.
    Exclusive,
}

type PathLock = Arc<RwLock<()>>;

/// Registry of per-path reader/writer locks.
///
/// # Thread Safety
///
/// The registry itself is guarded by a short-lived mutex that is never held
/// while waiting on a path lock.
#[derive(Debug, Default)]
pub struct PathLockTable {
    entries: Mutex<HashMap<String, PathLock>>,
    eviction: LockEviction,
}

impl PathLockTable {
    /// Empty table with [`LockEviction::OnRelease`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty table with the given eviction policy.
    pub fn with_eviction(eviction: LockEviction) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            eviction,
        }
    }

    /// Eviction policy in effect.
    pub fn eviction(&self) -> LockEviction {
        self.eviction
    }

    /// Run `f` holding a shared lock on `path`.
    pub fn with_read_lock<R>(&self, path: &str, f: impl FnOnce() -> R) -> R {
        self.with_locks([(path, LockMode::Shared)], f)
    }

    /// Run `f` holding an exclusive lock on `path`.
    pub fn with_write_lock<R>(&self, path: &str, f: impl FnOnce() -> R) -> R {
        self.with_locks([(path, LockMode::Exclusive)], f)
    }

    /// Run `f` holding exclusive locks on every path in `paths`.
    pub fn with_write_locks<I, P, R>(&self, paths: I, f: impl FnOnce() -> R) -> R
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        self.with_locks(paths.into_iter().map(|p| (p, LockMode::Exclusive)), f)
    }

    /// Run `f` holding shared locks on every path in `paths`.
    pub fn with_read_locks<I, P, R>(&self, paths: I, f: impl FnOnce() -> R) -> R
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        self.with_locks(paths.into_iter().map(|p| (p, LockMode::Shared)), f)
    }

    /// Run `f` holding every requested lock.
    ///
    /// Requests are de-duplicated and sorted before any lock is taken; a path
    /// requested in both modes is locked exclusively. Blocks until all locks
    /// are held. There is no timeout.
    pub fn with_locks<I, P, R>(&self, requests: I, f: impl FnOnce() -> R) -> R
    where
        I: IntoIterator<Item = (P, LockMode)>,
        P: AsRef<str>,
    {
        let plan = merge(requests);
        let checkout = self.checkout(plan);

        let mut held = LifoGuards::with_capacity(checkout.slots.len());
        for (path, lock, mode) in &checkout.slots {
            trace!(path = %path, ?mode, "acquiring path lock");
            held.push(Held::acquire(lock, *mode));
        }

        // `held` drops before `checkout`, newest lock first, even on unwind.
        f()
    }

    /// Like [`with_locks`](Self::with_locks) but never blocks.
    ///
    /// Returns `None` without running `f` if any lock is currently
    /// unavailable; locks taken so far are released first.
    pub fn try_with_locks<I, P, R>(&self, requests: I, f: impl FnOnce() -> R) -> Option<R>
    where
        I: IntoIterator<Item = (P, LockMode)>,
        P: AsRef<str>,
    {
        let plan = merge(requests);
        let checkout = self.checkout(plan);

        let mut held = LifoGuards::with_capacity(checkout.slots.len());
        for (path, lock, mode) in &checkout.slots {
            match Held::try_acquire(lock, *mode) {
                Some(guard) => held.push(guard),
                None => {
                    trace!(path = %path, ?mode, "path lock busy, backing off");
                    return None;
                }
            }
        }

        Some(f())
    }

    /// Drop every entry that has no holder or waiter. Returns how many went.
    pub fn sweep(&self) -> usize {
        let mut entries = sync::lock(&self.entries);
        let before = entries.len();
        entries.retain(|_, lock| Arc::strong_count(lock) > 1);
        let removed = before - entries.len();
        if removed > 0 {
            trace!(removed, "swept idle path locks");
        }
        removed
    }

    /// Number of paths currently tracked.
    pub fn len(&self) -> usize {
        sync::lock(&self.entries).len()
    }

    /// Returns `true` if no path is tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `path` has an entry.
    pub fn is_tracked(&self, path: &str) -> bool {
        sync::lock(&self.entries).contains_key(path)
    }

    fn checkout(&self, plan: BTreeMap<String, LockMode>) -> Checkout<'_> {
        let mut entries = sync::lock(&self.entries);
        let slots = plan
            .into_iter()
            .map(|(path, mode)| {
                let lock = Arc::clone(entries.entry(path.clone()).or_default());
                (path, lock, mode)
            })
            .collect();
        Checkout { table: self, slots }
    }
}

/// Sorted, de-duplicated lock plan.
pub(crate) fn merge<I, P>(requests: I) -> BTreeMap<String, LockMode>
where
    I: IntoIterator<Item = (P, LockMode)>,
    P: AsRef<str>,
{
    let mut plan: BTreeMap<String, LockMode> = BTreeMap::new();
    for (path, mode) in requests {
        let slot = plan.entry(path.as_ref().to_string()).or_insert(mode);
        *slot = (*slot).max(mode);
    }
    plan
}

/// Guards kept in acquisition order and dropped in reverse.
struct LifoGuards<G>(Vec<G>);

impl<G> LifoGuards<G> {
    fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    fn push(&mut self, guard: G) {
        self.0.push(guard);
    }
}

impl<G> Drop for LifoGuards<G> {
    fn drop(&mut self) {
        while let Some(guard) = self.0.pop() {
            drop(guard);
        }
    }
}

/// A held path lock. Dropping it releases the lock.
enum Held<'a> {
    Shared { _guard: RwLockReadGuard<'a, ()> },
    Exclusive { _guard: RwLockWriteGuard<'a, ()> },
}

impl<'a> Held<'a> {
    fn acquire(lock: &'a RwLock<()>, mode: LockMode) -> Self {
        match mode {
            LockMode::Shared => Held::Shared { _guard: sync::read(lock) },
            LockMode::Exclusive => Held::Exclusive { _guard: sync::write(lock) },
        }
    }

    fn try_acquire(lock: &'a RwLock<()>, mode: LockMode) -> Option<Self> {
        match mode {
            LockMode::Shared => match lock.try_read() {
                Ok(guard) => Some(Held::Shared { _guard: guard }),
                Err(TryLockError::Poisoned(e)) => Some(Held::Shared { _guard: e.into_inner() }),
                Err(TryLockError::WouldBlock) => None,
            },
            LockMode::Exclusive => match lock.try_write() {
                Ok(guard) => Some(Held::Exclusive { _guard: guard }),
                Err(TryLockError::Poisoned(e)) => {
                    Some(Held::Exclusive { _guard: e.into_inner() })
                }
                Err(TryLockError::WouldBlock) => None,
            },
        }
    }
}

/// Handles to the table entries an operation uses. Outlives the guards that
/// borrow from it; on drop, evicts entries nobody else references.
struct Checkout<'t> {
    table: &'t PathLockTable,
    slots: Vec<(String, PathLock, LockMode)>,
}

impl Drop for Checkout<'_> {
    fn drop(&mut self) {
        let slots = std::mem::take(&mut self.slots);
        if self.table.eviction != LockEviction::OnRelease {
            return;
        }
        // Handles are only cloned under this mutex, so a count of one seen
        // here means no other holder or waiter exists.
        let mut entries = sync::lock(&self.table.entries);
        for (path, lock, _) in slots.into_iter().rev() {
            drop(lock);
            if entries
                .get(&path)
                .is_some_and(|entry| Arc::strong_count(entry) == 1)
            {
                entries.remove(&path);
                trace!(path = %path, "evicted idle path lock");
            }
        }
    }
}
