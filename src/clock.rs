//! Injectable time source for node timestamps.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of creation and modification timestamps.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the namespace calls `now` from
/// whichever thread performs the mutation.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current time.
    fn now(&self) -> SystemTime;
}

/// Wall clock backed by [`SystemTime::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Deterministic clock for tests. Starts at the Unix epoch and only moves
/// when told to.
///
/// ```rust
/// use pathspace::{Clock, ManualClock};
/// use std::time::{Duration, UNIX_EPOCH};
///
/// let clock = ManualClock::new();
/// clock.advance(Duration::from_secs(10));
/// assert_eq!(clock.now(), UNIX_EPOCH + Duration::from_secs(10));
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    nanos: AtomicU64,
}

impl ManualClock {
    /// Clock reading the Unix epoch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock reading `UNIX_EPOCH + offset`.
    pub fn starting_at(offset: Duration) -> Self {
        let clock = Self::new();
        clock.set(offset);
        clock
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(duration_nanos(by), Ordering::SeqCst);
    }

    /// Jump to `UNIX_EPOCH + offset`.
    pub fn set(&self, offset: Duration) {
        self.nanos.store(duration_nanos(offset), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

fn duration_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}
