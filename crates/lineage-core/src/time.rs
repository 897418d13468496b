//! Time primitives for Lineage
//!
//! Event instances carry the moment they were dispatched. The realm reads that
//! moment through a [`Clock`] so tests can pin it.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

/// Wall-clock timestamp, microseconds since the UNIX epoch
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    #[inline]
    pub fn from_micros(micros: i64) -> Self {
        Timestamp(micros)
    }

    #[inline]
    pub fn from_millis(millis: i64) -> Self {
        Timestamp(millis * 1000)
    }

    #[inline]
    pub fn as_micros(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn as_millis(self) -> i64 {
        self.0 / 1000
    }

    /// Current system time. Clocks set before the epoch read as zero.
    pub fn now() -> Self {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => Timestamp(elapsed.as_micros() as i64),
            Err(_) => Timestamp::ZERO,
        }
    }

    #[inline]
    pub fn saturating_add(self, duration: Duration) -> Self {
        Timestamp(self.0.saturating_add(duration.as_micros() as i64))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}us)", self.0)
    }
}

/// Source of dispatch timestamps
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Clock backed by `SystemTime`
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Manually driven clock.
///
/// Clones share the same reading, so a test can keep one handle and hand
/// another to a realm.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    value: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        ManualClock {
            value: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, value: Timestamp) {
        *self.value.lock() = value;
    }

    pub fn advance(&self, by: Duration) -> Timestamp {
        let mut value = self.value.lock();
        *value = value.saturating_add(by);
        *value
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.value.lock()
    }
}
