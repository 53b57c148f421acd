//! # Time Sources
//!
//! The ledger compares stored unlock times against "now", but it never
//! decides what "now" is. A [`Clock`] is injected at construction:
//!
//! - [`SystemClock`] reads the wall clock (`chrono::Utc::now`).
//! - [`ManualClock`] only moves when told to. Tests and scripted sessions
//!   use it to step over lock periods without sleeping.
//!
//! Clocks are shared behind `Arc<dyn Clock>`, so a `ManualClock` handle kept
//! by a test observes (and drives) the same instant the vault sees.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

/// A source of the current instant.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only advances when asked to.
///
/// Cloning yields another handle to the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl ManualClock {
    /// Starts the clock at `start`.
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(RwLock::new(start)),
        }
    }

    /// Starts the clock at the current wall-clock instant.
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// Moves the clock forward by `secs` seconds. Saturates at the largest
    /// representable instant.
    pub fn advance(&self, secs: u64) {
        let mut now = self.now.write();
        *now = offset_by_secs(*now, secs).unwrap_or(DateTime::<Utc>::MAX_UTC);
        tracing::debug!(secs, now = %*now, "manual clock advanced");
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}

/// Returns `start + secs`, or `None` if the result is not representable.
pub fn offset_by_secs(start: DateTime<Utc>, secs: u64) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(secs).ok()?;
    let delta = Duration::try_seconds(secs)?;
    start.checked_add_signed(delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn manual_clock_stands_still() {
        let clock = ManualClock::starting_at(epoch());
        assert_eq!(clock.now(), epoch());
        assert_eq!(clock.now(), epoch());
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::starting_at(epoch());
        clock.advance(90);
        assert_eq!(clock.now(), epoch() + Duration::seconds(90));
    }

    #[test]
    fn clones_share_the_same_instant() {
        let clock = ManualClock::starting_at(epoch());
        let handle = clock.clone();
        handle.advance(5);
        assert_eq!(clock.now(), epoch() + Duration::seconds(5));
    }

    #[test]
    fn manual_clock_saturates_instead_of_panicking() {
        let clock = ManualClock::starting_at(epoch());
        clock.advance(u64::MAX);
        assert_eq!(clock.now(), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn offset_rejects_unrepresentable_durations() {
        assert!(offset_by_secs(epoch(), u64::MAX).is_none());
        assert_eq!(offset_by_secs(epoch(), 0), Some(epoch()));
    }

    #[test]
    fn system_clock_is_close_to_now() {
        let before = Utc::now();
        let seen = SystemClock.now();
        assert!(seen >= before);
    }
}
