//! Injected time and identifier capabilities.
//!
//! Handlers never call `Utc::now()` or `Uuid::new_v4()` directly; they go
//! through the [`Clock`] and [`IdGen`] held in application state. Production
//! uses [`SystemClock`] and [`RandomIds`]; tests use [`FixedClock`] and
//! [`SequentialIds`] to make created/updated timestamps and identifiers
//! deterministic.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Source of "now" for created/updated/deleted timestamps.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Source of fresh entity identifiers.
pub trait IdGen: Send + Sync {
    /// A new unique identifier.
    fn new_id(&self) -> Uuid;
}

/// Production clock reading the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Production identifier source generating random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdGen for RandomIds {
    fn new_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Test clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Test identifier source handing out 1, 2, 3, ... as UUIDs.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl IdGen for SequentialIds {
    fn new_id(&self) -> Uuid {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        Uuid::from_u128(u128::from(n))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids_are_distinct_and_ordered() {
        let ids = SequentialIds::default();
        let a = ids.new_id();
        let b = ids.new_id();
        assert_ne!(a, b);
        assert_eq!(a, Uuid::from_u128(1));
        assert_eq!(b, Uuid::from_u128(2));
    }

    #[test]
    fn test_fixed_clock_is_fixed() {
        let instant = "2026-08-06T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let clock = FixedClock(instant);
        assert_eq!(clock.now(), instant);
        assert_eq!(clock.now(), instant);
    }
}
