//! Memory accounting for query-local data structures.
//!
//! Hash maps, hull sets and output tables built during a single operator
//! call account their growth against a shared [`MemoryTracker`]. When a
//! limit is configured, exceeding it fails the reservation and the operator
//! call aborts with no partial result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// A tracked allocation would exceed the configured memory limit.
#[derive(Debug, Clone, Error)]
#[error("Memory limit exceeded: requested {requested} bytes with {used} of {limit} in use")]
pub struct MemoryExceededError {
    pub requested: u64,
    pub used: u64,
    pub limit: u64,
}

#[derive(Debug)]
struct TrackerInner {
    used: AtomicU64,
    limit: u64,
}

/// Shared byte counter with an optional global limit.
///
/// When unlimited, this is a single `None` pointer (cheap to clone and pass
/// around, nothing is counted).
#[derive(Debug, Clone, Default)]
pub struct MemoryTracker(Option<Arc<TrackerInner>>);

impl MemoryTracker {
    /// A tracker that never fails and counts nothing.
    #[inline]
    pub fn unlimited() -> Self {
        Self(None)
    }

    /// A tracker enforcing a global limit in bytes.
    pub fn with_limit(limit: u64) -> Self {
        Self(Some(Arc::new(TrackerInner {
            used: AtomicU64::new(0),
            limit,
        })))
    }

    #[inline]
    pub fn is_limited(&self) -> bool {
        self.0.is_some()
    }

    /// Bytes currently reserved. Always 0 for an unlimited tracker.
    pub fn used(&self) -> u64 {
        self.0
            .as_ref()
            .map(|i| i.used.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Reserve `bytes`, failing when the limit would be exceeded.
    #[inline]
    pub fn try_reserve(&self, bytes: u64) -> Result<(), MemoryExceededError> {
        let Some(inner) = &self.0 else {
            return Ok(());
        };

        let previous = inner.used.fetch_add(bytes, Ordering::Relaxed);
        if previous + bytes > inner.limit {
            inner.used.fetch_sub(bytes, Ordering::Relaxed);
            return Err(MemoryExceededError {
                requested: bytes,
                used: previous,
                limit: inner.limit,
            });
        }
        Ok(())
    }

    /// Return previously reserved bytes to the pool.
    #[inline]
    pub fn release(&self, bytes: u64) {
        if let Some(inner) = &self.0 {
            inner.used.fetch_sub(bytes, Ordering::Relaxed);
        }
    }
}

/// RAII guard over a running reservation.
///
/// Grows incrementally as the owning structure grows and releases the whole
/// reservation on drop, so a failed operator call cannot leak accounted
/// bytes.
#[derive(Debug)]
pub struct MemoryReservation {
    tracker: MemoryTracker,
    bytes: u64,
}

impl MemoryReservation {
    pub fn new(tracker: MemoryTracker) -> Self {
        Self { tracker, bytes: 0 }
    }

    /// Reserve `bytes` more on top of the current reservation.
    #[inline]
    pub fn grow(&mut self, bytes: u64) -> Result<(), MemoryExceededError> {
        self.tracker.try_reserve(bytes)?;
        self.bytes += bytes;
        Ok(())
    }

    /// Total bytes held by this reservation.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

impl Drop for MemoryReservation {
    fn drop(&mut self) {
        self.tracker.release(self.bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_never_fails() {
        let tracker = MemoryTracker::unlimited();
        assert!(tracker.try_reserve(u64::MAX).is_ok());
        assert_eq!(tracker.used(), 0);
    }

    #[test]
    fn test_limit_enforced() {
        let tracker = MemoryTracker::with_limit(100);
        tracker.try_reserve(60).unwrap();
        tracker.try_reserve(40).unwrap();
        let err = tracker.try_reserve(1).unwrap_err();
        assert_eq!(err.limit, 100);
        // A failed reservation must not consume budget.
        assert_eq!(tracker.used(), 100);
        tracker.release(50);
        assert!(tracker.try_reserve(50).is_ok());
    }

    #[test]
    fn test_reservation_releases_on_drop() {
        let tracker = MemoryTracker::with_limit(64);
        {
            let mut reservation = MemoryReservation::new(tracker.clone());
            reservation.grow(48).unwrap();
            assert_eq!(tracker.used(), 48);
        }
        assert_eq!(tracker.used(), 0);
    }

    #[test]
    fn test_reservation_grow_failure_keeps_prior_bytes() {
        let tracker = MemoryTracker::with_limit(32);
        let mut reservation = MemoryReservation::new(tracker.clone());
        reservation.grow(24).unwrap();
        assert!(reservation.grow(16).is_err());
        assert_eq!(reservation.bytes(), 24);
        assert_eq!(tracker.used(), 24);
    }
}
