//! A cascade-tripped latch: once a cascading failure fires MASTER_RESTART,
//! the detector itself latches closed and refuses to fire again until an
//! operator manually resets it, even if further FATAL events arrive.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use tracing::{error, info, warn};

pub struct CascadeLatch {
    tripped: AtomicBool,
    tripped_at_ms: AtomicI64,
}

impl Default for CascadeLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl CascadeLatch {
    pub fn new() -> Self {
        Self {
            tripped: AtomicBool::new(false),
            tripped_at_ms: AtomicI64::new(0),
        }
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }

    /// Trip the latch. Returns `true` if this call performed the trip,
    /// `false` if it was already tripped.
    pub fn trip(&self, now: DateTime<Utc>) -> bool {
        if self
            .tripped
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.tripped_at_ms.store(now.timestamp_millis(), Ordering::SeqCst);
            error!("cascading failure detector tripped");
            true
        } else {
            warn!("cascading failure detector already tripped, ignoring re-trip");
            false
        }
    }

    pub fn tripped_at(&self) -> Option<DateTime<Utc>> {
        if self.is_tripped() {
            Utc.timestamp_millis_opt(self.tripped_at_ms.load(Ordering::SeqCst))
                .single()
        } else {
            None
        }
    }

    /// Manual reset. Only an operator action should call this.
    pub fn reset(&self) {
        if self.is_tripped() {
            info!("cascading failure detector manually reset");
            self.tripped.store(false, Ordering::SeqCst);
            self.tripped_at_ms.store(0, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initially_not_tripped() {
        let latch = CascadeLatch::new();
        assert!(!latch.is_tripped());
        assert!(latch.tripped_at().is_none());
    }

    #[test]
    fn test_trip_then_second_trip_is_noop() {
        let latch = CascadeLatch::new();
        let now = Utc::now();
        assert!(latch.trip(now));
        assert!(!latch.trip(now));
        assert!(latch.is_tripped());
    }

    #[test]
    fn test_reset_clears_state() {
        let latch = CascadeLatch::new();
        latch.trip(Utc::now());
        latch.reset();
        assert!(!latch.is_tripped());
    }
}
