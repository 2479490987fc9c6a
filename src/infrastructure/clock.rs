use crate::domain::ports::Clock;
use crate::error::{ParkingError, Result};
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::{Arc, RwLock};

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Used by the scenario driver and tests so that billed durations are exact.
/// Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    time: Arc<RwLock<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            time: Arc::new(RwLock::new(start)),
        }
    }

    /// Moves the clock forward. Fails, leaving the time unchanged, when the
    /// result is outside the representable range.
    pub fn advance(&self, by: TimeDelta) -> Result<DateTime<Utc>> {
        let mut time = self.time.write().unwrap_or_else(|e| e.into_inner());
        *time = time.checked_add_signed(by).ok_or_else(|| {
            ParkingError::ValidationError(format!("Advancing the clock by {by} overflows"))
        })?;
        Ok(*time)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.time.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances_shared_time() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        let view = clock.clone();
        clock.advance(TimeDelta::minutes(90)).unwrap();
        assert_eq!(view.now() - start, TimeDelta::minutes(90));
    }

    #[test]
    fn test_manual_clock_overflow_is_rejected() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        assert!(matches!(
            clock.advance(TimeDelta::MAX),
            Err(ParkingError::ValidationError(_))
        ));
        assert_eq!(clock.now(), start);
    }
}
