use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

/// Wall-clock source for sessions and services.
///
/// `Manual` clocks share their instant between clones, so a test can hand one
/// clone to a controller and advance the other.
#[derive(Debug, Clone, Default)]
pub enum Clock {
    #[default]
    System,
    Manual(Arc<Mutex<DateTime<Utc>>>),
}

impl Clock {
    /// Returns a clock that follows the system time.
    #[must_use]
    pub fn system() -> Self {
        Self::System
    }

    /// Returns a manual clock starting at the given instant.
    #[must_use]
    pub fn manual(at: DateTime<Utc>) -> Self {
        Self::Manual(Arc::new(Mutex::new(at)))
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Manual(at) => *at.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Moves a manual clock forward. Has no effect on `Clock::System`.
    pub fn advance(&self, delta: Duration) {
        if let Clock::Manual(at) = self {
            let mut guard = at.lock().unwrap_or_else(PoisonError::into_inner);
            *guard += delta;
        }
    }

    /// Moves a manual clock forward by whole milliseconds.
    pub fn advance_millis(&self, millis: i64) {
        self.advance(Duration::milliseconds(millis));
    }
}

/// Deterministic timestamp for tests (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a manual `Clock` starting at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::manual(fixed_now())
}
