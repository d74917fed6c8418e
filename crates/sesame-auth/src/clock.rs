//! Time source and expiry computation.
//!
//! Expiries are always absolute instants so storage and comparisons
//! never have to know which duration produced them.

use chrono::{DateTime, Duration, Utc};

use crate::error::AuthError;

/// Source of the current time.
pub trait Clock: Send + Sync {
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

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Absolute instant `offset_secs` seconds after `clock.now()`.
///
/// Fails with [`AuthError::ExpiryOutOfRange`] when the offset does not fit
/// a signed duration or the sum overflows the calendar.
pub fn compute_expiry(clock: &dyn Clock, offset_secs: u64) -> Result<DateTime<Utc>, AuthError> {
    offset_after(clock.now(), offset_secs)
}

pub(crate) fn offset_after(
    instant: DateTime<Utc>,
    offset_secs: u64,
) -> Result<DateTime<Utc>, AuthError> {
    i64::try_from(offset_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|offset| instant.checked_add_signed(offset))
        .ok_or(AuthError::ExpiryOutOfRange { offset_secs })
}
