//! Time source for document timestamps.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use notary_core::Timestamp;

/// Supplies the current time in whole seconds.
///
/// The registry never trusts the clock blindly: it clamps what it reads so
/// issued timestamps never go backwards and are never zero.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Wall clock, Unix seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Next timestamp to issue given the last one issued.
///
/// Zero is reserved for "not opened", so the result is always at least 1.
pub(crate) fn next_timestamp(clock: &dyn Clock, last: &mut Timestamp) -> Timestamp {
    let now = clock.now().max(*last).max(1);
    *last = now;
    now
}
