//! Global throttle shared by every bucket.

use parking_lot::Mutex;
use tokio::time::Instant;

#[derive(Debug, Default)]
pub(crate) struct GlobalLimit {
    until: Mutex<Option<Instant>>,
}

impl GlobalLimit {
    /// Deadline of the active cooldown, if one is still running
    pub(crate) fn active_until(&self, now: Instant) -> Option<Instant> {
        let mut until = self.until.lock();
        match *until {
            Some(deadline) if deadline > now => Some(deadline),
            Some(_) => {
                *until = None;
                None
            }
            None => None,
        }
    }

    /// Start or extend the cooldown
    pub(crate) fn suspend_until(&self, deadline: Instant) {
        let mut until = self.until.lock();
        *until = Some(until.map_or(deadline, |current| current.max(deadline)));
    }
}
