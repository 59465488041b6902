//! Feature throttle — at most one feature pass per interval of logical time.

use crate::domain::{Interval, Timestamp};

/// Due = no pass has run yet, or `time >= last_pass + interval`.
///
/// The last-pass time moves only when a pass actually runs. Non-positive
/// intervals make every update due. When `last_pass + interval` overflows
/// past `i64::MAX` no later time exists, so nothing is due.
#[derive(Debug, Clone)]
pub struct FeatureThrottle {
    interval: Interval,
    last_pass: Option<Timestamp>,
}

impl FeatureThrottle {
    pub fn new(interval: Interval) -> Self {
        Self {
            interval,
            last_pass: None,
        }
    }

    pub fn is_due(&self, time: Timestamp) -> bool {
        match self.last_pass {
            None => true,
            Some(last) => match last.checked_add(self.interval) {
                Some(next) => time >= next,
                // Only a negative interval can underflow.
                None => self.interval.value() < 0,
            },
        }
    }

    /// Record `time` as the last pass if due. Returns whether it was.
    pub fn try_acquire(&mut self, time: Timestamp) -> bool {
        if !self.is_due(time) {
            return false;
        }
        self.last_pass = Some(time);
        true
    }

    pub fn last_pass(&self) -> Option<Timestamp> {
        self.last_pass
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }
}
