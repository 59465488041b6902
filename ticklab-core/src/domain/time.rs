//! Logical time.
//!
//! The engine runs on a timeline driven entirely by the update stream. The
//! unit is whatever the data uses (file sources use epoch milliseconds);
//! intervals are expressed in the same unit.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// A point on the logical timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

/// A span on the logical timeline, in the same unit as [`Timestamp`].
///
/// Zero or negative intervals are legal: the throttle then fires on every update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Interval(pub i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }

    /// `None` when the sum leaves the `i64` range.
    pub fn checked_add(self, interval: Interval) -> Option<Timestamp> {
        self.0.checked_add(interval.0).map(Timestamp)
    }
}

impl Interval {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

/// Saturates at the ends of the `i64` range.
impl Add<Interval> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Interval) -> Timestamp {
        Timestamp(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_interval() {
        assert_eq!(Timestamp(100) + Interval(50), Timestamp(150));
        assert_eq!(Timestamp(100) + Interval(-50), Timestamp(50));
    }

    #[test]
    fn checked_add_reports_overflow() {
        assert_eq!(Timestamp(10).checked_add(Interval(5)), Some(Timestamp(15)));
        assert_eq!(Timestamp(i64::MAX - 10).checked_add(Interval(100)), None);
        assert_eq!(Timestamp(i64::MIN + 10).checked_add(Interval(-100)), None);
    }

    #[test]
    fn add_saturates() {
        assert_eq!(Timestamp(i64::MAX) + Interval(1), Timestamp(i64::MAX));
        assert_eq!(Timestamp(i64::MIN) + Interval(-1), Timestamp(i64::MIN));
    }

    #[test]
    fn ordering() {
        assert!(Timestamp(1) < Timestamp(2));
        assert!(Interval(0) < Interval(1));
    }
}
