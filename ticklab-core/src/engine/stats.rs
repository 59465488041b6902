//! Feature pass timing — instance-owned counters, logged once per pass.

use std::time::{Duration, Instant};

use log::info;

/// Pass count and timing for one scheduler.
#[derive(Debug, Clone, Default)]
pub struct FeaturePassStats {
    passes: u64,
    total: Duration,
    last: Duration,
}

impl FeaturePassStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed pass and emit the diagnostic record.
    pub fn record(&mut self, elapsed: Duration) {
        self.passes += 1;
        self.total += elapsed;
        self.last = elapsed;
        info!("{}", self.pass_record());
    }

    /// The per-pass diagnostic, e.g. `feature pass 3: 0.42ms (avg 0.40ms)`.
    pub fn pass_record(&self) -> String {
        format!(
            "feature pass {}: {:.2}ms (avg {:.2}ms)",
            self.passes,
            self.last_ms(),
            self.average_ms()
        )
    }

    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn last_ms(&self) -> f64 {
        self.last.as_secs_f64() * 1000.0
    }

    pub fn total_ms(&self) -> f64 {
        self.total.as_secs_f64() * 1000.0
    }

    /// Running average over all passes; 0 before the first one.
    pub fn average_ms(&self) -> f64 {
        if self.passes == 0 {
            return 0.0;
        }
        self.total_ms() / self.passes as f64
    }
}

/// Wall-clock timer for one pass.
pub struct PassTimer {
    start: Instant,
}

impl PassTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_average_is_zero() {
        let stats = FeaturePassStats::new();
        assert_eq!(stats.passes(), 0);
        assert_eq!(stats.average_ms(), 0.0);
    }

    #[test]
    fn running_average() {
        let mut stats = FeaturePassStats::new();
        stats.record(Duration::from_millis(2));
        stats.record(Duration::from_millis(4));
        assert_eq!(stats.passes(), 2);
        assert!((stats.last_ms() - 4.0).abs() < 1e-9);
        assert!((stats.total_ms() - 6.0).abs() < 1e-9);
        assert!((stats.average_ms() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn pass_record_format() {
        let mut stats = FeaturePassStats::new();
        stats.record(Duration::from_micros(1500));
        assert_eq!(stats.pass_record(), "feature pass 1: 1.50ms (avg 1.50ms)");
        stats.record(Duration::from_micros(2500));
        assert_eq!(stats.pass_record(), "feature pass 2: 2.50ms (avg 2.00ms)");
    }

    #[test]
    fn timer_is_monotonic() {
        let timer = PassTimer::start();
        let a = timer.elapsed();
        let b = timer.elapsed();
        assert!(b >= a);
    }
}
