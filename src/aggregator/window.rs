use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::models::{LogRecord, Reading};

use super::stats::summarize;

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "aggregator";

use crate::log_debug;

pub const DEFAULT_FLUSH_PERIOD: Duration = Duration::from_secs(60);

/// Buffers readings and closes one window per period.
///
/// There is no background timer: the period is checked on every push, so a
/// quiet backend closes nothing until the next sample arrives. Closing never
/// touches storage; the caller persists the returned summary.
pub struct SampleAggregator {
    window: Vec<Reading>,
    last_flush: Instant,
    period: Duration,
}

impl SampleAggregator {
    pub fn new(period: Duration) -> Self {
        Self::starting_at(period, Instant::now())
    }

    pub fn starting_at(period: Duration, now: Instant) -> Self {
        Self {
            window: Vec::new(),
            last_flush: now,
            period,
        }
    }

    pub fn push(&mut self, reading: Reading) -> Option<LogRecord> {
        self.push_at(reading, Instant::now())
    }

    /// Buffer `reading`; if the period has run out by `now`, close the window
    /// (this reading included) and return its summary.
    pub fn push_at(&mut self, reading: Reading, now: Instant) -> Option<LogRecord> {
        self.window.push(reading);
        log_debug!("buffered reading, window size {}", self.window.len());

        if now.saturating_duration_since(self.last_flush) >= self.period {
            self.close_at(now, Utc::now())
        } else {
            None
        }
    }

    pub fn close(&mut self) -> Option<LogRecord> {
        self.close_at(Instant::now(), Utc::now())
    }

    /// Clear the window and restart the clock. `None` for an empty window.
    pub fn close_at(&mut self, now: Instant, timestamp: DateTime<Utc>) -> Option<LogRecord> {
        let readings = std::mem::take(&mut self.window);
        self.last_flush = now;
        log_debug!("closed window of {} readings", readings.len());
        summarize(&readings, timestamp)
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    pub fn last_flush(&self) -> Instant {
        self.last_flush
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forced_close_matches_worked_example() {
        let start = Instant::now();
        let mut agg = SampleAggregator::starting_at(DEFAULT_FLUSH_PERIOD, start);

        agg.push_at(Reading::new(10.0, 5.0, 20.0), start);
        agg.push_at(Reading::new(12.0, 7.0, 22.0), start);
        agg.push_at(Reading::new(14.0, 9.0, 24.0), start);

        let record = agg.close_at(start, Utc::now()).unwrap();
        assert_eq!(record.mean_angle_y, 12.0);
        assert_eq!(record.mean_angle_z, 7.0);
        assert_eq!(record.mean_flex_angle, 22.0);
        assert_eq!(record.min_flex_angle, 20.0);
        assert_eq!(record.max_flex_angle, 24.0);
    }

    #[test]
    fn empty_close_yields_nothing_but_resets_clock() {
        let start = Instant::now();
        let mut agg = SampleAggregator::starting_at(DEFAULT_FLUSH_PERIOD, start);
        let later = start + Duration::from_secs(5);

        assert!(agg.close_at(later, Utc::now()).is_none());
        assert_eq!(agg.last_flush(), later);
        assert_eq!(agg.window_len(), 0);
    }

    #[test]
    fn push_closes_once_period_elapses() {
        let start = Instant::now();
        let mut agg = SampleAggregator::starting_at(DEFAULT_FLUSH_PERIOD, start);

        assert!(agg
            .push_at(Reading::new(1.0, 1.0, 10.0), start + Duration::from_secs(30))
            .is_none());
        assert_eq!(agg.window_len(), 1);

        let closed_at = start + DEFAULT_FLUSH_PERIOD;
        let record = agg
            .push_at(Reading::new(3.0, 3.0, 14.0), closed_at)
            .unwrap();

        // The triggering reading is part of the summary.
        assert_eq!(record.mean_angle_y, 2.0);
        assert_eq!(record.min_flex_angle, 10.0);
        assert_eq!(record.max_flex_angle, 14.0);
        assert_eq!(agg.window_len(), 0);
        assert_eq!(agg.last_flush(), closed_at);
    }

    #[test]
    fn windows_do_not_leak_into_each_other() {
        let start = Instant::now();
        let mut agg = SampleAggregator::starting_at(DEFAULT_FLUSH_PERIOD, start);

        agg.push_at(Reading::new(0.0, 0.0, 100.0), start);
        agg.close_at(start, Utc::now());
        agg.push_at(Reading::new(0.0, 0.0, 1.0), start);
        let second = agg.close_at(start, Utc::now()).unwrap();

        assert_eq!(second.max_flex_angle, 1.0);
        assert_eq!(second.min_flex_angle, 1.0);
    }
}
