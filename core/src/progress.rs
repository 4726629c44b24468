//! Rate-limited progress notification.
//!
//! Compression measures cumulative bytes after every chunk, which can be
//! thousands of times per second; operators only need an update every few
//! seconds. The throttler forwards at most one measurement per window over
//! an unbounded channel send, so the thread doing the compressing never
//! waits on rendering or I/O. A separate consumer task formats and
//! broadcasts the forwarded events.

use std::time::Duration;
use std::time::Instant;

use tokio::sync::mpsc::UnboundedSender;

/// Default gap between forwarded progress notifications.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(5);

/// A forwarded progress measurement. `total` is fixed when the job starts
/// (the pre-compression file size) and never recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub processed: u64,
    pub total: u64,
}

/// Wraps a progress channel with the rate-limiting policy.
///
/// The window starts when the throttler is created, so the first
/// measurement inside a fresh window is suppressed rather than forwarded
/// immediately. Completion messages are the caller's responsibility and
/// bypass the throttler entirely.
pub struct ThrottledProgress {
    tx: UnboundedSender<ProgressEvent>,
    total: u64,
    interval: Duration,
    last_report: Instant,
}

impl ThrottledProgress {
    pub fn new(tx: UnboundedSender<ProgressEvent>, total: u64) -> Self {
        Self::with_interval(tx, total, DEFAULT_REPORT_INTERVAL)
    }

    pub fn with_interval(
        tx: UnboundedSender<ProgressEvent>,
        total: u64,
        interval: Duration,
    ) -> Self {
        Self {
            tx,
            total,
            interval,
            last_report: Instant::now(),
        }
    }

    /// Record a cumulative measurement, forwarding it downstream if the
    /// current window has elapsed. Never blocks; if the receiving side is
    /// gone the event is dropped.
    pub fn report(&mut self, processed: u64) {
        if self.last_report.elapsed() < self.interval {
            return;
        }
        self.last_report = Instant::now();
        let _ = self.tx.send(ProgressEvent {
            processed,
            total: self.total,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tokio::sync::mpsc;

    #[test]
    fn first_measurement_in_a_fresh_window_is_suppressed() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut throttle = ThrottledProgress::with_interval(tx, 100, Duration::from_secs(5));

        throttle.report(1);
        throttle.report(2);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn at_most_one_event_per_window() {
        let window = Duration::from_millis(40);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut throttle = ThrottledProgress::with_interval(tx, 1000, window);

        // Report far more often than the window for ~4 windows.
        for i in 0..40u64 {
            throttle.report(i * 25);
            thread::sleep(Duration::from_millis(5));
        }
        drop(throttle);

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }

        // 200ms of reporting with a 40ms window: a handful of events, never
        // anywhere near the 40 raw measurements.
        assert!(!events.is_empty());
        assert!(events.len() <= 5, "got {} events", events.len());
        assert!(events.iter().all(|e| e.total == 1000));
    }

    #[test]
    fn dropped_receiver_does_not_panic_the_reporter() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let mut throttle = ThrottledProgress::with_interval(tx, 10, Duration::ZERO);
        throttle.report(5);
    }
}
