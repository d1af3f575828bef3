//! In-process request statistics.
//!
//! Backs the `/metrics` gauges of both services: lifetime counters plus a
//! window of recent latency samples, summarized as mean and nearest-rank p95.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

/// Nearest-rank 95th percentile.
///
/// Sorts ascending and picks index `floor(0.95 * len) - 1`, clamped to the
/// slice bounds. Empty input yields `0.0`.
pub fn p95(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (sorted.len() as f64 * 0.95) as usize;
    let idx = rank.saturating_sub(1).min(sorted.len() - 1);
    sorted[idx]
}

/// Arithmetic mean, `0.0` for empty input.
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Point-in-time summary of [`RequestStats`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub total_requests: u64,
    pub total_success: u64,
    pub total_fail: u64,
    pub avg_total_latency_ms: f64,
    pub p95_total_latency_ms: f64,
    pub avg_single_attempt_latency_ms: f64,
    pub p95_single_attempt_latency_ms: f64,
}

/// Default number of latency samples kept per series.
pub const DEFAULT_SAMPLE_WINDOW: usize = 10_000;

/// The most recent `capacity` latency samples.
#[derive(Debug)]
struct SampleWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl SampleWindow {
    fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    fn push(&mut self, sample: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// `(mean, p95)` over the window.
    fn summarize(&mut self) -> (f64, f64) {
        let samples = self.samples.make_contiguous();
        (mean(samples), p95(samples))
    }
}

#[derive(Debug)]
struct StatsInner {
    total_requests: u64,
    total_success: u64,
    total_fail: u64,
    total_latencies_ms: SampleWindow,
    single_latencies_ms: SampleWindow,
}

/// Request counters and latency samples shared across handler tasks.
///
/// Counters cover the whole process lifetime. Latency summaries cover the
/// most recent samples only, so memory stays bounded on long runs.
#[derive(Debug)]
pub struct RequestStats {
    inner: Mutex<StatsInner>,
}

impl RequestStats {
    pub fn new() -> Self {
        Self::with_sample_window(DEFAULT_SAMPLE_WINDOW)
    }

    /// Keep at most `window` latency samples per series (minimum 1).
    pub fn with_sample_window(window: usize) -> Self {
        Self {
            inner: Mutex::new(StatsInner {
                total_requests: 0,
                total_success: 0,
                total_fail: 0,
                total_latencies_ms: SampleWindow::new(window),
                single_latencies_ms: SampleWindow::new(window),
            }),
        }
    }

    /// Record one handled request.
    ///
    /// `single_attempt_ms` is the latency of the attempt that succeeded, if any.
    pub fn record(&self, ok: bool, total_latency_ms: f64, single_attempt_ms: Option<f64>) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.total_requests += 1;
        if ok {
            inner.total_success += 1;
        } else {
            inner.total_fail += 1;
        }
        inner.total_latencies_ms.push(total_latency_ms);
        if let Some(ms) = single_attempt_ms {
            inner.single_latencies_ms.push(ms);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let (avg_total, p95_total) = inner.total_latencies_ms.summarize();
        let (avg_single, p95_single) = inner.single_latencies_ms.summarize();
        StatsSnapshot {
            total_requests: inner.total_requests,
            total_success: inner.total_success,
            total_fail: inner.total_fail,
            avg_total_latency_ms: avg_total,
            p95_total_latency_ms: p95_total,
            avg_single_attempt_latency_ms: avg_single,
            p95_single_attempt_latency_ms: p95_single,
        }
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_p95_nearest_rank() {
        let samples: Vec<f64> = (1..=10).map(|i| (i * 10) as f64).collect();
        assert_eq!(p95(&samples), 90.0);

        let shuffled = [70.0, 10.0, 100.0, 40.0, 90.0, 20.0, 60.0, 30.0, 80.0, 50.0];
        assert_eq!(p95(&shuffled), 90.0);
    }

    #[test]
    fn test_p95_small_inputs() {
        assert_eq!(p95(&[]), 0.0);
        assert_eq!(p95(&[42.0]), 42.0);
        // floor(1.9) - 1 = 0
        assert_eq!(p95(&[5.0, 1.0]), 1.0);
    }

    #[test]
    fn test_p95_twenty_samples() {
        let samples: Vec<f64> = (1..=20).map(f64::from).collect();
        // floor(19.0) - 1 = 18
        assert_eq!(p95(&samples), 19.0);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1.0, 2.0, 3.0, 6.0]), 3.0);
    }

    #[test]
    fn test_snapshot_counts() {
        let stats = RequestStats::new();
        stats.record(true, 100.0, Some(40.0));
        stats.record(false, 300.0, None);
        stats.record(true, 200.0, Some(60.0));

        let snap = stats.snapshot();
        assert_eq!(snap.total_requests, 3);
        assert_eq!(snap.total_success, 2);
        assert_eq!(snap.total_fail, 1);
        assert_eq!(snap.avg_total_latency_ms, 200.0);
        assert_eq!(snap.avg_single_attempt_latency_ms, 50.0);
        assert_eq!(snap.p95_single_attempt_latency_ms, 40.0);
    }

    #[test]
    fn test_sample_window_keeps_recent_latencies() {
        let stats = RequestStats::with_sample_window(3);
        for ms in [1000.0, 1000.0, 10.0, 20.0, 30.0] {
            stats.record(true, ms, Some(ms));
        }

        let snap = stats.snapshot();
        assert_eq!(snap.total_requests, 5);
        assert_eq!(snap.total_success, 5);
        assert_eq!(snap.avg_total_latency_ms, 20.0);
        assert_eq!(snap.avg_single_attempt_latency_ms, 20.0);
        // floor(2.85) - 1 = 1
        assert_eq!(snap.p95_total_latency_ms, 20.0);
    }

    #[test]
    fn test_empty_snapshot() {
        assert_eq!(RequestStats::new().snapshot(), StatsSnapshot::default());
    }
}
