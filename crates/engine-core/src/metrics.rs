use serde::Serialize;
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

#[derive(Debug)]
struct InnerMetrics {
    rows_fetched: AtomicU64,
    rows_written: AtomicU64,
    batches_processed: AtomicU64,
    started: Instant,
}

/// Counters for a single export run.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub rows_fetched: u64,
    pub rows_written: u64,
    pub batches_processed: u64,
    pub elapsed_ms: u64,
    pub rows_per_second: f64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(InnerMetrics {
                rows_fetched: AtomicU64::new(0),
                rows_written: AtomicU64::new(0),
                batches_processed: AtomicU64::new(0),
                started: Instant::now(),
            }),
        }
    }

    pub fn increment_fetched(&self, count: u64) {
        self.inner.rows_fetched.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_written(&self, count: u64) {
        self.inner.rows_written.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_batches(&self, count: u64) {
        self.inner
            .batches_processed
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn elapsed(&self) -> Duration {
        self.inner.started.elapsed()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let rows_written = self.inner.rows_written.load(Ordering::Relaxed);
        let elapsed = self.elapsed();
        MetricsSnapshot {
            rows_fetched: self.inner.rows_fetched.load(Ordering::Relaxed),
            rows_written,
            batches_processed: self.inner.batches_processed.load(Ordering::Relaxed),
            elapsed_ms: elapsed.as_millis() as u64,
            rows_per_second: rows_per_second(rows_written as usize, elapsed),
        }
    }
}

/// Throughput over `elapsed`; zero when no time has passed.
pub fn rows_per_second(rows: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 { rows as f64 / secs } else { 0.0 }
}
