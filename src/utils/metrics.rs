//! Observability and Metrics
//!
//! Process-wide counters for codec activity: how many streams were built,
//! how often they outgrew the inline buffer, how many bytes left for the
//! transport and how many decodes failed.
//!
//! Uses relaxed atomic counters, so reading a snapshot while other threads
//! encode is safe but not a consistent cut.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Counters for stream and codec operations
#[derive(Debug)]
pub struct CodecMetrics {
    /// Streams constructed (owned streams only)
    pub streams_created: AtomicU64,
    /// Streams whose content moved from the inline buffer to the heap
    pub heap_spills: AtomicU64,
    /// Buffer growths, spills included
    pub reallocations: AtomicU64,
    /// Bytes handed to the transport via `into_bytes`
    pub bytes_encoded: AtomicU64,
    /// Failed reads: short payloads and out-of-range decoded values
    pub decode_errors: AtomicU64,
    /// Ranged values sent through the escape path
    pub range_escapes: AtomicU64,
    /// Streams handed out by a stream pool without allocating
    pub pool_hits: AtomicU64,
    start_time: Instant,
}

impl CodecMetrics {
    pub fn new() -> Self {
        Self {
            streams_created: AtomicU64::new(0),
            heap_spills: AtomicU64::new(0),
            reallocations: AtomicU64::new(0),
            bytes_encoded: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            range_escapes: AtomicU64::new(0),
            pool_hits: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn stream_created(&self) {
        self.streams_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn heap_spill(&self) {
        self.heap_spills.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reallocation(&self) {
        self.reallocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_encoded(&self, byte_count: u64) {
        self.bytes_encoded.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn range_escape(&self) {
        self.range_escapes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pool_hit(&self) {
        self.pool_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            streams_created: self.streams_created.load(Ordering::Relaxed),
            heap_spills: self.heap_spills.load(Ordering::Relaxed),
            reallocations: self.reallocations.load(Ordering::Relaxed),
            bytes_encoded: self.bytes_encoded.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            range_escapes: self.range_escapes.load(Ordering::Relaxed),
            pool_hits: self.pool_hits.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            streams_created = snapshot.streams_created,
            heap_spills = snapshot.heap_spills,
            reallocations = snapshot.reallocations,
            bytes_encoded = snapshot.bytes_encoded,
            decode_errors = snapshot.decode_errors,
            range_escapes = snapshot.range_escapes,
            pool_hits = snapshot.pool_hits,
            uptime_seconds = snapshot.uptime_seconds,
            "Codec metrics snapshot"
        );
    }
}

impl Default for CodecMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub streams_created: u64,
    pub heap_spills: u64,
    pub reallocations: u64,
    pub bytes_encoded: u64,
    pub decode_errors: u64,
    pub range_escapes: u64,
    pub pool_hits: u64,
    pub uptime_seconds: u64,
}

static METRICS: once_cell::sync::Lazy<CodecMetrics> = once_cell::sync::Lazy::new(CodecMetrics::new);

/// Get the global metrics instance
pub fn global_metrics() -> &'static CodecMetrics {
    &METRICS
}

/// Times a block of codec work and logs the duration on drop
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        debug!(
            operation = self.operation,
            duration_us = duration.as_micros() as u64,
            "Operation completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = CodecMetrics::new();
        metrics.stream_created();
        metrics.stream_created();
        metrics.bytes_encoded(40);
        metrics.bytes_encoded(2);
        metrics.decode_error();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.streams_created, 2);
        assert_eq!(snapshot.bytes_encoded, 42);
        assert_eq!(snapshot.decode_errors, 1);
        assert_eq!(snapshot.heap_spills, 0);
    }

    #[test]
    fn test_global_metrics_is_shared() {
        let before = global_metrics().snapshot().range_escapes;
        global_metrics().range_escape();
        assert!(global_metrics().snapshot().range_escapes > before);
    }

    #[test]
    fn test_timer_drops_cleanly() {
        let timer = Timer::start("encode");
        assert_eq!(timer.operation, "encode");
        drop(timer);
    }
}
