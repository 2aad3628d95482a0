use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Tracks hand-off and rewrite counters shared by the scanner and all workers
#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    // Hand-off metrics
    paths_emitted: Arc<AtomicU64>,
    paths_received: Arc<AtomicU64>,

    // File processing metrics
    files_rewritten: Arc<AtomicU64>,
    files_failed: Arc<AtomicU64>,
    bytes_read: Arc<AtomicU64>,
    bytes_written: Arc<AtomicU64>,
}

impl PipelineMetrics {
    /// Creates a new PipelineMetrics instance
    pub fn new() -> Self {
        Self {
            paths_emitted: Arc::new(AtomicU64::new(0)),
            paths_received: Arc::new(AtomicU64::new(0)),
            files_rewritten: Arc::new(AtomicU64::new(0)),
            files_failed: Arc::new(AtomicU64::new(0)),
            bytes_read: Arc::new(AtomicU64::new(0)),
            bytes_written: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records a path handed to the worker pool
    pub fn record_emitted(&self) {
        self.paths_emitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a path taken off the channel by a worker
    pub fn record_received(&self) {
        self.paths_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a completed read-transform-write cycle
    pub fn record_rewrite(&self, bytes_read: u64, bytes_written: u64) {
        self.files_rewritten.fetch_add(1, Ordering::Relaxed);
        let read_total = self.bytes_read.fetch_add(bytes_read, Ordering::Relaxed) + bytes_read;
        let written_total =
            self.bytes_written.fetch_add(bytes_written, Ordering::Relaxed) + bytes_written;
        debug!(
            "Rewrote {} -> {} bytes, totals: {} read, {} written",
            bytes_read, bytes_written, read_total, written_total
        );
    }

    /// Records a file that could not be processed
    pub fn record_failure(&self) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Gets a snapshot of the counters
    pub fn get_stats(&self) -> PipelineStats {
        PipelineStats {
            paths_emitted: self.paths_emitted.load(Ordering::Relaxed),
            paths_received: self.paths_received.load(Ordering::Relaxed),
            files_rewritten: self.files_rewritten.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
        }
    }

    /// Logs the current counters
    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Pipeline stats:\n\
             Paths emitted/received: {}/{}\n\
             Files rewritten/failed: {}/{}\n\
             Bytes read/written: {}/{}",
            stats.paths_emitted,
            stats.paths_received,
            stats.files_rewritten,
            stats.files_failed,
            stats.bytes_read,
            stats.bytes_written
        );
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the pipeline counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    pub paths_emitted: u64,
    pub paths_received: u64,
    pub files_rewritten: u64,
    pub files_failed: u64,
    pub bytes_read: u64,
    pub bytes_written: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_handoff_tracking() {
        let metrics = PipelineMetrics::new();

        metrics.record_emitted();
        metrics.record_emitted();
        metrics.record_received();
        let stats = metrics.get_stats();
        assert_eq!(stats.paths_emitted, 2);
        assert_eq!(stats.paths_received, 1);
    }

    #[test]
    fn test_rewrite_tracking() {
        let metrics = PipelineMetrics::new();

        metrics.record_rewrite(100, 130);
        metrics.record_rewrite(10, 10);
        metrics.record_failure();
        let stats = metrics.get_stats();
        assert_eq!(stats.files_rewritten, 2);
        assert_eq!(stats.files_failed, 1);
        assert_eq!(stats.bytes_read, 110);
        assert_eq!(stats.bytes_written, 140);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = PipelineMetrics::new();

        thread::scope(|scope| {
            for _ in 0..4 {
                let metrics = metrics.clone();
                scope.spawn(move || {
                    for _ in 0..250 {
                        metrics.record_received();
                    }
                });
            }
        });

        assert_eq!(metrics.get_stats().paths_received, 1000);
    }
}
