//! Upload accounting for a run.
//!
//! The publisher records every object it puts into the destination bucket.
//! The pipeline reads the totals back when it builds the `RunReport`.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// One object written to the destination bucket
#[derive(Debug, Clone)]
pub struct UploadRecord {
    pub key: String,
    pub bytes: u64,
    pub duration: Duration,
}

/// Shared between the pipeline and the publisher; totals never decrease.
#[derive(Debug, Default)]
pub struct TransferMetrics {
    total_bytes: AtomicU64,
    upload_count: AtomicUsize,
    total_upload_time_ns: AtomicU64,
    uploads: RwLock<Vec<UploadRecord>>,
    run_start: RwLock<Option<Instant>>,
}

impl TransferMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Marks the start of the run. Calling it again restarts the clock.
    pub fn start_run(&self) {
        if let Ok(mut start) = self.run_start.write() {
            *start = Some(Instant::now());
        }
    }

    /// Called once per successful `put_object`
    pub fn record_upload(&self, key: &str, bytes: u64, duration: Duration) {
        self.total_bytes.fetch_add(bytes, Ordering::Relaxed);
        self.upload_count.fetch_add(1, Ordering::Relaxed);
        self.total_upload_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);

        if let Ok(mut uploads) = self.uploads.write() {
            uploads.push(UploadRecord {
                key: key.to_string(),
                bytes,
                duration,
            });
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes.load(Ordering::Relaxed)
    }

    pub fn upload_count(&self) -> usize {
        self.upload_count.load(Ordering::Relaxed)
    }

    /// Sum of request durations, not wall-clock time
    pub fn total_upload_time(&self) -> Duration {
        Duration::from_nanos(self.total_upload_time_ns.load(Ordering::Relaxed))
    }

    /// `None` until `start_run` has been called
    pub fn run_elapsed(&self) -> Option<Duration> {
        self.run_start
            .read()
            .ok()
            .and_then(|start| start.map(|s| s.elapsed()))
    }

    /// Snapshot of the records, in upload order
    pub fn uploads(&self) -> Vec<UploadRecord> {
        self.uploads
            .read()
            .map(|uploads| uploads.clone())
            .unwrap_or_default()
    }
}
