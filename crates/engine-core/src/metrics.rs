use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    ranges_listed: AtomicU64,
    ranges_unavailable: AtomicU64,
    pages_read: AtomicU64,
    documents_scanned: AtomicU64,
    documents_matched: AtomicU64,
    documents_rejected: AtomicU64,
    retry_count: AtomicU64,
}

/// Counters shared by every range worker of a scan.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub ranges_listed: u64,
    pub ranges_unavailable: u64,
    pub pages_read: u64,
    pub documents_scanned: u64,
    pub documents_matched: u64,
    pub documents_rejected: u64,
    pub retry_count: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn increment_ranges(&self, count: u64) {
        self.inner.ranges_listed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_unavailable(&self, count: u64) {
        self.inner
            .ranges_unavailable
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_pages(&self, count: u64) {
        self.inner.pages_read.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_scanned(&self, count: u64) {
        self.inner
            .documents_scanned
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_matched(&self, count: u64) {
        self.inner
            .documents_matched
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_rejected(&self, count: u64) {
        self.inner
            .documents_rejected
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_retries(&self, count: u64) {
        self.inner.retry_count.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ranges_listed: self.inner.ranges_listed.load(Ordering::Relaxed),
            ranges_unavailable: self.inner.ranges_unavailable.load(Ordering::Relaxed),
            pages_read: self.inner.pages_read.load(Ordering::Relaxed),
            documents_scanned: self.inner.documents_scanned.load(Ordering::Relaxed),
            documents_matched: self.inner.documents_matched.load(Ordering::Relaxed),
            documents_rejected: self.inner.documents_rejected.load(Ordering::Relaxed),
            retry_count: self.inner.retry_count.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
