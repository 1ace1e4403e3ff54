use crate::error::StoreError;
use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

/// Failures and latency injected into a [`MemoryStore`](super::MemoryStore).
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    /// Range listing fails permanently when this page index is requested.
    pub fail_listing_at_page: Option<usize>,
    /// The next N range listing calls fail with a transient error.
    pub transient_listing_failures: usize,
    /// The next N feed page fetches (across all cursors) fail with a transient error.
    pub transient_page_failures: usize,
    /// Latency added to every feed page fetch.
    pub page_delay: Option<Duration>,
}

/// Live counters shared by the store and every cursor it hands out.
#[derive(Debug, Default)]
pub(crate) struct FaultState {
    pub(crate) fail_listing_at_page: Option<usize>,
    pub(crate) page_delay: Option<Duration>,
    listing_failures_left: AtomicUsize,
    page_failures_left: AtomicUsize,
    pub(crate) listing_calls: AtomicUsize,
    pub(crate) open_calls: AtomicUsize,
    pub(crate) page_fetches: AtomicUsize,
}

impl FaultState {
    pub(crate) fn new(plan: FaultPlan) -> Self {
        Self {
            fail_listing_at_page: plan.fail_listing_at_page,
            page_delay: plan.page_delay,
            listing_failures_left: AtomicUsize::new(plan.transient_listing_failures),
            page_failures_left: AtomicUsize::new(plan.transient_page_failures),
            ..Default::default()
        }
    }

    pub(crate) fn check_listing(&self, page_index: usize) -> Result<(), StoreError> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);

        if take_one(&self.listing_failures_left) {
            return Err(StoreError::Throttled {
                retry_after_ms: 10,
            });
        }

        if self.fail_listing_at_page == Some(page_index) {
            return Err(StoreError::Generic(format!(
                "partition key range listing failed at page {page_index}"
            )));
        }

        Ok(())
    }

    pub(crate) async fn check_page_fetch(&self) -> Result<(), StoreError> {
        self.page_fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.page_delay {
            tokio::time::sleep(delay).await;
        }

        if take_one(&self.page_failures_left) {
            return Err(StoreError::Transient("injected page failure".to_string()));
        }

        Ok(())
    }
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
        .is_ok()
}
