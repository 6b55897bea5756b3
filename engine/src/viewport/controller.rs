//! Debounced, mutually-exclusive viewport refresh
//!
//! The controller owns one overlay dataset and re-fetches it when the
//! visible region changes. Change events are debounced; only the latest
//! event in a burst fires a fetch. At most one fetch is in flight at a
//! time: an event arriving while busy is skipped, not queued, and the
//! next viewport change is what triggers the next attempt.

use metrics::counter;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::geometry::ViewportBounds;

use super::fetch::{BoundsFetcher, PointFeature};

/// Controller for one background overlay
#[derive(Clone)]
pub struct ViewportRefreshController {
    inner: Arc<Inner>,
}

struct Inner {
    fetcher: Arc<dyn BoundsFetcher>,
    debounce: Duration,
    max_results: usize,
    enabled: AtomicBool,
    /// Busy flag: holds the one-fetch-in-flight invariant
    busy: AtomicBool,
    /// Sequence of viewport-change events; a sleeping debounce task
    /// fires only if it is still the latest
    change_seq: AtomicU64,
    /// Current viewport: seeded at construction, updated on every
    /// change event. The map always has a viewport, so an enable-time
    /// fetch can fire before any pan or zoom happens.
    latest_bounds: Mutex<ViewportBounds>,
    dataset: RwLock<Vec<PointFeature>>,
}

impl ViewportRefreshController {
    pub fn new(
        fetcher: Arc<dyn BoundsFetcher>,
        initial_bounds: ViewportBounds,
        debounce: Duration,
        max_results: usize,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher,
                debounce,
                max_results,
                enabled: AtomicBool::new(false),
                busy: AtomicBool::new(false),
                change_seq: AtomicU64::new(0),
                latest_bounds: Mutex::new(initial_bounds),
                dataset: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Record a viewport change and arm the debounce timer. The fetch
    /// fires only after a quiet period with no further changes.
    pub fn on_viewport_changed(&self, bounds: ViewportBounds) {
        let inner = self.inner.clone();
        let seq = inner.change_seq.fetch_add(1, Ordering::SeqCst) + 1;
        *inner.latest_bounds.lock().expect("bounds lock poisoned") = bounds;

        tokio::spawn(async move {
            tokio::time::sleep(inner.debounce).await;
            if inner.change_seq.load(Ordering::SeqCst) != seq {
                // superseded by a newer change event
                return;
            }
            inner.try_fetch().await;
        });
    }

    /// Enable the overlay and fire an immediate, non-debounced fetch
    pub async fn on_overlay_enabled(&self) {
        self.inner.enabled.store(true, Ordering::SeqCst);
        info!("overlay enabled, fetching immediately");
        self.inner.try_fetch().await;
    }

    /// Disable the overlay and clear its displayed data. Pending
    /// debounce timers are invalidated so no background fetch fires
    /// until re-enabled.
    pub fn on_overlay_disabled(&self) {
        self.inner.enabled.store(false, Ordering::SeqCst);
        self.inner.change_seq.fetch_add(1, Ordering::SeqCst);
        self.inner
            .dataset
            .write()
            .expect("dataset lock poisoned")
            .clear();
        info!("overlay disabled, dataset cleared");
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::SeqCst)
    }

    /// Snapshot of the current overlay dataset
    pub fn dataset(&self) -> Vec<PointFeature> {
        self.inner
            .dataset
            .read()
            .expect("dataset lock poisoned")
            .clone()
    }
}

impl Inner {
    /// Run one fetch attempt, honoring the enabled and busy gates
    async fn try_fetch(&self) {
        if !self.enabled.load(Ordering::SeqCst) {
            debug!("fetch skipped: overlay disabled");
            counter!("geoprobe_viewport_fetches_skipped_total", "reason" => "disabled")
                .increment(1);
            return;
        }

        // Mutual exclusion: at most one fetch session in flight
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("fetch skipped: already in flight");
            counter!("geoprobe_viewport_fetches_skipped_total", "reason" => "busy").increment(1);
            return;
        }

        let bounds = *self.latest_bounds.lock().expect("bounds lock poisoned");

        counter!("geoprobe_viewport_fetches_total").increment(1);
        match self.fetcher.fetch_by_bounds(bounds, self.max_results).await {
            Ok(features) => {
                info!(count = features.len(), "viewport fetch completed");
                // whole-dataset replacement, never incremental
                *self.dataset.write().expect("dataset lock poisoned") = features;
            }
            Err(e) => {
                // no automatic retry: the next viewport change is
                // what triggers the next attempt
                warn!("viewport fetch failed: {}", e);
            }
        }

        self.busy.store(false, Ordering::SeqCst);
    }
}
