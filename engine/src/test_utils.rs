//! Test Utilities Module
//!
//! Mock providers, fetchers, and strategies plus small fixture builders.
//! This module is only compiled when running tests.

#![cfg(test)]

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::geometry::{GeoPoint, ViewportBounds};
use crate::lookup::{LookupOutcome, LookupStrategy};
use crate::provider::{Feature, GeoDataProvider, ProviderDescriptor, ProviderError};
use crate::report::ReportLayout;
use crate::viewport::{BoundsFetcher, PointFeature};

// ============================================================================
// Fixtures
// ============================================================================

/// Square polygon feature centered at (lon, lat) with the given
/// half-size in degrees and string attributes
pub fn square_feature(lon: f64, lat: f64, half: f64, attrs: &[(&str, &str)]) -> Feature {
    let ring = geo::LineString::from(vec![
        (lon - half, lat - half),
        (lon + half, lat - half),
        (lon + half, lat + half),
        (lon - half, lat + half),
        (lon - half, lat - half),
    ]);
    let mut attributes = Map::new();
    for (key, value) in attrs {
        attributes.insert((*key).to_string(), json!(value));
    }
    Feature::new(
        geo::Geometry::Polygon(geo::Polygon::new(ring, vec![])),
        attributes,
    )
}

/// Layout from (key, label) pairs
pub fn layout_with(slots: &[(&str, &str)]) -> Arc<ReportLayout> {
    let mut layout = ReportLayout::new();
    for (key, label) in slots {
        layout = layout.declare(*key, *label);
    }
    Arc::new(layout)
}

// ============================================================================
// Mock provider
// ============================================================================

/// Scripted provider with per-operation call counters
pub struct MockProvider {
    descriptor: ProviderDescriptor,
    contains: Vec<Feature>,
    nearby: Vec<Feature>,
    identify: Option<Value>,
    fail: bool,
    /// Artificial latency before answering, for timing tests
    delay: Option<Duration>,
    contains_calls: AtomicUsize,
    nearby_calls: AtomicUsize,
    identify_calls: AtomicUsize,
}

impl MockProvider {
    /// Vector provider that returns no features
    pub fn empty(id: &str, label: &str) -> Self {
        Self::with_descriptor(ProviderDescriptor::vector(id, label))
    }

    /// Raster provider with no scripted identify payload
    pub fn raster(id: &str, label: &str) -> Self {
        Self::with_descriptor(ProviderDescriptor::raster(id, label))
    }

    /// Provider whose every operation fails
    pub fn failing(id: &str, label: &str) -> Self {
        let mut provider = Self::empty(id, label);
        provider.fail = true;
        provider
    }

    fn with_descriptor(descriptor: ProviderDescriptor) -> Self {
        Self {
            descriptor,
            contains: Vec::new(),
            nearby: Vec::new(),
            identify: None,
            fail: false,
            delay: None,
            contains_calls: AtomicUsize::new(0),
            nearby_calls: AtomicUsize::new(0),
            identify_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_contains(mut self, features: Vec<Feature>) -> Self {
        self.contains = features;
        self
    }

    pub fn with_nearby(mut self, features: Vec<Feature>) -> Self {
        self.nearby = features;
        self
    }

    pub fn with_identify(mut self, raw: Value) -> Self {
        self.identify = Some(raw);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn contains_calls(&self) -> usize {
        self.contains_calls.load(Ordering::SeqCst)
    }

    pub fn nearby_calls(&self) -> usize {
        self.nearby_calls.load(Ordering::SeqCst)
    }

    pub fn identify_calls(&self) -> usize {
        self.identify_calls.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn unavailable(&self) -> ProviderError {
        ProviderError::Unavailable(format!("{} unavailable", self.descriptor.id))
    }
}

#[async_trait]
impl GeoDataProvider for MockProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn query_contains(&self, _point: GeoPoint) -> Result<Vec<Feature>, ProviderError> {
        self.contains_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if self.fail {
            return Err(self.unavailable());
        }
        Ok(self.contains.clone())
    }

    async fn query_nearby(
        &self,
        _point: GeoPoint,
        _radius_m: f64,
    ) -> Result<Vec<Feature>, ProviderError> {
        self.nearby_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if self.fail {
            return Err(self.unavailable());
        }
        Ok(self.nearby.clone())
    }

    async fn identify(&self, _point: GeoPoint, _tolerance: f64) -> Result<Value, ProviderError> {
        self.identify_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if self.fail {
            return Err(self.unavailable());
        }
        self.identify
            .clone()
            .ok_or_else(|| ProviderError::Unsupported(self.descriptor.id.clone()))
    }
}

// ============================================================================
// Mock strategies
// ============================================================================

/// Strategy that settles with a fixed outcome
pub struct ScriptedStrategy {
    outcome: LookupOutcome,
    delay: Option<Duration>,
}

impl ScriptedStrategy {
    pub fn settle(outcome: LookupOutcome) -> Self {
        Self {
            outcome,
            delay: None,
        }
    }

    pub fn not_found() -> Self {
        Self::settle(LookupOutcome::NotFound)
    }

    pub fn failing(reason: &str) -> Self {
        Self::settle(LookupOutcome::failed(reason))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl LookupStrategy for ScriptedStrategy {
    async fn lookup(&self, _point: GeoPoint) -> LookupOutcome {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }
}

/// Contained outcome over a square feature with the given category
pub fn outcome_contained(category: &str) -> ScriptedStrategy {
    ScriptedStrategy::settle(LookupOutcome::Contained {
        feature: square_feature(0.0, 0.0, 1.0, &[("category", category)]),
        tier: "test".to_string(),
    })
}

/// Strategy that never settles on its own; only a timeout ends it
pub struct SleepingStrategy {
    duration: Duration,
}

impl SleepingStrategy {
    pub fn hours(hours: u64) -> Self {
        Self {
            duration: Duration::from_secs(hours * 3600),
        }
    }
}

#[async_trait]
impl LookupStrategy for SleepingStrategy {
    async fn lookup(&self, _point: GeoPoint) -> LookupOutcome {
        tokio::time::sleep(self.duration).await;
        LookupOutcome::NotFound
    }
}

// ============================================================================
// Mock bounds fetcher
// ============================================================================

/// Scripted fetcher with a call counter and adjustable payload size
pub struct MockFetcher {
    feature_count: AtomicUsize,
    fail: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
    /// Bounds of the most recent fetch
    last_bounds: Mutex<Option<ViewportBounds>>,
}

impl MockFetcher {
    pub fn with_features(count: usize) -> Self {
        Self {
            feature_count: AtomicUsize::new(count),
            fail: false,
            delay: None,
            calls: AtomicUsize::new(0),
            last_bounds: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        let mut fetcher = Self::with_features(0);
        fetcher.fail = true;
        fetcher
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_feature_count(&self, count: usize) {
        self.feature_count.store(count, Ordering::SeqCst);
    }

    pub fn last_bounds(&self) -> Option<ViewportBounds> {
        *self.last_bounds.lock().unwrap()
    }
}

#[async_trait]
impl BoundsFetcher for MockFetcher {
    async fn fetch_by_bounds(
        &self,
        bounds: ViewportBounds,
        max_results: usize,
    ) -> Result<Vec<PointFeature>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_bounds.lock().unwrap() = Some(bounds);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(ProviderError::Unavailable("fetch failed".to_string()));
        }
        let count = self.feature_count.load(Ordering::SeqCst).min(max_results);
        Ok((0..count)
            .map(|i| PointFeature::new(GeoPoint::new(bounds.sw.lat + i as f64 * 1e-4, bounds.sw.lon)))
            .collect())
    }
}
