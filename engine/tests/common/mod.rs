//! Common Test Utilities for Integration Tests
//!
//! Shared scripted providers and fixture builders used across
//! integration test modules.

use async_trait::async_trait;
use geoprobe_engine::geometry::{GeoPoint, ViewportBounds};
use geoprobe_engine::provider::{Feature, GeoDataProvider, ProviderDescriptor, ProviderError};
use geoprobe_engine::report::ReportLayout;
use geoprobe_engine::viewport::{BoundsFetcher, PointFeature};
use serde_json::{Map, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Square polygon feature centered at (lon, lat), half-size in degrees
pub fn square(lon: f64, lat: f64, half: f64, attrs: &[(&str, &str)]) -> Feature {
    let ring = geo::LineString::from(vec![
        (lon - half, lat - half),
        (lon + half, lat - half),
        (lon + half, lat + half),
        (lon - half, lat + half),
        (lon - half, lat - half),
    ]);
    Feature::new(
        geo::Geometry::Polygon(geo::Polygon::new(ring, vec![])),
        attribute_map(attrs),
    )
}

/// Axis-aligned square spanning lon -0.5 to 0.5 whose southern edge sits
/// `edge_lat` degrees north of the equator
pub fn square_with_south_edge_at(edge_lat: f64, attrs: &[(&str, &str)]) -> Feature {
    let ring = geo::LineString::from(vec![
        (-0.5, edge_lat),
        (0.5, edge_lat),
        (0.5, edge_lat + 1.0),
        (-0.5, edge_lat + 1.0),
        (-0.5, edge_lat),
    ]);
    Feature::new(
        geo::Geometry::Polygon(geo::Polygon::new(ring, vec![])),
        attribute_map(attrs),
    )
}

fn attribute_map(attrs: &[(&str, &str)]) -> Map<String, serde_json::Value> {
    let mut attributes = Map::new();
    for (key, value) in attrs {
        attributes.insert((*key).to_string(), json!(value));
    }
    attributes
}

/// The standard three-slot layout used by the end-to-end tests
pub fn standard_layout() -> Arc<ReportLayout> {
    Arc::new(
        ReportLayout::new()
            .declare("fire-hazard", "Fire Hazard Zone")
            .declare("flood", "Flood Zone")
            .declare("ozone", "Ozone Nonattainment Area"),
    )
}

/// Scripted provider with call counters and optional artificial latency
pub struct ScriptedProvider {
    descriptor: ProviderDescriptor,
    contains: Vec<Feature>,
    nearby: Vec<Feature>,
    delay: Option<Duration>,
    fail: bool,
    contains_calls: AtomicUsize,
    nearby_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn empty(id: &str) -> Self {
        Self {
            descriptor: ProviderDescriptor::vector(id, id),
            contains: Vec::new(),
            nearby: Vec::new(),
            delay: None,
            fail: false,
            contains_calls: AtomicUsize::new(0),
            nearby_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(id: &str) -> Self {
        let mut provider = Self::empty(id);
        provider.fail = true;
        provider
    }

    pub fn with_contains(mut self, features: Vec<Feature>) -> Self {
        self.contains = features;
        self
    }

    pub fn with_nearby(mut self, features: Vec<Feature>) -> Self {
        self.nearby = features;
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

    async fn latency(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl GeoDataProvider for ScriptedProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn query_contains(&self, _point: GeoPoint) -> Result<Vec<Feature>, ProviderError> {
        self.contains_calls.fetch_add(1, Ordering::SeqCst);
        self.latency().await;
        if self.fail {
            return Err(ProviderError::Unavailable(self.descriptor.id.clone()));
        }
        Ok(self.contains.clone())
    }

    async fn query_nearby(
        &self,
        _point: GeoPoint,
        _radius_m: f64,
    ) -> Result<Vec<Feature>, ProviderError> {
        self.nearby_calls.fetch_add(1, Ordering::SeqCst);
        self.latency().await;
        if self.fail {
            return Err(ProviderError::Unavailable(self.descriptor.id.clone()));
        }
        Ok(self.nearby.clone())
    }
}

/// Counting bounds fetcher for controller tests
#[derive(Default)]
pub struct CountingFetcher {
    calls: AtomicUsize,
}

impl CountingFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BoundsFetcher for CountingFetcher {
    async fn fetch_by_bounds(
        &self,
        bounds: ViewportBounds,
        _max_results: usize,
    ) -> Result<Vec<PointFeature>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![PointFeature::new(bounds.sw)])
    }
}
