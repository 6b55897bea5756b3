//! Bounds-fetch collaborator interface

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::geometry::{GeoPoint, ViewportBounds};
use crate::provider::ProviderError;

/// One point feature in the overlay dataset
#[derive(Debug, Clone)]
pub struct PointFeature {
    pub point: GeoPoint,
    pub attributes: Map<String, Value>,
}

impl PointFeature {
    pub fn new(point: GeoPoint) -> Self {
        Self {
            point,
            attributes: Map::new(),
        }
    }
}

/// External collaborator that fetches the overlay dataset for a region
#[async_trait]
pub trait BoundsFetcher: Send + Sync {
    async fn fetch_by_bounds(
        &self,
        bounds: ViewportBounds,
        max_results: usize,
    ) -> Result<Vec<PointFeature>, ProviderError>;
}
