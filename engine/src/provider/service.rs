//! GeoDataProvider trait definition

use async_trait::async_trait;
use serde_json::Value;

use crate::geometry::GeoPoint;

use super::types::{Feature, ProviderDescriptor, ProviderError};

/// Trait for geographic data sources
#[async_trait]
pub trait GeoDataProvider: Send + Sync {
    /// Identity and capability flags for this source
    fn descriptor(&self) -> &ProviderDescriptor;

    /// Features whose geometry contains the point
    async fn query_contains(&self, point: GeoPoint) -> Result<Vec<Feature>, ProviderError>;

    /// Features within `radius_m` meters of the point
    async fn query_nearby(
        &self,
        point: GeoPoint,
        radius_m: f64,
    ) -> Result<Vec<Feature>, ProviderError>;

    /// Raster point-identify: raw response in whatever shape the source
    /// produces. Only meaningful when `supports_identify` is set.
    async fn identify(&self, point: GeoPoint, tolerance: f64) -> Result<Value, ProviderError> {
        let _ = (point, tolerance);
        Err(ProviderError::Unsupported(self.descriptor().id.clone()))
    }
}
