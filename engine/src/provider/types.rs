//! Provider-facing types and error definitions

use serde_json::{Map, Value};
use thiserror::Error;

/// Errors that can occur when querying a data provider
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed response from provider: {0}")]
    MalformedResponse(String),

    #[error("Operation not supported by provider '{0}'")]
    Unsupported(String),

    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A single feature returned by a provider: an opaque geometry plus the
/// source's attribute map. Read-only for consumers.
#[derive(Debug, Clone)]
pub struct Feature {
    pub geometry: geo::Geometry<f64>,
    pub attributes: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: geo::Geometry<f64>, attributes: Map<String, Value>) -> Self {
        Self {
            geometry,
            attributes,
        }
    }

    /// Attribute value as a string, if the attribute exists and is scalar
    pub fn attribute_str(&self, key: &str) -> Option<String> {
        match self.attributes.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Identity and capability flags for one data source
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    /// Stable provider identifier, e.g. "fire-hazard-lra"
    pub id: String,
    /// Human-readable source name
    pub label: String,
    /// Supports polygon containment queries
    pub supports_contains: bool,
    /// Supports bounded proximity queries
    pub supports_nearby: bool,
    /// Supports raster point-identify queries
    pub supports_identify: bool,
    /// Hard cap on proximity search radius, in meters
    pub max_search_radius_m: f64,
}

impl ProviderDescriptor {
    /// Descriptor for a vector (polygon) source
    pub fn vector(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            supports_contains: true,
            supports_nearby: true,
            supports_identify: false,
            max_search_radius_m: crate::geometry::MAX_SEARCH_RADIUS_M,
        }
    }

    /// Descriptor for a raster (identify-only) source
    pub fn raster(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            supports_contains: false,
            supports_nearby: false,
            supports_identify: true,
            max_search_radius_m: 0.0,
        }
    }
}
