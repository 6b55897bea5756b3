//! Geographic data providers
//!
//! Each provider answers containment, proximity, and raster-identify
//! queries over a single named dataset. The engine talks to providers
//! only through the [`GeoDataProvider`] trait so sources can be swapped
//! per deployment (local GeoJSON files, remote feature services, mocks).

pub mod identify;
mod local;
mod registry;
mod service;
mod types;

pub use identify::{ExtractRule, IdentifyParser, roman_class_labels};
pub use local::{DatasetStore, LocalGeoProvider, parse_feature_collection};
pub use registry::ProviderRegistry;
pub use service::GeoDataProvider;
pub use types::{Feature, ProviderDescriptor, ProviderError};
