//! GeoProbe Engine Library
//!
//! Concurrent multi-source geographic point queries: tiered lookups per
//! data source, a join-barrier aggregator, viewport-driven overlay
//! refresh, and zoom-threshold visibility rules.

pub mod aggregate;
pub mod config;
pub mod geometry;
pub mod lookup;
pub mod provider;
pub mod report;
pub mod viewport;
pub mod zoom;

mod test_utils;

// Re-export commonly used types
pub use aggregate::QueryAggregator;
pub use geometry::{GeoPoint, ViewportBounds};
pub use lookup::{LookupOutcome, LookupStrategy};
pub use provider::{GeoDataProvider, ProviderRegistry};
pub use report::{Report, ReportAssembler, ReportLayout};
pub use viewport::ViewportRefreshController;
