//! Viewport-driven overlay refresh

mod controller;
mod fetch;

pub use controller::ViewportRefreshController;
pub use fetch::{BoundsFetcher, PointFeature};
