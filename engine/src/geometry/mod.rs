//! Geographic primitives and boundary-distance math

mod distance;
mod types;

pub use distance::{MAX_SEARCH_RADIUS_M, distance_to_edge, haversine_miles, meters_to_miles};
pub use types::{GeoPoint, ViewportBounds};
