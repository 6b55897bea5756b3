//! Distance from a query point to the boundary of a polygonal feature
//!
//! Containment misses fall back to "how far is the nearest zone", which
//! ranks candidate features by the geodesic distance from the query point
//! to the closest point on each feature's boundary rings.

use geo::{Closest, ClosestPoint, Geometry, HaversineDistance, LineString, Point};

/// Default bound for proximity searches, roughly 80 km
pub const MAX_SEARCH_RADIUS_M: f64 = 80_000.0;

const METERS_PER_MILE: f64 = 1_609.344;

/// Convert meters to miles
pub fn meters_to_miles(meters: f64) -> f64 {
    meters / METERS_PER_MILE
}

/// Great-circle distance between two points, in miles
pub fn haversine_miles(a: Point<f64>, b: Point<f64>) -> f64 {
    meters_to_miles(a.haversine_distance(&b))
}

/// Shortest geodesic distance from `point` to the boundary of `geometry`,
/// in miles rounded to two decimal places.
///
/// Only polygon and multipolygon geometries have a boundary to measure
/// against; anything else yields NaN, which callers must exclude from
/// minimum-distance comparisons.
pub fn distance_to_edge(point: Point<f64>, geometry: &Geometry<f64>) -> f64 {
    let rings: Vec<&LineString<f64>> = match geometry {
        Geometry::Polygon(poly) => polygon_rings(poly).collect(),
        Geometry::MultiPolygon(mp) => mp.0.iter().flat_map(polygon_rings).collect(),
        _ => return f64::NAN,
    };

    let mut best = f64::NAN;
    for ring in rings {
        let nearest = match ring.closest_point(&point) {
            Closest::Intersection(p) | Closest::SinglePoint(p) => p,
            Closest::Indeterminate => continue,
        };
        let miles = haversine_miles(point, nearest);
        if best.is_nan() || miles < best {
            best = miles;
        }
    }

    round2(best)
}

fn polygon_rings(poly: &geo::Polygon<f64>) -> impl Iterator<Item = &LineString<f64>> {
    std::iter::once(poly.exterior()).chain(poly.interiors())
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
