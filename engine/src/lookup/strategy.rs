//! Strategy implementations: containment-first, multi-provider tiering,
//! and raster pixel-identify

use async_trait::async_trait;
use serde_json::{Map, json};
use std::sync::Arc;
use tracing::debug;

use crate::geometry::{GeoPoint, distance_to_edge};
use crate::provider::{Feature, GeoDataProvider, IdentifyParser};

use super::outcome::LookupOutcome;

/// Trait for per-source lookup strategies.
///
/// `lookup` is infallible by contract: provider errors are folded into a
/// `Failed` outcome so one source can never abort its siblings.
#[async_trait]
pub trait LookupStrategy: Send + Sync {
    async fn lookup(&self, point: GeoPoint) -> LookupOutcome;
}

/// Containment query first, bounded nearest-search fallback
pub struct ContainmentFirst {
    provider: Arc<dyn GeoDataProvider>,
    tier: String,
    radius_m: f64,
}

impl ContainmentFirst {
    pub fn new(provider: Arc<dyn GeoDataProvider>, tier: impl Into<String>, radius_m: f64) -> Self {
        Self {
            provider,
            tier: tier.into(),
            radius_m,
        }
    }
}

#[async_trait]
impl LookupStrategy for ContainmentFirst {
    async fn lookup(&self, point: GeoPoint) -> LookupOutcome {
        match self.provider.query_contains(point).await {
            Ok(features) => {
                // First feature by the provider's own return order
                if let Some(feature) = features.into_iter().next() {
                    return LookupOutcome::Contained {
                        feature,
                        tier: self.tier.clone(),
                    };
                }
            }
            Err(e) => return LookupOutcome::failed(e.to_string()),
        }

        let tiers = [(self.tier.clone(), self.provider.clone())];
        nearest_search(point, self.radius_m, &tiers).await
    }
}

/// Sequential containment tiers across multiple authoritative datasets,
/// with a nearest-search across the union of all tiers as the fallback
pub struct MultiProvider {
    tiers: Vec<(String, Arc<dyn GeoDataProvider>)>,
    radius_m: f64,
}

impl MultiProvider {
    pub fn new(tiers: Vec<(String, Arc<dyn GeoDataProvider>)>, radius_m: f64) -> Self {
        Self { tiers, radius_m }
    }
}

#[async_trait]
impl LookupStrategy for MultiProvider {
    async fn lookup(&self, point: GeoPoint) -> LookupOutcome {
        // Containment tiers are strictly sequential dependent steps:
        // each only runs if the previous yielded no containing feature.
        for (tier, provider) in &self.tiers {
            match provider.query_contains(point).await {
                Ok(features) => {
                    if let Some(feature) = features.into_iter().next() {
                        return LookupOutcome::Contained {
                            feature,
                            tier: tier.clone(),
                        };
                    }
                }
                Err(e) => return LookupOutcome::failed(e.to_string()),
            }
        }

        nearest_search(point, self.radius_m, &self.tiers).await
    }
}

/// Bounded proximity search across one or more providers, ranking the
/// union of results by edge distance. Strict `<` comparison, so the
/// first feature at a given distance wins ties. Features whose geometry
/// cannot be ranked (NaN edge distance) are excluded.
async fn nearest_search(
    point: GeoPoint,
    radius_m: f64,
    tiers: &[(String, Arc<dyn GeoDataProvider>)],
) -> LookupOutcome {
    let p = point.to_geo();
    let mut best: Option<(Feature, f64, String)> = None;

    for (tier, provider) in tiers {
        let features = match provider.query_nearby(point, radius_m).await {
            Ok(features) => features,
            Err(e) => return LookupOutcome::failed(e.to_string()),
        };

        for feature in features {
            let distance = distance_to_edge(p, &feature.geometry);
            if distance.is_nan() {
                debug!(
                    provider = provider.descriptor().id,
                    "skipping feature with non-polygonal geometry"
                );
                continue;
            }
            let closer = match &best {
                Some((_, best_distance, _)) => distance < *best_distance,
                None => true,
            };
            if closer {
                best = Some((feature, distance, tier.clone()));
            }
        }
    }

    match best {
        Some((feature, distance_miles, tier)) => LookupOutcome::Nearest {
            feature,
            distance_miles,
            tier,
        },
        None => LookupOutcome::NotFound,
    }
}

/// Raster point-identify lookup
pub struct PixelIdentify {
    provider: Arc<dyn GeoDataProvider>,
    parser: IdentifyParser,
    tolerance: f64,
}

impl PixelIdentify {
    pub fn new(provider: Arc<dyn GeoDataProvider>, parser: IdentifyParser, tolerance: f64) -> Self {
        Self {
            provider,
            parser,
            tolerance,
        }
    }

    /// A raster hit has no source geometry; synthesize a point feature
    /// carrying the parsed class label under a key the display-value
    /// scorer recognizes
    fn class_feature(point: GeoPoint, label: &str) -> Feature {
        let mut attributes = Map::new();
        attributes.insert("class".into(), json!(label));
        Feature::new(geo::Geometry::Point(point.to_geo()), attributes)
    }
}

#[async_trait]
impl LookupStrategy for PixelIdentify {
    async fn lookup(&self, point: GeoPoint) -> LookupOutcome {
        let raw = match self.provider.identify(point, self.tolerance).await {
            Ok(raw) => raw,
            Err(e) => return LookupOutcome::failed(e.to_string()),
        };

        match self.parser.parse(&raw) {
            Some(label) => LookupOutcome::Contained {
                feature: Self::class_feature(point, &label),
                tier: "identify".to_string(),
            },
            None => LookupOutcome::NotFound,
        }
    }
}
