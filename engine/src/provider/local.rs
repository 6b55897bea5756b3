//! Local provider backed by GeoJSON files and an R-tree index

use async_trait::async_trait;
use dashmap::DashMap;
use geo::{BoundingRect, Contains, Coord, LineString, Polygon};
use rstar::{AABB, RTree, RTreeObject};
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::geometry::GeoPoint;

use super::service::GeoDataProvider;
use super::types::{Feature, ProviderDescriptor, ProviderError};

/// Meters per degree of latitude, used to pad bounding-box queries
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Entry in the spatial index: feature bounding box plus an index into
/// the dataset's features vector
#[derive(Debug, Clone)]
struct FeatureEntry {
    index: usize,
    bbox: AABB<[f64; 2]>,
}

impl RTreeObject for FeatureEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.bbox
    }
}

/// One loaded dataset: parsed features plus their R-tree
pub struct IndexedDataset {
    tree: RTree<FeatureEntry>,
    features: Vec<Feature>,
}

impl IndexedDataset {
    /// Build an index over parsed features. Features without a computable
    /// bounding box are dropped.
    pub fn from_features(features: Vec<Feature>) -> Self {
        let mut entries = Vec::with_capacity(features.len());
        for (index, feature) in features.iter().enumerate() {
            if let Some(rect) = feature.geometry.bounding_rect() {
                entries.push(FeatureEntry {
                    index,
                    bbox: AABB::from_corners([rect.min().x, rect.min().y], [
                        rect.max().x,
                        rect.max().y,
                    ]),
                });
            }
        }
        let tree = RTree::bulk_load(entries);
        Self { tree, features }
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Features whose bounding box intersects the given envelope
    fn candidates(&self, envelope: &AABB<[f64; 2]>) -> impl Iterator<Item = &Feature> {
        self.tree
            .locate_in_envelope_intersecting(envelope)
            .map(|entry| &self.features[entry.index])
    }
}

/// Shared on-disk dataset store: dataset name -> parsed, indexed features
pub struct DatasetStore {
    dir: PathBuf,
    cache: DashMap<String, Arc<IndexedDataset>>,
}

impl DatasetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: DashMap::new(),
        }
    }

    /// Find the dataset file for a given name
    fn find_dataset_file(&self, name: &str) -> Option<PathBuf> {
        for ext in &["geojson", "json"] {
            let path = self.dir.join(format!("{}.{}", name, ext));
            if path.exists() {
                return Some(path);
            }
        }
        None
    }

    /// Load and cache a dataset by name
    fn load(&self, name: &str) -> Result<Arc<IndexedDataset>, ProviderError> {
        if let Some(cached) = self.cache.get(name) {
            return Ok(cached.clone());
        }

        let path = self
            .find_dataset_file(name)
            .ok_or_else(|| ProviderError::DatasetNotFound(name.to_string()))?;

        debug!("Loading dataset from: {:?}", path);
        let features = read_feature_collection(&path)?;
        let dataset = Arc::new(IndexedDataset::from_features(features));
        self.cache.insert(name.to_string(), dataset.clone());

        info!(
            "Loaded dataset '{}': {} features",
            name,
            dataset.feature_count()
        );
        Ok(dataset)
    }
}

/// Provider serving one named GeoJSON dataset out of a [`DatasetStore`]
pub struct LocalGeoProvider {
    descriptor: ProviderDescriptor,
    dataset: String,
    store: Arc<DatasetStore>,
}

impl LocalGeoProvider {
    pub fn new(
        descriptor: ProviderDescriptor,
        dataset: impl Into<String>,
        store: Arc<DatasetStore>,
    ) -> Self {
        Self {
            descriptor,
            dataset: dataset.into(),
            store,
        }
    }

    fn dataset(&self) -> Result<Arc<IndexedDataset>, ProviderError> {
        self.store.load(&self.dataset)
    }
}

#[async_trait]
impl GeoDataProvider for LocalGeoProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn query_contains(&self, point: GeoPoint) -> Result<Vec<Feature>, ProviderError> {
        let dataset = self.dataset()?;
        let p = point.to_geo();
        let envelope = AABB::from_point([point.lon, point.lat]);

        Ok(dataset
            .candidates(&envelope)
            .filter(|f| f.geometry.contains(&p))
            .cloned()
            .collect())
    }

    async fn query_nearby(
        &self,
        point: GeoPoint,
        radius_m: f64,
    ) -> Result<Vec<Feature>, ProviderError> {
        let dataset = self.dataset()?;
        let radius = radius_m.min(self.descriptor.max_search_radius_m);

        // Pad the query envelope by the radius in degrees; longitude
        // degrees shrink with latitude.
        let lat_pad = radius / METERS_PER_DEGREE;
        let lon_pad = lat_pad / point.lat.to_radians().cos().max(0.01);
        let envelope = AABB::from_corners(
            [point.lon - lon_pad, point.lat - lat_pad],
            [point.lon + lon_pad, point.lat + lat_pad],
        );

        Ok(dataset.candidates(&envelope).cloned().collect())
    }

    /// Point-identify over a classified-grid dataset distributed as
    /// polygonized cells: the cell under the point stands in for a
    /// raster pixel read. The response mirrors the `results` shape
    /// remote identify endpoints produce.
    async fn identify(&self, point: GeoPoint, _tolerance: f64) -> Result<Value, ProviderError> {
        if !self.descriptor.supports_identify {
            return Err(ProviderError::Unsupported(self.descriptor.id.clone()));
        }
        let dataset = self.dataset()?;
        let p = point.to_geo();
        let envelope = AABB::from_point([point.lon, point.lat]);

        let results: Vec<Value> = dataset
            .candidates(&envelope)
            .filter(|f| f.geometry.contains(&p))
            .map(|f| json!({"attributes": f.attributes}))
            .collect();

        Ok(json!({"results": results}))
    }
}

/// Read a GeoJSON FeatureCollection from disk
fn read_feature_collection(path: &Path) -> Result<Vec<Feature>, ProviderError> {
    let text = std::fs::read_to_string(path)?;
    parse_feature_collection(&text)
}

/// Parse a GeoJSON FeatureCollection string into features.
///
/// Supports Point, Polygon, and MultiPolygon geometries; features with
/// other geometry types are skipped rather than rejected, since sources
/// routinely mix annotation geometries into hazard layers.
pub fn parse_feature_collection(text: &str) -> Result<Vec<Feature>, ProviderError> {
    let root: Value = serde_json::from_str(text)
        .map_err(|e| ProviderError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    let raw_features = root
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::MalformedResponse("missing 'features' array".into()))?;

    let mut features = Vec::with_capacity(raw_features.len());
    for raw in raw_features {
        let Some(geometry) = raw.get("geometry").and_then(parse_geometry) else {
            continue;
        };
        let attributes = raw
            .get("properties")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_else(Map::new);
        features.push(Feature::new(geometry, attributes));
    }
    Ok(features)
}

fn parse_geometry(raw: &Value) -> Option<geo::Geometry<f64>> {
    let kind = raw.get("type")?.as_str()?;
    let coords = raw.get("coordinates")?;
    match kind {
        "Point" => {
            let c = parse_coord(coords)?;
            Some(geo::Geometry::Point(geo::Point(c)))
        }
        "Polygon" => Some(geo::Geometry::Polygon(parse_polygon(coords)?)),
        "MultiPolygon" => {
            let polys = coords
                .as_array()?
                .iter()
                .filter_map(parse_polygon)
                .collect::<Vec<_>>();
            Some(geo::Geometry::MultiPolygon(geo::MultiPolygon(polys)))
        }
        _ => None,
    }
}

fn parse_polygon(coords: &Value) -> Option<Polygon<f64>> {
    let rings = coords.as_array()?;
    let mut parsed = rings.iter().filter_map(parse_ring);
    let exterior = parsed.next()?;
    let interiors: Vec<LineString<f64>> = parsed.collect();
    Some(Polygon::new(exterior, interiors))
}

fn parse_ring(raw: &Value) -> Option<LineString<f64>> {
    let coords: Vec<Coord<f64>> = raw.as_array()?.iter().filter_map(parse_coord).collect();
    if coords.len() < 4 {
        return None;
    }
    Some(LineString(coords))
}

fn parse_coord(raw: &Value) -> Option<Coord<f64>> {
    let pair = raw.as_array()?;
    Some(Coord {
        x: pair.first()?.as_f64()?,
        y: pair.get(1)?.as_f64()?,
    })
}
