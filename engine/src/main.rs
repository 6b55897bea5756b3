use anyhow::{Context, bail};
use geoprobe_engine::aggregate::QueryAggregator;
use geoprobe_engine::config::Config;
use geoprobe_engine::geometry::GeoPoint;
use geoprobe_engine::lookup::{ContainmentFirst, LookupStrategy, MultiProvider, PixelIdentify};
use geoprobe_engine::provider::{
    DatasetStore, GeoDataProvider, IdentifyParser, LocalGeoProvider, ProviderDescriptor,
    ProviderRegistry, roman_class_labels,
};
use geoprobe_engine::report::{ReportAssembler, ReportLayout};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Local vector sources wired in by default: (provider id, label, dataset)
const VECTOR_SOURCES: &[(&str, &str, &str)] = &[
    ("fire-hazard-lra", "Fire Hazard (LRA)", "fire_hazard_lra"),
    ("fire-hazard-sra", "Fire Hazard (SRA)", "fire_hazard_sra"),
    ("flood", "Flood Zones", "flood_zones"),
    ("ozone", "Ozone Nonattainment", "ozone"),
];

/// Classified-grid source served through point-identify: (provider id,
/// label, dataset)
const RASTER_SOURCE: (&str, &str, &str) = (
    "landslide",
    "Landslide Susceptibility",
    "landslide_susceptibility",
);

/// Build the provider registry over local GeoJSON datasets
fn build_registry(store: &Arc<DatasetStore>) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for (id, label, dataset) in VECTOR_SOURCES {
        registry.register(Arc::new(LocalGeoProvider::new(
            ProviderDescriptor::vector(*id, *label),
            *dataset,
            store.clone(),
        )));
    }
    let (id, label, dataset) = RASTER_SOURCE;
    registry.register(Arc::new(LocalGeoProvider::new(
        ProviderDescriptor::raster(id, label),
        dataset,
        store.clone(),
    )));
    registry
}

/// Wire the static slot layout and its per-source lookup strategies
fn build_aggregator(registry: &ProviderRegistry, config: &Config) -> anyhow::Result<QueryAggregator> {
    let radius = config.query.search_radius_m;

    let layout = Arc::new(
        ReportLayout::new()
            .declare("fire-hazard", "Fire Hazard Zone")
            .declare("flood", "Flood Zone")
            .declare("ozone", "Ozone Nonattainment Area")
            .declare("landslide", "Landslide Susceptibility"),
    );

    let provider = |id: &str| -> anyhow::Result<Arc<dyn GeoDataProvider>> {
        registry
            .get(id)
            .with_context(|| format!("provider '{}' not registered", id))
    };

    // Fire hazard spans two jurisdiction-specific datasets, tried in
    // LRA-before-SRA order with a union nearest-search fallback
    let fire = MultiProvider::new(
        vec![
            ("LRA".to_string(), provider("fire-hazard-lra")?),
            ("SRA".to_string(), provider("fire-hazard-sra")?),
        ],
        radius,
    );

    let mut tasks: IndexMap<String, Arc<dyn LookupStrategy>> = IndexMap::new();
    tasks.insert("fire-hazard".to_string(), Arc::new(fire));
    tasks.insert(
        "flood".to_string(),
        Arc::new(ContainmentFirst::new(provider("flood")?, "FEMA", radius)),
    );
    tasks.insert(
        "ozone".to_string(),
        Arc::new(ContainmentFirst::new(provider("ozone")?, "EPA", radius)),
    );
    // Susceptibility classes come back as raw grid codes; render them
    // as the Roman-numeral classes the source documents
    tasks.insert(
        "landslide".to_string(),
        Arc::new(PixelIdentify::new(
            provider("landslide")?,
            IdentifyParser::standard().with_class_labels(roman_class_labels()),
            config.query.identify_tolerance,
        )),
    );

    let assembler = ReportAssembler::new(layout.clone());
    Ok(QueryAggregator::new(
        layout,
        tasks,
        assembler,
        config.query.task_timeout,
    )?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geoprobe=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!("Loaded configuration: data_dir={:?}", config.data_dir);

    let mut args = std::env::args().skip(1);
    let (Some(lat), Some(lon)) = (args.next(), args.next()) else {
        bail!("usage: geoprobe <lat> <lon>");
    };
    let point = GeoPoint::new(
        lat.parse().context("invalid latitude")?,
        lon.parse().context("invalid longitude")?,
    );

    let store = Arc::new(DatasetStore::new(config.data_dir.clone()));
    let registry = build_registry(&store);
    info!(providers = registry.len(), "provider registry ready");

    let aggregator = build_aggregator(&registry, &config)?;
    let report = aggregator.aggregate(point).await;

    println!("{}", report.render());
    Ok(())
}
