//! Engine configuration
//!
//! Configuration is loaded from environment variables; unset variables
//! fall back to the defaults below.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::geometry::MAX_SEARCH_RADIUS_M;

/// Main engine configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding local GeoJSON datasets
    pub data_dir: PathBuf,

    /// Point-query configuration
    pub query: QueryConfig,

    /// Viewport overlay configuration
    pub viewport: ViewportConfig,
}

/// Point-query related configuration
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Proximity search radius in meters
    pub search_radius_m: f64,
    /// Per-task deadline; an expired task settles as failed so the
    /// report barrier always completes
    pub task_timeout: Duration,
    /// Pixel tolerance for raster identify calls
    pub identify_tolerance: f64,
}

/// Viewport-refresh related configuration
#[derive(Debug, Clone)]
pub struct ViewportConfig {
    /// Quiet period before a viewport change fires a fetch
    pub debounce: Duration,
    /// Cap on features per overlay fetch
    pub max_results: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            query: QueryConfig::default(),
            viewport: ViewportConfig::default(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            search_radius_m: MAX_SEARCH_RADIUS_M,
            task_timeout: Duration::from_secs(15),
            identify_tolerance: 1.0,
        }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(600),
            max_results: 1000,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var("GEOPROBE_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        // Query config
        if let Ok(val) = env::var("GEOPROBE_SEARCH_RADIUS_KM")
            && let Ok(km) = val.parse::<f64>()
        {
            config.query.search_radius_m = km * 1000.0;
        }
        if let Ok(val) = env::var("GEOPROBE_TASK_TIMEOUT_SECS")
            && let Ok(secs) = val.parse::<u64>()
        {
            config.query.task_timeout = Duration::from_secs(secs);
        }
        if let Ok(val) = env::var("GEOPROBE_IDENTIFY_TOLERANCE")
            && let Ok(tol) = val.parse()
        {
            config.query.identify_tolerance = tol;
        }

        // Viewport config
        if let Ok(val) = env::var("GEOPROBE_DEBOUNCE_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            config.viewport.debounce = Duration::from_millis(ms);
        }
        if let Ok(val) = env::var("GEOPROBE_VIEWPORT_MAX_RESULTS")
            && let Ok(n) = val.parse()
        {
            config.viewport.max_results = n;
        }

        config
    }
}
