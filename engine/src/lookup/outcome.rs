//! Lookup outcome type

use crate::provider::Feature;

/// Result of one tiered lookup for one source at one query point.
///
/// Produced exactly once per strategy invocation; the aggregator records
/// it into the source's report slot.
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    /// The point falls inside a feature's geometry
    Contained {
        feature: Feature,
        /// Which tier of the source answered, e.g. "LRA" or "SRA"
        tier: String,
    },
    /// No containing feature; nearest feature within the search radius
    Nearest {
        feature: Feature,
        distance_miles: f64,
        tier: String,
    },
    /// Neither containment nor proximity produced a feature
    NotFound,
    /// The source could not be queried
    Failed { reason: String },
}

impl LookupOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Short tag for logging and metrics labels
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Contained { .. } => "contained",
            Self::Nearest { .. } => "nearest",
            Self::NotFound => "not_found",
            Self::Failed { .. } => "failed",
        }
    }
}
