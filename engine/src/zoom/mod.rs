//! Zoom-threshold visibility automaton
//!
//! Deterministic show/hide rules driven by the single zoom scalar. The
//! automaton holds no state beyond "which overlays are displayed", and
//! that set always equals what the pure rule computation yields for the
//! current zoom.

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

/// Which half of the mutually-exclusive road pair an overlay is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoadKind {
    Highway,
    Local,
}

/// Visibility rule for one overlay
#[derive(Debug, Clone, Copy)]
pub enum ZoomRule {
    /// Visible at or above the threshold
    MinZoom(u8),
    /// Visible at or below the threshold
    MaxZoom(u8),
    /// Mutually-exclusive highway/local pair sharing one switch point:
    /// highways show below it, local roads at or above it
    RoadPair { switch: u8, kind: RoadKind },
}

impl ZoomRule {
    /// Pure visibility decision for this rule at a zoom level
    pub fn is_visible(&self, zoom: u8) -> bool {
        match self {
            Self::MinZoom(threshold) => zoom >= *threshold,
            Self::MaxZoom(threshold) => zoom <= *threshold,
            Self::RoadPair { switch, kind } => match kind {
                RoadKind::Highway => zoom < *switch,
                RoadKind::Local => zoom >= *switch,
            },
        }
    }
}

/// Static overlay-id to rule table
#[derive(Debug, Clone, Default)]
pub struct ZoomThresholdTable {
    rules: IndexMap<String, ZoomRule>,
}

impl ZoomThresholdTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(mut self, overlay: impl Into<String>, rule: ZoomRule) -> Self {
        self.rules.insert(overlay.into(), rule);
        self
    }

    /// Pure visibility decision. Overlays without a rule are never
    /// auto-shown.
    pub fn is_visible(&self, overlay: &str, zoom: u8) -> bool {
        self.rules
            .get(overlay)
            .map(|rule| rule.is_visible(zoom))
            .unwrap_or(false)
    }

    /// All overlays visible at a zoom level, in declaration order
    pub fn visible_at(&self, zoom: u8) -> IndexSet<String> {
        self.rules
            .iter()
            .filter(|(_, rule)| rule.is_visible(zoom))
            .map(|(id, _)| id.clone())
            .collect()
    }
}

/// Overlays to show and hide after a zoom change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibilityDiff {
    pub show: Vec<String>,
    pub hide: Vec<String>,
}

impl VisibilityDiff {
    pub fn is_empty(&self) -> bool {
        self.show.is_empty() && self.hide.is_empty()
    }
}

/// Tracks the displayed overlay set against the rule table
#[derive(Debug, Clone)]
pub struct ZoomVisibilityAutomaton {
    table: ZoomThresholdTable,
    displayed: IndexSet<String>,
}

impl ZoomVisibilityAutomaton {
    pub fn new(table: ZoomThresholdTable) -> Self {
        Self {
            table,
            displayed: IndexSet::new(),
        }
    }

    /// Re-derive visibility from scratch for the new zoom level and
    /// return the show/hide delta against what is currently displayed.
    pub fn on_zoom_changed(&mut self, zoom: u8) -> VisibilityDiff {
        let target = self.table.visible_at(zoom);

        let show: Vec<String> = target
            .iter()
            .filter(|id| !self.displayed.contains(*id))
            .cloned()
            .collect();
        let hide: Vec<String> = self
            .displayed
            .iter()
            .filter(|id| !target.contains(*id))
            .cloned()
            .collect();

        if !show.is_empty() || !hide.is_empty() {
            debug!(zoom, show = ?show, hide = ?hide, "zoom visibility changed");
        }

        self.displayed = target;
        VisibilityDiff { show, hide }
    }

    /// Currently displayed overlays
    pub fn displayed(&self) -> &IndexSet<String> {
        &self.displayed
    }
}
