//! Report assembly: settled slots back onto the declared display order

use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use crate::geometry::GeoPoint;
use crate::lookup::LookupOutcome;

use super::slots::{DefaultFormatter, ReportLayout, SlotFormatter};

/// One formatted slot line in the final report
#[derive(Debug, Clone)]
pub struct SlotResult {
    pub key: String,
    pub label: String,
    /// Outcome tag: "contained", "nearest", "not_found", "failed"
    pub kind: &'static str,
    pub text: String,
}

/// Final composite result for one query point.
///
/// Line order is the declared slot order, never arrival order. The
/// generation number identifies which aggregation produced the report so
/// display code can reject stale results.
#[derive(Debug, Clone)]
pub struct Report {
    pub generation: u64,
    pub point: GeoPoint,
    pub lines: Vec<SlotResult>,
}

impl Report {
    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Maps the unordered bag of settled outcomes onto the static layout
pub struct ReportAssembler {
    layout: Arc<ReportLayout>,
    formatters: HashMap<String, Box<dyn SlotFormatter>>,
    default_formatter: Box<dyn SlotFormatter>,
}

impl ReportAssembler {
    pub fn new(layout: Arc<ReportLayout>) -> Self {
        Self {
            layout,
            formatters: HashMap::new(),
            default_formatter: Box::new(DefaultFormatter),
        }
    }

    /// Install a slot-specific formatter
    pub fn with_formatter(mut self, key: impl Into<String>, formatter: Box<dyn SlotFormatter>)
    -> Self {
        self.formatters.insert(key.into(), formatter);
        self
    }

    /// Assemble the report in declared slot order.
    ///
    /// Every declared slot must appear in `settled`; a missing slot is a
    /// barrier bug upstream and renders as an explicit failure line so it
    /// is never silently omitted.
    pub fn assemble(
        &self,
        generation: u64,
        point: GeoPoint,
        settled: &HashMap<String, LookupOutcome>,
    ) -> Report {
        let missing = LookupOutcome::failed("slot never settled");
        let lines = self
            .layout
            .iter()
            .map(|slot| {
                let outcome = settled.get(&slot.key).unwrap_or_else(|| {
                    warn!(slot = %slot.key, "declared slot missing from settled set");
                    &missing
                });
                let formatter = self
                    .formatters
                    .get(&slot.key)
                    .unwrap_or(&self.default_formatter);
                SlotResult {
                    key: slot.key.clone(),
                    label: slot.label.clone(),
                    kind: outcome.kind(),
                    text: formatter.format(slot, outcome),
                }
            })
            .collect();

        Report {
            generation,
            point,
            lines,
        }
    }
}
