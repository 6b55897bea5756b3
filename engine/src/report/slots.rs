//! Slot declarations and formatters

use indexmap::IndexMap;

use crate::lookup::LookupOutcome;

use super::naming::display_value;

/// One declared report slot: a stable key plus its human label
#[derive(Debug, Clone)]
pub struct SlotSpec {
    pub key: String,
    pub label: String,
}

/// The static slot list. Declaration order is display order; the set of
/// keys never changes between queries.
#[derive(Debug, Clone, Default)]
pub struct ReportLayout {
    slots: IndexMap<String, SlotSpec>,
}

impl ReportLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a slot. Order of declaration fixes display order.
    pub fn declare(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
        let key = key.into();
        self.slots.insert(key.clone(), SlotSpec {
            key,
            label: label.into(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    /// Slots in declared order
    pub fn iter(&self) -> impl Iterator<Item = &SlotSpec> {
        self.slots.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }
}

/// Renders one slot's outcome as a display line. Implementations must be
/// total over all four outcome variants.
pub trait SlotFormatter: Send + Sync {
    fn format(&self, slot: &SlotSpec, outcome: &LookupOutcome) -> String;
}

/// Standard text formatter used for any slot without a custom one
pub struct DefaultFormatter;

impl SlotFormatter for DefaultFormatter {
    fn format(&self, slot: &SlotSpec, outcome: &LookupOutcome) -> String {
        match outcome {
            LookupOutcome::Contained { feature, tier } => match display_value(feature) {
                Some(value) => format!("{}: {} [{}]", slot.label, value, tier),
                None => format!("{}: within mapped zone [{}]", slot.label, tier),
            },
            LookupOutcome::Nearest {
                feature,
                distance_miles,
                tier,
            } => {
                let desc = display_value(feature).unwrap_or_else(|| "zone".to_string());
                format!(
                    "{}: nearest {} is {:.2} miles away [{}]",
                    slot.label, desc, distance_miles, tier
                )
            }
            LookupOutcome::NotFound => format!("{}: no data for this location", slot.label),
            LookupOutcome::Failed { reason } => {
                format!("{}: error fetching data ({})", slot.label, reason)
            }
        }
    }
}
