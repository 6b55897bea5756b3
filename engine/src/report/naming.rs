//! Guessing which attribute holds a feature's display value
//!
//! Source schemas vary: one dataset calls its hazard class `HAZ_CLASS`,
//! another `category`, a third just `name`. The scorer ranks attribute
//! keys against a static hint table; exact hint matches outrank
//! substring matches, earlier hints outrank later ones, and shorter keys
//! break remaining ties so the result is deterministic.

use crate::provider::Feature;

/// Hint table, highest priority first
const DISPLAY_HINTS: &[&str] = &[
    "category", "class", "label", "zone", "name", "severity", "type",
];

/// Score an attribute key against the hint table. Higher is better;
/// zero means no hint matched.
pub fn score_attribute_key(key: &str) -> u32 {
    let key_lower = key.to_lowercase();
    for (rank, hint) in DISPLAY_HINTS.iter().enumerate() {
        let priority = (DISPLAY_HINTS.len() - rank) as u32;
        if key_lower == *hint {
            // Exact matches sit strictly above every substring match
            return 100 + priority;
        }
        if key_lower.contains(hint) {
            return priority;
        }
    }
    0
}

/// Pick the best human-readable value from a feature's attributes.
///
/// Deterministic: highest score wins, then the shortest key, then the
/// attribute map's own order.
pub fn display_value(feature: &Feature) -> Option<String> {
    let mut best: Option<(u32, usize, String)> = None;

    for key in feature.attributes.keys() {
        let score = score_attribute_key(key);
        if score == 0 {
            continue;
        }
        let Some(value) = feature.attribute_str(key) else {
            continue;
        };
        let better = match &best {
            Some((best_score, best_len, _)) => {
                score > *best_score || (score == *best_score && key.len() < *best_len)
            }
            None => true,
        };
        if better {
            best = Some((score, key.len(), value));
        }
    }

    best.map(|(_, _, value)| value)
}
