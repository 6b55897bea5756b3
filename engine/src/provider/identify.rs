//! Parsing of raster identify responses
//!
//! Raster sources return point-identify payloads in wildly different
//! shapes: some carry a top-level `value`, some bury the class in an
//! attribute map under a source-specific key, some only ship a textual
//! label. The parser is an ordered list of extraction rules evaluated in
//! priority order; the first rule that yields a scalar wins.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Attribute keys that commonly hold the raster class value, tried as
/// exact matches before any fuzzy matching
const VALUE_ATTRIBUTE_CANDIDATES: &[&str] = &["Pixel Value", "pixel_value", "GRAY_INDEX", "VALUE"];

/// Attribute keys that hold a textual class label rather than a code
const LABEL_ATTRIBUTE_CANDIDATES: &[&str] = &["CLASS", "ClassName", "LABEL", "SUS_CLASS"];

fn fuzzy_value_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)pixel ?value|^value$|gray_index|gridcode")
            .expect("fuzzy attribute pattern is valid")
    })
}

/// One extraction rule over a raw identify response
#[derive(Debug, Clone)]
pub enum ExtractRule {
    /// Direct top-level `value` field (or `results[0].value`)
    TopLevelValue,
    /// Exact attribute-name candidates, in listed order
    AttributeExact(&'static [&'static str]),
    /// Fuzzy attribute-name match against the shared value pattern
    AttributeFuzzy,
    /// Textual label candidates, in listed order
    TextualLabel(&'static [&'static str]),
}

/// Parser for one raster source: ordered rules plus an optional
/// class-code-to-label table for sources that return codes
#[derive(Debug, Clone)]
pub struct IdentifyParser {
    rules: Vec<ExtractRule>,
    class_labels: Option<Vec<(u32, &'static str)>>,
}

impl IdentifyParser {
    /// Standard rule order used by every known raster source
    pub fn standard() -> Self {
        Self {
            rules: vec![
                ExtractRule::TopLevelValue,
                ExtractRule::AttributeExact(VALUE_ATTRIBUTE_CANDIDATES),
                ExtractRule::AttributeFuzzy,
                ExtractRule::TextualLabel(LABEL_ATTRIBUTE_CANDIDATES),
            ],
            class_labels: None,
        }
    }

    /// Attach a class-code-to-label table
    pub fn with_class_labels(mut self, labels: Vec<(u32, &'static str)>) -> Self {
        self.class_labels = Some(labels);
        self
    }

    /// Parse a display label out of a raw identify response.
    ///
    /// Returns `None` when no rule matches, which callers report as a
    /// NotFound outcome rather than an error.
    pub fn parse(&self, raw: &Value) -> Option<String> {
        let value = self.rules.iter().find_map(|rule| apply_rule(rule, raw))?;
        Some(self.translate(value))
    }

    /// Map a numeric class code through the label table, if one is
    /// configured and the value parses as a code
    fn translate(&self, value: String) -> String {
        let Some(labels) = &self.class_labels else {
            return value;
        };
        let Ok(code) = value.parse::<u32>() else {
            return value;
        };
        labels
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, label)| (*label).to_string())
            .unwrap_or(value)
    }
}

fn apply_rule(rule: &ExtractRule, raw: &Value) -> Option<String> {
    match rule {
        ExtractRule::TopLevelValue => top_level_value(raw),
        ExtractRule::AttributeExact(candidates) | ExtractRule::TextualLabel(candidates) => {
            attribute_maps(raw)
                .into_iter()
                .find_map(|attrs| exact_match(attrs, candidates))
        }
        ExtractRule::AttributeFuzzy => attribute_maps(raw).into_iter().find_map(fuzzy_match),
    }
}

fn top_level_value(raw: &Value) -> Option<String> {
    if let Some(v) = raw.get("value").and_then(scalar_to_string) {
        return Some(v);
    }
    raw.get("results")?
        .as_array()?
        .first()?
        .get("value")
        .and_then(scalar_to_string)
}

/// Attribute maps a response may carry, in the order sources nest them
fn attribute_maps(raw: &Value) -> Vec<&Map<String, Value>> {
    let mut maps = Vec::new();
    if let Some(obj) = raw.as_object() {
        maps.push(obj);
    }
    for list_key in ["results", "features"] {
        let Some(first) = raw.get(list_key).and_then(Value::as_array).and_then(|a| a.first())
        else {
            continue;
        };
        for attrs_key in ["attributes", "properties"] {
            if let Some(obj) = first.get(attrs_key).and_then(Value::as_object) {
                maps.push(obj);
            }
        }
    }
    maps
}

fn exact_match(attrs: &Map<String, Value>, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find_map(|key| attrs.get(*key).and_then(scalar_to_string))
}

fn fuzzy_match(attrs: &Map<String, Value>) -> Option<String> {
    let pattern = fuzzy_value_pattern();
    attrs
        .iter()
        .find(|(key, _)| pattern.is_match(key))
        .and_then(|(_, value)| scalar_to_string(value))
}

/// Render a scalar JSON value as a display string; integral floats lose
/// their trailing `.0` so class codes compare cleanly
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 && f.abs() < u32::MAX as f64 {
                    return Some(format!("{}", f as i64));
                }
            }
            Some(n.to_string())
        }
        _ => None,
    }
}

/// Class-code table mapping 0-10 to Roman numeral intensity labels
pub fn roman_class_labels() -> Vec<(u32, &'static str)> {
    vec![
        (0, "0"),
        (1, "I"),
        (2, "II"),
        (3, "III"),
        (4, "IV"),
        (5, "V"),
        (6, "VI"),
        (7, "VII"),
        (8, "VIII"),
        (9, "IX"),
        (10, "X"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_top_level_value_wins_first() {
        let parser = IdentifyParser::standard();
        let raw = json!({"value": "7", "results": [{"attributes": {"GRAY_INDEX": 3}}]});
        assert_eq!(parser.parse(&raw).as_deref(), Some("7"));
    }

    #[test]
    fn test_results_value_field() {
        let parser = IdentifyParser::standard();
        let raw = json!({"results": [{"value": 4.0}]});
        assert_eq!(parser.parse(&raw).as_deref(), Some("4"));
    }

    #[test]
    fn test_exact_attribute_candidates() {
        let parser = IdentifyParser::standard();
        let raw = json!({"results": [{"attributes": {"Pixel Value": "8"}}]});
        assert_eq!(parser.parse(&raw).as_deref(), Some("8"));
    }

    #[test]
    fn test_fuzzy_attribute_name() {
        let parser = IdentifyParser::standard();
        let raw = json!({"features": [{"properties": {"gridcode": 5}}]});
        assert_eq!(parser.parse(&raw).as_deref(), Some("5"));

        let raw = json!({"features": [{"properties": {"Pixel  Value": 5, "pixelvalue": 6}}]});
        assert_eq!(parser.parse(&raw).as_deref(), Some("6"));
    }

    #[test]
    fn test_textual_label_fallback() {
        let parser = IdentifyParser::standard();
        let raw = json!({"results": [{"attributes": {"CLASS": "Moderate"}}]});
        assert_eq!(parser.parse(&raw).as_deref(), Some("Moderate"));
    }

    #[test]
    fn test_no_rule_matches() {
        let parser = IdentifyParser::standard();
        assert_eq!(parser.parse(&json!({"unrelated": true})), None);
        assert_eq!(parser.parse(&json!({"value": ""})), None);
    }

    #[test]
    fn test_class_code_translates_to_roman() {
        let parser = IdentifyParser::standard().with_class_labels(roman_class_labels());
        let raw = json!({"value": 6});
        assert_eq!(parser.parse(&raw).as_deref(), Some("VI"));

        // textual values pass through untranslated
        let raw = json!({"results": [{"attributes": {"CLASS": "High"}}]});
        assert_eq!(parser.parse(&raw).as_deref(), Some("High"));

        // codes outside the table keep their raw form
        let raw = json!({"value": 42});
        assert_eq!(parser.parse(&raw).as_deref(), Some("42"));
    }
}
