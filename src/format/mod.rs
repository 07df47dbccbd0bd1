//! Output Formatter (`spec.md` §4.11).
//!
//! Three renderings derived from the same [`FinalResult`]: structured
//! JSON, flat `key: value` text, and a pretty-printed tagged markup tree.
//! None of them mutate the input.

use crate::model::FinalResult;
use crate::temporal::TimelineEntry;
use crate::value::FieldValue;
use serde_json::{Map, Value as Json};

/// Renders the result as a nested JSON map, with an optional `_metadata`
/// block carrying provenance and confidence.
#[must_use]
pub fn structured(result: &FinalResult, timeline: Option<&[TimelineEntry]>, include_metadata: bool) -> Json {
    let mut root = Map::new();
    for (key, value) in &result.field_values {
        root.insert(key.clone(), value.to_json());
    }

    if let Some(entries) = timeline {
        let items: Vec<Json> = entries
            .iter()
            .map(|e| serde_json::json!({ "field": e.field, "date": e.date }))
            .collect();
        root.insert("timeline".to_string(), Json::Array(items));
    }

    if include_metadata {
        let mut metadata = Map::new();
        metadata.insert(
            "provenance".to_string(),
            Json::Object(
                result
                    .provenance
                    .iter()
                    .map(|(k, v)| (k.clone(), Json::Array(v.iter().cloned().map(Json::String).collect())))
                    .collect(),
            ),
        );
        metadata.insert(
            "confidences".to_string(),
            Json::Object(
                result
                    .confidences
                    .iter()
                    .filter_map(|(k, v)| serde_json::Number::from_f64(f64::from(*v)).map(|n| (k.clone(), Json::Number(n))))
                    .collect(),
            ),
        );
        root.insert("_metadata".to_string(), Json::Object(metadata));
    }

    Json::Object(root)
}

/// Renders the result as one `key: value` line per field. Nested maps
/// render as `parent.child: value`; list-of-maps render as
/// `key: k1: v1, k2: v2`.
#[must_use]
pub fn flat_text(result: &FinalResult, timeline: Option<&[TimelineEntry]>) -> String {
    let mut lines = Vec::new();
    let mut keys: Vec<&String> = result.field_values.keys().collect();
    keys.sort();
    for key in keys {
        let value = &result.field_values[key];
        flat_lines(key, value, &mut lines);
    }

    if let Some(entries) = timeline {
        if !entries.is_empty() {
            lines.push("timeline:".to_string());
            for entry in entries {
                lines.push(format!("  {}: {}", entry.field, entry.date));
            }
        }
    }

    lines.join("\n")
}

fn flat_lines(key: &str, value: &FieldValue, lines: &mut Vec<String>) {
    match value {
        FieldValue::Object(map) => {
            for (child_key, child_value) in map {
                flat_lines(&format!("{key}.{child_key}"), child_value, lines);
            }
        }
        FieldValue::List(items) if items.iter().all(|v| matches!(v, FieldValue::Object(_))) && !items.is_empty() => {
            lines.push(format!("{key}: {}", value.display_string()));
        }
        other => lines.push(format!("{key}: {}", other.display_string())),
    }
}

/// Renders the result as a pretty-printed tagged markup tree: a root
/// `Document` containing `Fields` then `Metadata`.
#[must_use]
pub fn tagged_markup(result: &FinalResult, include_metadata: bool) -> String {
    let mut out = String::from("<Document>\n");
    out.push_str("  <Fields>\n");

    let mut keys: Vec<&String> = result.field_values.keys().collect();
    keys.sort();
    for key in keys {
        render_tag(&result.field_values[key], key, 2, &mut out);
    }
    out.push_str("  </Fields>\n");

    if include_metadata {
        out.push_str("  <Metadata>\n");
        let mut keys: Vec<&String> = result.provenance.keys().collect();
        keys.sort();
        for key in keys {
            let sources = result.provenance[key].join(",");
            out.push_str(&format!("    <{key} sources=\"{sources}\" />\n"));
        }
        out.push_str("  </Metadata>\n");
    }

    out.push_str("</Document>\n");
    out
}

fn render_tag(value: &FieldValue, tag: &str, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    match value {
        FieldValue::Null => out.push_str(&format!("{pad}<{tag} null=\"true\" />\n")),
        FieldValue::List(items) => {
            out.push_str(&format!("{pad}<{tag}>\n"));
            for (i, item) in items.iter().enumerate() {
                render_tag(item, &format!("Item index=\"{i}\""), indent + 1, out);
            }
            out.push_str(&format!("{pad}</{tag}>\n"));
        }
        FieldValue::Object(map) => {
            out.push_str(&format!("{pad}<{tag}>\n"));
            for (child_key, child_value) in map {
                render_tag(child_value, child_key, indent + 1, out);
            }
            out.push_str(&format!("{pad}</{tag}>\n"));
        }
        other => out.push_str(&format!("{pad}<{tag}>{}</{tag}>\n", xml_escape(&other.display_string()))),
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample_result() -> FinalResult {
        let mut result = FinalResult::default();
        result.field_values.insert("patient_name".to_string(), FieldValue::String("Jane Doe".to_string()));
        result.field_values.insert("allergies".to_string(), FieldValue::List(vec!["penicillin".into()]));
        result.field_values.insert("notes".to_string(), FieldValue::Null);
        result.provenance.insert("patient_name".to_string(), vec!["patient_info".to_string()]);
        result.confidences.insert("patient_name".to_string(), 0.95);
        result
    }

    #[test]
    fn test_structured_includes_metadata_when_requested() {
        let result = sample_result();
        let json = structured(&result, None, true);
        assert!(json.get("_metadata").is_some());
        assert_eq!(json["patient_name"], Json::String("Jane Doe".to_string()));
    }

    #[test]
    fn test_structured_omits_metadata_by_default() {
        let result = sample_result();
        let json = structured(&result, None, false);
        assert!(json.get("_metadata").is_none());
    }

    #[test]
    fn test_flat_text_renders_nested_object_with_dotted_key() {
        let mut result = FinalResult::default();
        let mut inner = BTreeMap::new();
        inner.insert("city".to_string(), FieldValue::String("Springfield".to_string()));
        result.field_values.insert("address".to_string(), FieldValue::Object(inner));
        let text = flat_text(&result, None);
        assert_eq!(text, "address.city: Springfield");
    }

    #[test]
    fn test_flat_text_includes_timeline_section() {
        let result = sample_result();
        let timeline = vec![TimelineEntry {
            field: "visit_date".to_string(),
            date: "2023-05-15".to_string(),
        }];
        let text = flat_text(&result, Some(&timeline));
        assert!(text.contains("timeline:"));
        assert!(text.contains("visit_date: 2023-05-15"));
    }

    #[test]
    fn test_tagged_markup_marks_null_fields() {
        let result = sample_result();
        let markup = tagged_markup(&result, false);
        assert!(markup.contains("<notes null=\"true\" />"));
        assert!(markup.starts_with("<Document>"));
    }

    #[test]
    fn test_tagged_markup_renders_list_items_with_index() {
        let result = sample_result();
        let markup = tagged_markup(&result, false);
        assert!(markup.contains("Item index=\"0\""));
    }
}
