use crate::tree::{LinkedParams, TextMorph};
use crate::validate::ValidationError;
use serde_json::{json, Map, Value as Json};

/// JSON formatting style.
#[derive(Clone, Copy)]
pub enum JsonStyle {
    /// Compact: no whitespace between tokens.
    Compact,
    /// Pretty: 2-space indented, one entry per line.
    Pretty,
}

/// Describe a morph tree as JSON: `output` always, `dirty` only when set,
/// `linked` when the morph carries linked params, `children` when non-empty.
pub fn morph_to_value(morph: &TextMorph) -> Json {
    let mut obj = Map::new();
    if morph.is_dirty {
        obj.insert("dirty".to_string(), Json::Bool(true));
    }
    obj.insert("output".to_string(), Json::String(morph.output.clone()));
    if let Some(linked) = &morph.linked_params {
        obj.insert("linked".to_string(), linked_to_value(linked));
    }
    if !morph.children.is_empty() {
        obj.insert(
            "children".to_string(),
            Json::Array(morph.children.iter().map(morph_to_value).collect()),
        );
    }
    Json::Object(obj)
}

fn linked_to_value(linked: &LinkedParams) -> Json {
    json!({
        "params": linked.params.iter().map(Json::from).collect::<Vec<_>>(),
        "hash": linked
            .hash
            .iter()
            .map(|(k, v)| (k.clone(), Json::from(v)))
            .collect::<Map<String, Json>>(),
    })
}

pub fn morph_to_json(morph: &TextMorph, style: JsonStyle) -> String {
    write(&morph_to_value(morph), style)
}

/// Serialize validation errors as a JSON array of `{message, path, code}`.
pub fn validation_errors_to_json(errors: &[ValidationError]) -> String {
    serde_json::to_string(errors).unwrap_or_default()
}

fn write(json: &Json, style: JsonStyle) -> String {
    let written = match style {
        JsonStyle::Compact => serde_json::to_string(json),
        JsonStyle::Pretty => serde_json::to_string_pretty(json),
    };
    // Serializing a `serde_json::Value` with string keys cannot fail.
    written.unwrap_or_default()
}
