//! The structured module normalizes JSON-LD structured data scraped from a
//! single page into a de-duplicated, cross-reference-resolved rendering model
//! and renders it as one HTML fragment.
//!
//! The pipeline is pure and page-scoped: every call rebuilds the reference
//! graph, classification buckets, and exclusion sets from scratch and discards
//! them afterwards. `@id` values are only unique within one page's graph, so
//! nothing here may be cached across calls.

pub mod classify;
pub mod dedupe;
pub mod graph;
pub mod render;
pub mod resolve;

use serde_json::Value;

use classify::classify;
use dedupe::{collect_comments, dedupe_recipes, group_recipes};
use graph::build_graph;
use resolve::{ResolvedRecipe, resolve_recipe};

/// Renders the structured data of one scraped page into an HTML fragment.
///
/// Accepts the raw `json_ld_objects` array as scraped (possibly containing
/// nested arrays and `@graph` wrappers) and returns the concatenated section
/// fragments in fixed order. Absent or empty input yields an empty string;
/// malformed objects degrade field-by-field rather than failing the render.
pub fn render_structured_data(json_ld_objects: &[Value]) -> String {
    let graph = build_graph(json_ld_objects);
    let classified = classify(&graph.objects);

    let surviving = dedupe_recipes(&classified.recipes);
    let resolved: Vec<ResolvedRecipe> = surviving
        .iter()
        .map(|recipe| resolve_recipe(recipe, &graph.lookup))
        .collect();
    let comments = collect_comments(&classified.comments, &resolved);
    let groups = group_recipes(resolved);

    render::render_sections(&groups, &classified, comments)
}

/// Returns the `@id` of an object, if it carries one.
pub fn object_id(value: &Value) -> Option<&str> {
    value.get("@id").and_then(Value::as_str)
}

/// Returns the `@type` labels of an object. A single string label and an
/// array of string labels are both accepted; anything else yields no labels.
pub fn type_labels(value: &Value) -> Vec<&str> {
    match value.get("@type") {
        Some(Value::String(label)) => vec![label.as_str()],
        Some(Value::Array(labels)) => labels.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// Renders a scalar JSON value as display text. Objects and arrays yield
/// nothing; absent values are the caller's concern.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Looks up a property and renders it as display text. Array values are
/// joined with ", " from their scalar elements.
pub(crate) fn prop_text(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(scalar_text).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        scalar => scalar_text(scalar),
    }
}
