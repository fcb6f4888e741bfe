//! Reference graph construction: flattens the raw scraped JSON-LD array,
//! unwraps `@graph` containers, and builds the page-local `@id` lookup table.

use std::collections::HashMap;

use log::debug;
use serde_json::Value;

use crate::structured::object_id;

/// The flattened object forest of one page plus its `@id` lookup table.
///
/// Rebuilt for every render call; `@id` uniqueness only holds within one
/// page's graph, so instances must never be shared across pages.
pub struct StructuredGraph {
    /// All top-level objects in first-seen order, `@graph` wrappers unwrapped.
    pub objects: Vec<Value>,
    /// `@id` to object mapping. Last write wins when an id repeats; repeats
    /// are assumed to be identical copies of the same object.
    pub lookup: HashMap<String, Value>,
}

/// Builds the reference graph from the raw `json_ld_objects` array.
///
/// Nested arrays of arbitrary depth are expanded in place preserving order,
/// nulls are dropped, and objects exposing an `@graph` array are replaced by
/// their children. Empty input yields an empty graph.
pub fn build_graph(json_ld_objects: &[Value]) -> StructuredGraph {
    let mut flat = Vec::new();
    flatten_into(json_ld_objects, &mut flat);

    let mut objects = Vec::new();
    for value in flat {
        objects.extend(unwrap_graph(value));
    }

    let mut lookup = HashMap::new();
    for object in &objects {
        if let Some(id) = object_id(object)
            && lookup.insert(id.to_string(), object.clone()).is_some()
        {
            debug!("Repeated @id \"{id}\" within one page graph; keeping the last occurrence");
        }
    }

    StructuredGraph { objects, lookup }
}

/// Expands nested arrays depth-first into `out`, preserving element order.
/// Nulls are dropped; every other value is kept as-is.
fn flatten_into(values: &[Value], out: &mut Vec<Value>) {
    for value in values {
        match value {
            Value::Array(items) => flatten_into(items, out),
            Value::Null => {}
            other => out.push(other.clone()),
        }
    }
}

/// Unwraps one level of `@graph`: a wrapper exposing an `@graph` array is
/// replaced by its children (themselves flattened); anything else is emitted
/// unchanged. A non-array `@graph` value is not a wrapper and is kept.
fn unwrap_graph(value: Value) -> Vec<Value> {
    let mut map = match value {
        Value::Object(map) => map,
        other => return vec![other],
    };

    match map.remove("@graph") {
        Some(Value::Array(children)) => {
            let mut flat = Vec::new();
            flatten_into(&children, &mut flat);
            flat
        }
        Some(other) => {
            map.insert("@graph".to_string(), other);
            vec![Value::Object(map)]
        }
        None => vec![Value::Object(map)],
    }
}
