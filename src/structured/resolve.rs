//! Reference resolution: turns `@id` string references and partial objects
//! into the full objects from the page's lookup table.

use std::collections::HashMap;

use serde_json::Value;

use crate::structured::classify::{Category, category_of};
use crate::structured::object_id;

/// Resolves one reference value against the page's lookup table.
///
/// A string is looked up directly (`None` if absent); an object carrying an
/// `@id` returns the fuller looked-up object when one exists, otherwise the
/// object unchanged. Anything else non-null is kept as-is. Unresolvable
/// references are never dropped silently at this layer.
pub fn resolve_reference<'a>(
    value: &'a Value,
    lookup: &'a HashMap<String, Value>,
) -> Option<&'a Value> {
    match value {
        Value::String(id) => lookup.get(id.as_str()),
        Value::Object(_) => match object_id(value) {
            Some(id) => Some(lookup.get(id).unwrap_or(value)),
            None => Some(value),
        },
        Value::Null => None,
        other => Some(other),
    }
}

/// Resolves a scalar-or-array property value, discarding elements that
/// resolve to nothing.
pub fn resolve_references<'a>(
    value: &'a Value,
    lookup: &'a HashMap<String, Value>,
) -> Vec<&'a Value> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| resolve_reference(item, lookup))
            .collect(),
        single => resolve_reference(single, lookup).into_iter().collect(),
    }
}

/// A recipe together with its resolved `comment` and `video` properties.
///
/// An immutable companion structure: the underlying recipe object is never
/// annotated in place, so visiting the same object twice cannot alias.
pub struct ResolvedRecipe<'a> {
    pub recipe: &'a Value,
    pub comments: Vec<&'a Value>,
    pub videos: Vec<&'a Value>,
}

/// Resolves a recipe's `comment` and `video` references. Resolved videos are
/// filtered to the Video category: a reference may resolve to an unrelated
/// object and is discarded if so.
pub fn resolve_recipe<'a>(
    recipe: &'a Value,
    lookup: &'a HashMap<String, Value>,
) -> ResolvedRecipe<'a> {
    let comments = recipe
        .get("comment")
        .map(|value| resolve_references(value, lookup))
        .unwrap_or_default();

    let videos = recipe
        .get("video")
        .map(|value| resolve_references(value, lookup))
        .unwrap_or_default()
        .into_iter()
        .filter(|video| category_of(video) == Some(Category::Video))
        .collect();

    ResolvedRecipe {
        recipe,
        comments,
        videos,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::{Value, json};

    use super::{resolve_recipe, resolve_reference, resolve_references};

    fn lookup_with_video() -> HashMap<String, Value> {
        let mut lookup = HashMap::new();
        lookup.insert(
            "x".to_string(),
            json!({"@id": "x", "@type": "VideoObject", "name": "V"}),
        );
        lookup
    }

    #[test]
    fn string_references_resolve_through_the_lookup() {
        let lookup = lookup_with_video();
        let reference = json!("x");
        let resolved = resolve_reference(&reference, &lookup);
        assert_eq!(
            resolved.and_then(|v| v.get("name")),
            Some(&json!("V"))
        );
    }

    #[test]
    fn partial_objects_resolve_to_the_fuller_object() {
        let lookup = lookup_with_video();
        let recipe = json!({"@type": "Recipe", "name": "Soup", "video": {"@id": "x"}});
        let resolved = resolve_recipe(&recipe, &lookup);
        assert_eq!(
            resolved.videos,
            vec![&json!({"@id": "x", "@type": "VideoObject", "name": "V"})]
        );
    }

    #[test]
    fn unresolvable_object_references_are_kept_unchanged() {
        let lookup = HashMap::new();
        let reference = json!({"@id": "missing", "note": "partial"});
        assert_eq!(resolve_reference(&reference, &lookup), Some(&reference));
    }

    #[test]
    fn unresolvable_string_references_are_discarded_from_arrays() {
        let lookup = lookup_with_video();
        let references = json!(["x", "missing"]);
        let resolved = resolve_references(&references, &lookup);
        assert_eq!(resolved.len(), 1);
    }

    #[test]
    fn videos_resolving_to_non_video_objects_are_discarded() {
        let mut lookup = HashMap::new();
        lookup.insert("p".to_string(), json!({"@id": "p", "@type": "Person", "name": "Ann"}));
        let recipe = json!({"@type": "Recipe", "name": "Soup", "video": {"@id": "p"}});
        let resolved = resolve_recipe(&recipe, &lookup);
        assert!(resolved.videos.is_empty());
    }
}
