//! De-duplication and grouping: collapses redundant recipe variants, groups
//! recipes by display name, aggregates and sorts comments, filters images,
//! and pairs questions with their answers.

use std::collections::HashSet;

use serde_json::Value;

use crate::constants::{IMAGE_COLLECTION_LIMIT, MIN_IMAGE_DIMENSION, UNNAMED_RECIPE_LABEL};
use crate::structured::resolve::ResolvedRecipe;
use crate::structured::{object_id, prop_text, scalar_text};

/// Collapses redundant recipe variants.
///
/// Pages often embed the same recipe both with and without an `@id`; when the
/// set has more than one member and at least one carries an id, only the
/// id-having ones are kept. When none carry an id there is no safe key and
/// all are kept. This is a heuristic, not a guarantee.
pub fn dedupe_recipes<'a>(recipes: &[&'a Value]) -> Vec<&'a Value> {
    if recipes.len() > 1 && recipes.iter().any(|recipe| object_id(recipe).is_some()) {
        recipes
            .iter()
            .copied()
            .filter(|recipe| object_id(recipe).is_some())
            .collect()
    } else {
        recipes.to_vec()
    }
}

/// A named cluster of recipe variants sharing a display name. Constructed
/// once per render pass, never persisted.
pub struct RecipeGroup<'a> {
    pub name: String,
    pub members: Vec<ResolvedRecipe<'a>>,
}

/// Groups surviving recipes by `name` in first-seen order; recipes without a
/// name share the "Unnamed Recipe" group.
pub fn group_recipes(resolved: Vec<ResolvedRecipe<'_>>) -> Vec<RecipeGroup<'_>> {
    let mut groups: Vec<RecipeGroup> = Vec::new();
    for recipe in resolved {
        let name = prop_text(recipe.recipe, "name")
            .unwrap_or_else(|| UNNAMED_RECIPE_LABEL.to_string());
        match groups.iter_mut().find(|group| group.name == name) {
            Some(group) => group.members.push(recipe),
            None => groups.push(RecipeGroup {
                name,
                members: vec![recipe],
            }),
        }
    }
    groups
}

/// Best-available date of a comment or review for sorting. ISO-8601 strings
/// sort correctly lexicographically; dateless items sort last.
fn best_date(value: &Value) -> String {
    prop_text(value, "dateCreated")
        .or_else(|| prop_text(value, "datePublished"))
        .unwrap_or_default()
}

/// Stable descending sort by `dateCreated` ?? `datePublished`.
pub fn sort_by_date_desc(items: &mut [&Value]) {
    items.sort_by(|a, b| best_date(b).cmp(&best_date(a)));
}

/// The render-time comment list: standalone comments plus every resolved
/// recipe comment, de-duplicated by id (or identity for id-less inline
/// comments) and sorted newest first.
pub fn collect_comments<'a>(
    standalone: &[&'a Value],
    recipes: &[ResolvedRecipe<'a>],
) -> Vec<&'a Value> {
    let mut comments: Vec<&Value> = standalone.to_vec();
    let mut seen_ids: HashSet<&str> = standalone.iter().filter_map(|c| object_id(c)).collect();

    for recipe in recipes {
        for comment in &recipe.comments {
            let duplicate = match object_id(comment) {
                Some(id) => !seen_ids.insert(id),
                None => comments.iter().any(|existing| std::ptr::eq(*existing, *comment)),
            };
            if !duplicate {
                comments.push(comment);
            }
        }
    }

    sort_by_date_desc(&mut comments);
    comments
}

/// Filters the image bucket for rendering. Collections larger than the limit
/// are suppressed entirely (galleries of icons/spacers); within the limit an
/// image is meaningful when a declared dimension reaches the minimum, or when
/// neither dimension is declared at all.
pub fn filter_images<'a>(images: &[&'a Value]) -> Vec<&'a Value> {
    if images.len() > IMAGE_COLLECTION_LIMIT {
        return Vec::new();
    }

    images
        .iter()
        .copied()
        .filter(|image| is_meaningful_image(image))
        .collect()
}

fn is_meaningful_image(image: &Value) -> bool {
    let width = dimension(image, "width");
    let height = dimension(image, "height");
    match (width, height) {
        (None, None) => true,
        (w, h) => {
            w.is_some_and(|w| w >= MIN_IMAGE_DIMENSION)
                || h.is_some_and(|h| h >= MIN_IMAGE_DIMENSION)
        }
    }
}

/// Reads a declared pixel dimension: a bare number, a numeric string
/// (optionally "px"-suffixed), or a QuantitativeValue object.
fn dimension(value: &Value, key: &str) -> Option<f64> {
    match value.get(key)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().trim_end_matches("px").trim().parse().ok(),
        Value::Object(map) => map
            .get("value")
            .and_then(scalar_text)
            .and_then(|text| text.trim().parse().ok()),
        _ => None,
    }
}

/// Questions paired with their answers, plus answers matching no question.
pub struct QaPairs<'a> {
    pub pairs: Vec<(&'a Value, Vec<&'a Value>)>,
    pub standalone_answers: Vec<&'a Value>,
}

/// Pairs each Answer with the Question whose id matches the answer's
/// `parentItem` (string or object form). Unmatched answers are kept as
/// standalone answers rather than dropped.
pub fn pair_questions<'a>(questions: &[&'a Value], answers: &[&'a Value]) -> QaPairs<'a> {
    let mut pairs: Vec<(&Value, Vec<&Value>)> =
        questions.iter().map(|question| (*question, Vec::new())).collect();
    let mut standalone_answers = Vec::new();

    for answer in answers {
        let matched = parent_id(answer).and_then(|pid| {
            pairs
                .iter_mut()
                .find(|(question, _)| object_id(question) == Some(pid))
        });
        match matched {
            Some((_, list)) => list.push(*answer),
            None => standalone_answers.push(*answer),
        }
    }

    QaPairs {
        pairs,
        standalone_answers,
    }
}

fn parent_id(answer: &Value) -> Option<&str> {
    match answer.get("parentItem")? {
        Value::String(id) => Some(id.as_str()),
        object @ Value::Object(_) => object_id(object),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::{dedupe_recipes, filter_images, pair_questions, sort_by_date_desc};

    #[test]
    fn mixed_id_recipes_keep_only_the_id_having_ones() {
        let with_id = json!({"@id": "r1", "@type": "Recipe", "name": "Soup"});
        let fragment_a = json!({"@type": "Recipe", "name": "Soup"});
        let fragment_b = json!({"@type": "Recipe"});
        let surviving = dedupe_recipes(&[&with_id, &fragment_a, &fragment_b]);
        assert_eq!(surviving, vec![&with_id]);
    }

    #[test]
    fn idless_recipes_are_all_kept() {
        let a = json!({"@type": "Recipe", "name": "A"});
        let b = json!({"@type": "Recipe", "name": "B"});
        let c = json!({"@type": "Recipe", "name": "C"});
        assert_eq!(dedupe_recipes(&[&a, &b, &c]).len(), 3);
    }

    #[test]
    fn single_recipe_is_kept_even_without_id() {
        let only = json!({"@type": "Recipe", "name": "A"});
        assert_eq!(dedupe_recipes(&[&only]).len(), 1);
    }

    #[test]
    fn comments_sort_newest_first_with_dateless_last() {
        let old = json!({"@type": "Comment", "dateCreated": "2023-01-01", "text": "old"});
        let new = json!({"@type": "Comment", "datePublished": "2024-06-01", "text": "new"});
        let undated = json!({"@type": "Comment", "text": "undated"});
        let mut comments: Vec<&Value> = vec![&old, &undated, &new];
        sort_by_date_desc(&mut comments);
        assert_eq!(comments, vec![&new, &old, &undated]);
    }

    #[test]
    fn small_images_are_excluded_and_undeclared_kept() {
        let icon = json!({"@type": "ImageObject", "width": 50, "height": 50});
        let photo = json!({"@type": "ImageObject", "width": 1200, "height": 50});
        let undeclared = json!({"@type": "ImageObject", "url": "x.jpg"});
        let kept = filter_images(&[&icon, &photo, &undeclared]);
        assert_eq!(kept, vec![&photo, &undeclared]);
    }

    #[test]
    fn oversized_image_collections_are_suppressed_entirely() {
        let images: Vec<Value> = (0..11)
            .map(|i| json!({"@type": "ImageObject", "url": format!("{i}.jpg")}))
            .collect();
        let refs: Vec<&Value> = images.iter().collect();
        assert!(filter_images(&refs).is_empty());
    }

    #[test]
    fn answers_pair_by_parent_item_and_orphans_stay_standalone() {
        let question = json!({"@id": "q1", "@type": "Question", "name": "Why?"});
        let paired = json!({"@type": "Answer", "parentItem": {"@id": "q1"}, "text": "Because."});
        let orphan = json!({"@type": "Answer", "parentItem": "q9", "text": "Lost."});
        let qa = pair_questions(&[&question], &[&paired, &orphan]);
        assert_eq!(qa.pairs.len(), 1);
        assert_eq!(qa.pairs.first().map(|(_, answers)| answers.len()), Some(1));
        assert_eq!(qa.standalone_answers, vec![&orphan]);
    }
}
