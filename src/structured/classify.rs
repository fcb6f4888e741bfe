//! Type classification: walks the object forest recursively and buckets every
//! typed object into a fixed semantic category, dropping known-low-value noise
//! and collecting the video ids referenced by recipes along the way.

use std::collections::HashSet;

use serde_json::Value;

use crate::structured::{object_id, type_labels};

/// The fixed semantic categories a structured object can be assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Recipe,
    Review,
    Comment,
    Article,
    Video,
    Image,
    HowToStep,
    Question,
    Answer,
    Rating,
    Nutrition,
    Product,
    Entity,
    Event,
    Breadcrumb,
    Other,
}

/// Category precedence as data: evaluated top-to-bottom, so a multi-typed
/// object (e.g. `["Recipe", "Article"]`) takes the first matching category.
const CATEGORY_PRECEDENCE: &[(&[&str], Category)] = &[
    (&["Recipe"], Category::Recipe),
    (&["Review", "UserReview"], Category::Review),
    (&["Comment"], Category::Comment),
    (
        &["Article", "NewsArticle", "BlogPosting", "WebPage", "WebSite"],
        Category::Article,
    ),
    (&["VideoObject", "Clip"], Category::Video),
    (&["ImageObject"], Category::Image),
    (&["HowToStep", "HowToSection"], Category::HowToStep),
    (&["Question"], Category::Question),
    (&["Answer"], Category::Answer),
    (&["AggregateRating", "Rating"], Category::Rating),
    (&["NutritionInformation"], Category::Nutrition),
    (&["Product"], Category::Product),
    (
        &["Organization", "Person", "LocalBusiness"],
        Category::Entity,
    ),
    (&["Event"], Category::Event),
    (&["BreadcrumbList"], Category::Breadcrumb),
];

/// Type labels that are dropped outright instead of landing in `Other`:
/// breadcrumb children (already rendered through their list) and site-action
/// boilerplate that carries nothing worth showing.
const NOISE_TYPES: &[&str] = &["ListItem", "EntryPoint", "ReadAction", "SearchAction"];

/// Classifies one object by its `@type` labels. Untyped objects are inert and
/// known-low-value noise is dropped; both yield `None`. Any other typed
/// object falls through to [`Category::Other`].
pub fn category_of(value: &Value) -> Option<Category> {
    let labels = type_labels(value);
    if labels.is_empty() || is_noise(value, &labels) {
        return None;
    }

    for (names, category) in CATEGORY_PRECEDENCE {
        if labels.iter().any(|label| names.contains(label)) {
            return Some(*category);
        }
    }

    Some(Category::Other)
}

fn is_noise(value: &Value, labels: &[&str]) -> bool {
    if labels.iter().any(|label| NOISE_TYPES.contains(label)) {
        return true;
    }

    // Dimension boilerplate: QuantitativeValue entries named "width"/"height"
    // describe an image's pixel size, not content.
    labels.contains(&"QuantitativeValue")
        && value
            .get("name")
            .and_then(Value::as_str)
            .is_some_and(|name| name.eq_ignore_ascii_case("width") || name.eq_ignore_ascii_case("height"))
}

/// One page's classification result: per-category buckets in insertion order
/// plus the set of video ids already referenced by recipes.
#[derive(Default)]
pub struct Classified<'a> {
    pub recipes: Vec<&'a Value>,
    pub reviews: Vec<&'a Value>,
    pub comments: Vec<&'a Value>,
    pub articles: Vec<&'a Value>,
    pub videos: Vec<&'a Value>,
    pub images: Vec<&'a Value>,
    pub how_to_steps: Vec<&'a Value>,
    pub questions: Vec<&'a Value>,
    pub answers: Vec<&'a Value>,
    pub ratings: Vec<&'a Value>,
    pub nutrition: Vec<&'a Value>,
    pub products: Vec<&'a Value>,
    pub entities: Vec<&'a Value>,
    pub events: Vec<&'a Value>,
    pub breadcrumbs: Vec<&'a Value>,
    pub other: Vec<&'a Value>,
    /// Ids of videos embedded in a recipe's `video` property; standalone
    /// videos carrying one of these ids are suppressed at render time.
    pub video_exclusions: HashSet<String>,
}

impl<'a> Classified<'a> {
    fn push(&mut self, category: Category, value: &'a Value) {
        let bucket = match category {
            Category::Recipe => &mut self.recipes,
            Category::Review => &mut self.reviews,
            Category::Comment => &mut self.comments,
            Category::Article => &mut self.articles,
            Category::Video => &mut self.videos,
            Category::Image => &mut self.images,
            Category::HowToStep => &mut self.how_to_steps,
            Category::Question => &mut self.questions,
            Category::Answer => &mut self.answers,
            Category::Rating => &mut self.ratings,
            Category::Nutrition => &mut self.nutrition,
            Category::Product => &mut self.products,
            Category::Entity => &mut self.entities,
            Category::Event => &mut self.events,
            Category::Breadcrumb => &mut self.breadcrumbs,
            Category::Other => &mut self.other,
        };
        bucket.push(value);
    }
}

/// Classifies every object of the flattened forest, recursing into nested
/// property values in pre-order. Classification is stable: the same input
/// always yields the same buckets in the same order.
pub fn classify(objects: &[Value]) -> Classified<'_> {
    let mut classified = Classified::default();
    for object in objects {
        visit(object, &mut classified);
    }
    classified
}

/// Pre-order visitation. An object can be both classified and recursed into
/// (a Recipe with nested Nutrition contributes to both buckets); `@context`
/// subtrees are skipped.
fn visit<'a>(value: &'a Value, out: &mut Classified<'a>) {
    match value {
        Value::Array(items) => {
            for item in items {
                visit(item, out);
            }
        }
        Value::Object(map) => {
            if let Some(category) = category_of(value) {
                out.push(category, value);
                if category == Category::Recipe {
                    collect_video_ids(value, &mut out.video_exclusions);
                }
            }

            for (key, child) in map {
                if key == "@context" {
                    continue;
                }
                if matches!(child, Value::Object(_) | Value::Array(_)) {
                    visit(child, out);
                }
            }
        }
        _ => {}
    }
}

/// Collects every video id a recipe references through its `video` property,
/// whether the value is a string reference, a (partial) object, or an array
/// of either.
fn collect_video_ids(recipe: &Value, exclusions: &mut HashSet<String>) {
    let Some(video) = recipe.get("video") else {
        return;
    };

    let candidates: Vec<&Value> = match video {
        Value::Array(items) => items.iter().collect(),
        single => vec![single],
    };

    for candidate in candidates {
        let id = match candidate {
            Value::String(id) => Some(id.as_str()),
            Value::Object(_) => object_id(candidate),
            _ => None,
        };
        if let Some(id) = id {
            exclusions.insert(id.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::{Category, category_of, classify};

    #[test]
    fn multi_typed_objects_take_the_first_matching_category() {
        let object = json!({"@type": ["Recipe", "Article"], "name": "Soup"});
        assert_eq!(category_of(&object), Some(Category::Recipe));
    }

    #[test]
    fn unknown_types_fall_into_other() {
        let object = json!({"@type": "SpecialAnnouncement", "name": "x"});
        assert_eq!(category_of(&object), Some(Category::Other));
    }

    #[test]
    fn untyped_objects_are_inert() {
        assert_eq!(category_of(&json!({"name": "no type"})), None);
    }

    #[test]
    fn dimension_quantitative_values_are_dropped_everywhere() {
        let objects = vec![json!({"@type": "QuantitativeValue", "name": "width", "value": 640})];
        let classified = classify(&objects);
        assert!(classified.other.is_empty());
    }

    #[test]
    fn named_quantitative_values_survive_as_other() {
        let object = json!({"@type": "QuantitativeValue", "name": "servings", "value": 4});
        assert_eq!(category_of(&object), Some(Category::Other));
    }

    #[test]
    fn nested_typed_objects_are_classified_too() {
        let objects = vec![json!({
            "@type": "Recipe",
            "name": "Soup",
            "nutrition": {"@type": "NutritionInformation", "calories": "120 kcal"}
        })];
        let classified = classify(&objects);
        assert_eq!(classified.recipes.len(), 1);
        assert_eq!(classified.nutrition.len(), 1);
    }

    #[test]
    fn recipe_video_references_feed_the_exclusion_set() {
        let objects: Vec<Value> = vec![
            json!({"@type": "Recipe", "name": "A", "video": {"@id": "v1"}}),
            json!({"@type": "Recipe", "name": "B", "video": ["v2", {"@id": "v3"}]}),
        ];
        let classified = classify(&objects);
        for id in ["v1", "v2", "v3"] {
            assert!(classified.video_exclusions.contains(id), "missing {id}");
        }
    }
}
