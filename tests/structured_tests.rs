use linkmark::render_structured_data;
use serde_json::{Value, json};
use spectral::assert_that;
use spectral::string::StrAssertions;

#[test]
fn end_to_end_recipe_with_referenced_video() {
    let input = vec![
        json!({
            "@type": "Recipe",
            "name": "Soup",
            "recipeIngredient": ["Water"],
            "video": {"@id": "v1"}
        }),
        json!({"@id": "v1", "@type": "VideoObject", "name": "How to make soup"}),
    ];

    let html = render_structured_data(&input);

    assert_that(&html).contains("Soup");
    assert_that(&html).contains("Water");
    assert_that(&html).contains("How to make soup");
    // The video is embedded in the recipe and must not repeat standalone.
    assert_that(&html.matches("How to make soup").count()).is_equal_to(1);
    assert_that(&html.contains("ld-videos")).is_equal_to(false);
}

#[test]
fn empty_input_renders_nothing() {
    assert_that(&render_structured_data(&[])).is_equal_to(String::new());
}

#[test]
fn graph_wrapped_recipe_is_rendered() {
    let input = vec![json!({
        "@context": "https://schema.org",
        "@graph": [{"@id": "r1", "@type": "Recipe", "name": "Bread"}]
    })];

    let html = render_structured_data(&input);
    assert_that(&html).contains("ld-recipes");
    assert_that(&html).contains("Bread");
}

#[test]
fn recipe_dedup_keeps_only_the_id_having_variant() {
    let input = vec![
        json!({"@type": "Recipe", "name": "Stew", "description": "fragment one"}),
        json!({"@id": "r1", "@type": "Recipe", "name": "Stew", "description": "canonical"}),
        json!({"@type": "Recipe", "name": "Stew", "description": "fragment two"}),
    ];

    let html = render_structured_data(&input);
    assert_that(&html).contains("canonical");
    assert_that(&html.contains("fragment one")).is_equal_to(false);
    assert_that(&html.contains("fragment two")).is_equal_to(false);
}

#[test]
fn same_named_recipes_with_ids_render_as_numbered_variants() {
    let input = vec![
        json!({"@id": "r1", "@type": "Recipe", "name": "Stew", "description": "slow cooker"}),
        json!({"@id": "r2", "@type": "Recipe", "name": "Stew", "description": "stovetop"}),
    ];

    let html = render_structured_data(&input);
    assert_that(&html).contains("Variant 1");
    assert_that(&html).contains("Variant 2");
    assert_that(&html).contains("slow cooker");
    assert_that(&html).contains("stovetop");
}

#[test]
fn unnamed_recipe_gets_the_default_label() {
    let input = vec![json!({"@type": "Recipe", "recipeIngredient": ["Salt"]})];
    let html = render_structured_data(&input);
    assert_that(&html).contains("Unnamed Recipe");
}

#[test]
fn comments_beyond_the_limit_collapse_behind_a_toggle() {
    let input: Vec<Value> = (0..10)
        .map(|i| {
            json!({
                "@type": "Comment",
                "text": format!("comment number {i}"),
                "dateCreated": format!("2024-01-{:02}", i + 1)
            })
        })
        .collect();

    let html = render_structured_data(&input);
    assert_that(&html).contains("Show 2 more comments");
    // Newest first: the last-dated comment leads.
    let newest = html.find("comment number 9").expect("newest comment missing");
    let oldest = html.find("comment number 0").expect("oldest comment missing");
    assert_that(&(newest < oldest)).is_equal_to(true);
}

#[test]
fn reviews_beyond_the_cap_are_summarized_as_a_count() {
    let input: Vec<Value> = (0..12)
        .map(|i| {
            json!({
                "@type": "Review",
                "reviewBody": format!("review number {i}"),
                "datePublished": format!("2024-02-{:02}", i + 1)
            })
        })
        .collect();

    let html = render_structured_data(&input);
    assert_that(&html).contains("and 2 more reviews");
}

#[test]
fn oversized_image_collections_render_no_image_section() {
    let input: Vec<Value> = (0..11)
        .map(|i| json!({"@type": "ImageObject", "url": format!("https://e.com/{i}.jpg")}))
        .collect();

    let html = render_structured_data(&input);
    assert_that(&html.contains("ld-images")).is_equal_to(false);
}

#[test]
fn small_images_are_suppressed_within_a_small_collection() {
    let input = vec![
        json!({"@type": "ImageObject", "url": "https://e.com/icon.png", "width": 50, "height": 50}),
        json!({"@type": "ImageObject", "url": "https://e.com/photo.jpg", "width": 1200, "height": 800}),
    ];

    let html = render_structured_data(&input);
    assert_that(&html).contains("photo.jpg");
    assert_that(&html.contains("icon.png")).is_equal_to(false);
}

#[test]
fn dimension_quantitative_values_never_reach_any_section() {
    let input = vec![json!({"@type": "QuantitativeValue", "name": "width", "value": 640})];
    assert_that(&render_structured_data(&input)).is_equal_to(String::new());
}

#[test]
fn questions_pair_with_answers_and_orphans_render_standalone() {
    let input = vec![
        json!({"@id": "q1", "@type": "Question", "name": "How long does it keep?"}),
        json!({"@type": "Answer", "parentItem": "q1", "text": "Three days refrigerated."}),
        json!({"@type": "Answer", "parentItem": "q404", "text": "An answer to nothing."}),
    ];

    let html = render_structured_data(&input);
    assert_that(&html).contains("How long does it keep?");
    assert_that(&html).contains("Three days refrigerated.");
    assert_that(&html).contains("Standalone answers");
    assert_that(&html).contains("An answer to nothing.");
}

#[test]
fn breadcrumbs_join_item_names() {
    let input = vec![json!({
        "@type": "BreadcrumbList",
        "itemListElement": [
            {"@type": "ListItem", "position": 1, "name": "Home"},
            {"@type": "ListItem", "position": 2, "item": {"name": "Recipes"}}
        ]
    })];

    let html = render_structured_data(&input);
    assert_that(&html).contains("Home › Recipes");
}

#[test]
fn unknown_types_render_generically_with_raw_details() {
    let input = vec![json!({"@type": "SpecialAnnouncement", "name": "Closed on Sundays"})];

    let html = render_structured_data(&input);
    assert_that(&html).contains("ld-other");
    assert_that(&html).contains("SpecialAnnouncement");
    assert_that(&html).contains("Closed on Sundays");
    assert_that(&html).contains("Raw data");
}

#[test]
fn nested_nutrition_contributes_to_both_recipe_and_nutrition_section() {
    let input = vec![json!({
        "@type": "Recipe",
        "name": "Soup",
        "nutrition": {"@type": "NutritionInformation", "calories": "120 kcal", "proteinContent": "4 g"}
    })];

    let html = render_structured_data(&input);
    assert_that(&html).contains("Calories: 120 kcal");
    assert_that(&html).contains("ld-nutrition");
}

#[test]
fn recipe_timings_use_the_duration_formatter() {
    let input = vec![json!({
        "@type": "Recipe",
        "name": "Bread",
        "prepTime": "PT20M",
        "cookTime": "PT1H30M"
    })];

    let html = render_structured_data(&input);
    assert_that(&html).contains("Prep: 20m");
    assert_that(&html).contains("Cook: 1h 30m");
}

#[test]
fn html_in_scraped_values_is_escaped() {
    let input = vec![json!({"@type": "Recipe", "name": "<script>alert(1)</script>"})];
    let html = render_structured_data(&input);
    assert_that(&html.contains("<script>")).is_equal_to(false);
    assert_that(&html).contains("&lt;script&gt;");
}
