//! Per-category fragment renderers and the shared polymorphic format helpers.
//!
//! Every renderer is a pure function from classified objects to an HTML
//! fragment, and every helper is total: missing or malformed input degrades
//! to an omitted span or a generic fallback string, never a failure.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::constants::{COMMENT_VISIBLE_LIMIT, REVIEW_VISIBLE_LIMIT};
use crate::structured::classify::Classified;
use crate::structured::dedupe::{QaPairs, RecipeGroup, filter_images, pair_questions, sort_by_date_desc};
use crate::structured::resolve::ResolvedRecipe;
use crate::structured::{object_id, prop_text, scalar_text, type_labels};

/// Concatenates all section fragments in the fixed output order. Empty
/// categories contribute nothing.
pub fn render_sections(
    groups: &[RecipeGroup<'_>],
    classified: &Classified<'_>,
    comments: Vec<&Value>,
) -> String {
    let qa = pair_questions(&classified.questions, &classified.answers);
    let images = filter_images(&classified.images);

    let sections = [
        render_recipes(groups),
        list_section("breadcrumbs", "Breadcrumbs", &classified.breadcrumbs, render_breadcrumb),
        render_reviews(&classified.reviews),
        list_section("ratings", "Ratings", &classified.ratings, render_rating),
        render_videos(&classified.videos, &classified.video_exclusions),
        render_comments(&comments),
        render_how_to_steps(&classified.how_to_steps),
        list_section("images", "Images", &images, render_image),
        render_qa(&qa),
        list_section("nutrition", "Nutrition", &classified.nutrition, render_nutrition),
        list_section("articles", "Articles", &classified.articles, render_article),
        list_section("products", "Products", &classified.products, render_product),
        list_section("entities", "People &amp; Organizations", &classified.entities, render_entity),
        list_section("events", "Events", &classified.events, render_event),
        list_section("other", "Other structured data", &classified.other, render_other),
    ];

    sections.concat()
}

/// Wraps a non-empty body in a section element; empty bodies vanish.
fn section(class: &str, heading: &str, body: String) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!("<section class=\"ld-{class}\"><h3>{heading}</h3>\n{body}</section>\n")
    }
}

fn list_section(
    class: &str,
    heading: &str,
    items: &[&Value],
    render_item: fn(&Value) -> String,
) -> String {
    let body: String = items.iter().copied().map(render_item).collect();
    section(class, heading, body)
}

fn push_para(out: &mut String, class: &str, text: Option<String>) {
    if let Some(text) = text {
        out.push_str(&format!("<p class=\"ld-{class}\">{}</p>", escape_html(&text)));
    }
}

// --- recipes -----------------------------------------------------------

fn render_recipes(groups: &[RecipeGroup<'_>]) -> String {
    let body: String = groups.iter().map(render_recipe_group).collect();
    section("recipes", "Recipes", body)
}

fn render_recipe_group(group: &RecipeGroup<'_>) -> String {
    match group.members.as_slice() {
        [only] => format!(
            "<article class=\"ld-recipe\"><h4>{}</h4>{}</article>\n",
            escape_html(&group.name),
            recipe_body(only)
        ),
        members => {
            let variants: String = members
                .iter()
                .enumerate()
                .map(|(index, member)| {
                    format!(
                        "<div class=\"ld-recipe-variant\"><h5>Variant {}</h5>{}</div>\n",
                        index + 1,
                        recipe_body(member)
                    )
                })
                .collect();
            format!(
                "<article class=\"ld-recipe-group\"><h4>{}</h4>{}</article>\n",
                escape_html(&group.name),
                variants
            )
        }
    }
}

fn recipe_body(resolved: &ResolvedRecipe<'_>) -> String {
    let recipe = resolved.recipe;
    let mut out = String::new();

    push_para(&mut out, "description", prop_text(recipe, "description"));
    if let Some(author) = recipe.get("author") {
        push_para(&mut out, "author", Some(format!("By {}", format_person(author))));
    }

    let timings: Vec<String> = [("Prep", "prepTime"), ("Cook", "cookTime"), ("Total", "totalTime")]
        .iter()
        .filter_map(|(label, key)| {
            prop_text(recipe, key).map(|raw| format!("{label}: {}", format_duration(&raw)))
        })
        .collect();
    if !timings.is_empty() {
        push_para(&mut out, "times", Some(timings.join(" · ")));
    }
    push_para(&mut out, "yield", prop_text(recipe, "recipeYield").map(|y| format!("Yield: {y}")));

    out.push_str(&render_ingredients(recipe));
    out.push_str(&render_instructions(recipe.get("recipeInstructions")));

    if let Some(rating) = recipe.get("aggregateRating") {
        push_para(&mut out, "rating", Some(format_rating(rating)));
    }
    if let Some(nutrition) = recipe.get("nutrition") {
        push_para(
            &mut out,
            "calories",
            prop_text(nutrition, "calories").map(|c| format!("Calories: {c}")),
        );
    }

    for video in &resolved.videos {
        out.push_str(&render_video_item(video));
    }

    out
}

fn render_ingredients(recipe: &Value) -> String {
    // "ingredients" is the pre-2013 spelling still seen in the wild.
    let value = recipe
        .get("recipeIngredient")
        .or_else(|| recipe.get("ingredients"));
    let Some(Value::Array(items)) = value else {
        return String::new();
    };

    let rows: String = items
        .iter()
        .filter_map(scalar_text)
        .map(|text| format!("<li>{}</li>", escape_html(&text)))
        .collect();
    if rows.is_empty() {
        String::new()
    } else {
        format!("<ul class=\"ld-ingredients\">{rows}</ul>")
    }
}

fn render_instructions(value: Option<&Value>) -> String {
    let Some(value) = value else {
        return String::new();
    };

    let mut steps = Vec::new();
    instruction_steps(value, &mut steps);
    let rows: String = steps
        .iter()
        .map(|step| format!("<li>{}</li>", escape_html(step)))
        .collect();
    if rows.is_empty() {
        String::new()
    } else {
        format!("<ol class=\"ld-instructions\">{rows}</ol>")
    }
}

/// Collects instruction step texts from the polymorphic `recipeInstructions`
/// shapes: a bare string, an array of strings or HowToStep objects, or
/// HowToSection containers with nested `itemListElement` lists.
fn instruction_steps(value: &Value, steps: &mut Vec<String>) {
    match value {
        Value::String(text) => steps.push(text.clone()),
        Value::Array(items) => {
            for item in items {
                instruction_steps(item, steps);
            }
        }
        Value::Object(_) => {
            if let Some(children) = value.get("itemListElement") {
                instruction_steps(children, steps);
            } else if let Some(text) = prop_text(value, "text").or_else(|| prop_text(value, "name")) {
                steps.push(text);
            }
        }
        _ => {}
    }
}

// --- breadcrumbs, reviews, ratings -------------------------------------

fn render_breadcrumb(list: &Value) -> String {
    let Some(Value::Array(items)) = list.get("itemListElement") else {
        return String::new();
    };

    let names: Vec<String> = items
        .iter()
        .filter_map(|item| {
            prop_text(item, "name").or_else(|| item.get("item").and_then(|i| prop_text(i, "name")))
        })
        .collect();
    if names.is_empty() {
        String::new()
    } else {
        format!("<p class=\"ld-breadcrumb\">{}</p>\n", escape_html(&names.join(" › ")))
    }
}

fn render_reviews(reviews: &[&Value]) -> String {
    let mut sorted = reviews.to_vec();
    sort_by_date_desc(&mut sorted);

    let mut body: String = sorted
        .iter()
        .take(REVIEW_VISIBLE_LIMIT)
        .copied()
        .map(render_review)
        .collect();
    let hidden = sorted.len().saturating_sub(REVIEW_VISIBLE_LIMIT);
    if hidden > 0 {
        body.push_str(&format!("<p class=\"ld-more\">…and {hidden} more reviews</p>\n"));
    }
    section("reviews", "Reviews", body)
}

fn render_review(review: &Value) -> String {
    let mut out = String::from("<div class=\"ld-review\">");
    if let Some(author) = review.get("author") {
        out.push_str(&format!("<strong>{}</strong>", escape_html(&format_person(author))));
    }
    if let Some(rating) = review.get("reviewRating") {
        out.push_str(&format!(" <span class=\"ld-stars\">{}</span>", escape_html(&format_rating(rating))));
    }
    push_para(
        &mut out,
        "date",
        prop_text(review, "datePublished").or_else(|| prop_text(review, "dateCreated")),
    );
    push_para(
        &mut out,
        "body",
        prop_text(review, "reviewBody").or_else(|| prop_text(review, "description")),
    );
    out.push_str("</div>\n");
    out
}

fn render_rating(rating: &Value) -> String {
    let mut parts = vec![format_rating(rating)];
    if let Some(count) = prop_text(rating, "ratingCount").or_else(|| prop_text(rating, "reviewCount")) {
        parts.push(format!("({count} ratings)"));
    }
    format!("<p class=\"ld-rating\">{}</p>\n", escape_html(&parts.join(" ")))
}

// --- videos and comments -----------------------------------------------

fn render_videos(videos: &[&Value], exclusions: &HashSet<String>) -> String {
    let body: String = videos
        .iter()
        .filter(|video| object_id(video).is_none_or(|id| !exclusions.contains(id)))
        .map(|video| render_video_item(video))
        .collect();
    section("videos", "Videos", body)
}

fn render_video_item(video: &Value) -> String {
    let mut out = String::from("<div class=\"ld-video\">");
    if let Some(name) = prop_text(video, "name") {
        out.push_str(&format!("<strong>{}</strong>", escape_html(&name)));
    }
    if let Some(duration) = prop_text(video, "duration") {
        out.push_str(&format!(" <span class=\"ld-duration\">{}</span>", escape_html(&format_duration(&duration))));
    }
    push_para(&mut out, "date", prop_text(video, "uploadDate"));
    push_para(&mut out, "description", prop_text(video, "description"));
    if let Some(link) = prop_text(video, "contentUrl").or_else(|| prop_text(video, "embedUrl")) {
        out.push_str(&format!("<a href=\"{}\">Watch</a>", escape_html(&link)));
    }
    out.push_str("</div>\n");
    out
}

fn render_comments(comments: &[&Value]) -> String {
    let mut body: String = comments
        .iter()
        .take(COMMENT_VISIBLE_LIMIT)
        .copied()
        .map(render_comment)
        .collect();

    let hidden: Vec<&Value> = comments.iter().skip(COMMENT_VISIBLE_LIMIT).copied().collect();
    if !hidden.is_empty() {
        let rest: String = hidden.iter().copied().map(render_comment).collect();
        body.push_str(&format!(
            "<details class=\"ld-more-comments\"><summary>Show {} more comments</summary>\n{rest}</details>\n",
            hidden.len()
        ));
    }
    section("comments", "Comments", body)
}

fn render_comment(comment: &Value) -> String {
    let mut out = String::from("<div class=\"ld-comment\">");
    if let Some(author) = comment.get("author") {
        out.push_str(&format!("<strong>{}</strong>", escape_html(&format_person(author))));
    }
    push_para(
        &mut out,
        "date",
        prop_text(comment, "dateCreated").or_else(|| prop_text(comment, "datePublished")),
    );
    push_para(
        &mut out,
        "text",
        prop_text(comment, "text").or_else(|| prop_text(comment, "description")),
    );
    out.push_str("</div>\n");
    out
}

// --- remaining sections ------------------------------------------------

fn render_how_to_steps(steps: &[&Value]) -> String {
    let rows: String = steps
        .iter()
        .filter_map(|step| prop_text(step, "text").or_else(|| prop_text(step, "name")))
        .map(|text| format!("<li>{}</li>", escape_html(&text)))
        .collect();
    if rows.is_empty() {
        String::new()
    } else {
        section("howto", "How-To Steps", format!("<ol>{rows}</ol>\n"))
    }
}

fn render_image(image: &Value) -> String {
    let url = prop_text(image, "url").or_else(|| prop_text(image, "contentUrl"));
    let caption = prop_text(image, "caption").or_else(|| prop_text(image, "name"));

    let Some(url) = url else {
        return String::new();
    };
    let caption_html = caption
        .map(|text| format!("<figcaption>{}</figcaption>", escape_html(&text)))
        .unwrap_or_default();
    format!(
        "<figure class=\"ld-image\"><img src=\"{}\" loading=\"lazy\">{caption_html}</figure>\n",
        escape_html(&url)
    )
}

fn render_qa(qa: &QaPairs<'_>) -> String {
    let mut body = String::new();
    for (question, answers) in &qa.pairs {
        body.push_str(&render_question(question, answers));
    }
    if !qa.standalone_answers.is_empty() {
        body.push_str("<div class=\"ld-standalone-answers\"><h4>Standalone answers</h4>\n");
        for answer in &qa.standalone_answers {
            body.push_str(&render_answer(answer));
        }
        body.push_str("</div>\n");
    }
    section("qa", "Q&amp;A", body)
}

fn render_question(question: &Value, answers: &[&Value]) -> String {
    let mut out = String::from("<div class=\"ld-question\">");
    if let Some(name) = prop_text(question, "name").or_else(|| prop_text(question, "text")) {
        out.push_str(&format!("<strong>{}</strong>", escape_html(&name)));
    }
    for answer in answers {
        out.push_str(&render_answer(answer));
    }
    out.push_str("</div>\n");
    out
}

fn render_answer(answer: &Value) -> String {
    let mut out = String::from("<div class=\"ld-answer\">");
    push_para(
        &mut out,
        "text",
        prop_text(answer, "text").or_else(|| prop_text(answer, "name")),
    );
    if let Some(author) = answer.get("author") {
        push_para(&mut out, "author", Some(format!("— {}", format_person(author))));
    }
    out.push_str("</div>\n");
    out
}

const NUTRITION_FIELDS: &[(&str, &str)] = &[
    ("calories", "Calories"),
    ("fatContent", "Fat"),
    ("saturatedFatContent", "Saturated fat"),
    ("carbohydrateContent", "Carbohydrates"),
    ("sugarContent", "Sugar"),
    ("proteinContent", "Protein"),
    ("sodiumContent", "Sodium"),
    ("fiberContent", "Fiber"),
    ("servingSize", "Serving size"),
];

fn render_nutrition(nutrition: &Value) -> String {
    let parts: Vec<String> = NUTRITION_FIELDS
        .iter()
        .filter_map(|(key, label)| prop_text(nutrition, key).map(|text| format!("{label}: {text}")))
        .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!("<p class=\"ld-nutrition\">{}</p>\n", escape_html(&parts.join(" · ")))
    }
}

fn render_article(article: &Value) -> String {
    let mut out = String::from("<div class=\"ld-article\">");
    if let Some(headline) = prop_text(article, "headline").or_else(|| prop_text(article, "name")) {
        out.push_str(&format!("<strong>{}</strong>", escape_html(&headline)));
    }
    if let Some(author) = article.get("author") {
        push_para(&mut out, "author", Some(format!("By {}", format_person(author))));
    }
    if let Some(publisher) = article.get("publisher") {
        push_para(&mut out, "publisher", Some(format_person(publisher)));
    }
    push_para(&mut out, "date", prop_text(article, "datePublished"));
    push_para(&mut out, "description", prop_text(article, "description"));
    out.push_str("</div>\n");
    out
}

fn render_product(product: &Value) -> String {
    let mut out = String::from("<div class=\"ld-product\">");
    if let Some(name) = prop_text(product, "name") {
        out.push_str(&format!("<strong>{}</strong>", escape_html(&name)));
    }
    if let Some(brand) = product.get("brand") {
        push_para(&mut out, "brand", Some(format_person(brand)));
    }
    if let Some(offers) = product.get("offers") {
        push_para(&mut out, "price", Some(format_price(offers)));
    }
    if let Some(rating) = product.get("aggregateRating") {
        push_para(&mut out, "rating", Some(format_rating(rating)));
    }
    push_para(&mut out, "description", prop_text(product, "description"));
    out.push_str("</div>\n");
    out
}

fn render_entity(entity: &Value) -> String {
    let mut out = String::from("<div class=\"ld-entity\">");
    if let Some(name) = prop_text(entity, "name") {
        out.push_str(&format!("<strong>{}</strong>", escape_html(&name)));
    }
    let labels = type_labels(entity).join(", ");
    if !labels.is_empty() {
        out.push_str(&format!(" <span class=\"ld-kind\">({})</span>", escape_html(&labels)));
    }
    push_para(&mut out, "url", prop_text(entity, "url"));
    push_para(&mut out, "description", prop_text(entity, "description"));
    out.push_str("</div>\n");
    out
}

fn render_event(event: &Value) -> String {
    let mut out = String::from("<div class=\"ld-event\">");
    if let Some(name) = prop_text(event, "name") {
        out.push_str(&format!("<strong>{}</strong>", escape_html(&name)));
    }
    push_para(&mut out, "date", prop_text(event, "startDate"));
    if let Some(location) = event.get("location") {
        push_para(&mut out, "location", Some(format_location(location)));
    }
    push_para(&mut out, "description", prop_text(event, "description"));
    out.push_str("</div>\n");
    out
}

/// Generic renderer for unmodeled types: type labels, the scalar properties
/// as a key/value list, and the raw JSON behind a details toggle so nothing
/// is silently lost.
fn render_other(object: &Value) -> String {
    let labels = type_labels(object).join(", ");
    let mut out = format!("<div class=\"ld-other\"><strong>{}</strong>", escape_html(&labels));

    if let Value::Object(map) = object {
        let rows: String = map
            .iter()
            .filter(|(key, _)| !key.starts_with('@'))
            .filter_map(|(key, value)| {
                scalar_text(value).map(|text| format!("<li>{}: {}</li>", escape_html(key), escape_html(&text)))
            })
            .collect();
        if !rows.is_empty() {
            out.push_str(&format!("<ul>{rows}</ul>"));
        }
    }

    let raw = serde_json::to_string_pretty(object).unwrap_or_default();
    out.push_str(&format!(
        "<details><summary>Raw data</summary><pre>{}</pre></details></div>\n",
        escape_html(&raw)
    ));
    out
}

// --- format helpers ----------------------------------------------------

static DURATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?$").expect("Failed to compile DURATION_PATTERN regex")
});

/// Formats an ISO-8601 duration of the restricted `PT[nH][nM]` form as
/// "{n}h {n}m". Anything else is passed through unchanged.
pub fn format_duration(raw: &str) -> String {
    let Some(captures) = DURATION_PATTERN.captures(raw) else {
        return raw.to_string();
    };

    let mut out = String::new();
    if let Some(hours) = captures.get(1) {
        out.push_str(hours.as_str());
        out.push_str("h ");
    }
    if let Some(minutes) = captures.get(2) {
        out.push_str(minutes.as_str());
        out.push('m');
    }
    if out.is_empty() { raw.to_string() } else { out }
}

/// Formats a polymorphic author/publisher/brand value: a string, an object
/// with `name`, or an array joined with ", ". Falls back to "Unknown".
pub fn format_person(value: &Value) -> String {
    match value {
        Value::String(name) => name.clone(),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(format_person).collect();
            if parts.is_empty() {
                "Unknown".to_string()
            } else {
                parts.join(", ")
            }
        }
        Value::Object(_) => prop_text(value, "name").unwrap_or_else(|| "Unknown".to_string()),
        _ => "Unknown".to_string(),
    }
}

/// Formats an offers object or array (first element used). Prefers
/// `price` + `priceCurrency`, falls back to the bare price, else
/// "Price available".
pub fn format_price(offers: &Value) -> String {
    let offer = match offers {
        Value::Array(items) => items.first().unwrap_or(offers),
        single => single,
    };

    let price = prop_text(offer, "price");
    let currency = prop_text(offer, "priceCurrency");
    match (price, currency) {
        (Some(price), Some(currency)) => format!("{price} {currency}"),
        (Some(price), None) => price,
        _ => "Price available".to_string(),
    }
}

/// Formats a rating object. Prefers `ratingValue`/`bestRating`, falls back
/// to the bare value, else "Rated".
pub fn format_rating(rating: &Value) -> String {
    let value = prop_text(rating, "ratingValue");
    let best = prop_text(rating, "bestRating");
    match (value, best) {
        (Some(value), Some(best)) => format!("{value}/{best}"),
        (Some(value), None) => value,
        _ => "Rated".to_string(),
    }
}

/// Formats a location value: a string, an object with `name`, or an object
/// with a string or structured `address`. Falls back to "Location available".
pub fn format_location(value: &Value) -> String {
    match value {
        Value::String(name) => name.clone(),
        Value::Object(_) => prop_text(value, "name")
            .or_else(|| value.get("address").and_then(format_address))
            .unwrap_or_else(|| "Location available".to_string()),
        _ => "Location available".to_string(),
    }
}

fn format_address(address: &Value) -> Option<String> {
    match address {
        Value::String(text) => Some(text.clone()),
        Value::Object(_) => {
            let parts: Vec<String> = [
                "streetAddress",
                "addressLocality",
                "addressRegion",
                "postalCode",
                "addressCountry",
            ]
            .iter()
            .filter_map(|key| prop_text(address, key))
            .collect();
            if parts.is_empty() { None } else { Some(parts.join(", ")) }
        }
        _ => None,
    }
}

/// Escapes text for safe inclusion in HTML bodies and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
