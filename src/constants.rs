pub const MODEL_API_KEY_ENV_NAME: &str = "LINKMARK_MODEL_API_KEY";

pub(crate) const THINK_STRIPPER: &str = r"<think>[\s\S]*</think>\s*";

pub(crate) const USER_AGENT: &str = "linkmark/0.1";

/// Display name for recipe variants that carry no `name` property.
pub(crate) const UNNAMED_RECIPE_LABEL: &str = "Unnamed Recipe";

/// Comments shown before the rest collapses behind an expand toggle.
pub(crate) const COMMENT_VISIBLE_LIMIT: usize = 8;

/// Reviews shown before the remainder is summarized as a count.
pub(crate) const REVIEW_VISIBLE_LIMIT: usize = 10;

/// Image collections larger than this render no image section at all.
pub(crate) const IMAGE_COLLECTION_LIMIT: usize = 10;

/// Images with a declared width or height below this are icons/spacers.
pub(crate) const MIN_IMAGE_DIMENSION: f64 = 200.0;

pub(crate) const DEFAULT_PROMPT_TEMPLATE: &str = r#"
You will see a saved webpage from {url} titled "{title}".
Write a two or three sentence summary for a personal link catalog,
and suggest up to five short lowercase topic tags.
Answer with a first line of the form "Tags: tag1, tag2" followed by
the summary on the following lines, nothing else.
Webpage content:"#;
