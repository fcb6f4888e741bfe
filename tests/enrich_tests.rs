use crate::enrich_extras::StubChatProvider;
use spectral::assert_that;

mod enrich_extras;

assert_enrichments![
    tags_line_parsed:
        response => "Tags: rust, parsing\nA readable walkthrough of parser combinators.",
        tags => Some("rust, parsing"),
        summary => "A readable walkthrough of parser combinators.",
    think_block_removed:
        response => "<think>Let me read this page.</think>\nTags: soup\nA weeknight recipe page.",
        tags => Some("soup"),
        summary => "A weeknight recipe page.",
    lowercase_tags_prefix_accepted:
        response => "tags: baking\nSourdough basics.",
        tags => Some("baking"),
        summary => "Sourdough basics.",
    no_tags_line_is_all_summary:
        response => "Just a summary with no tag line.",
        tags => None::<&str>,
        summary => "Just a summary with no tag line.",
    empty_tags_line_yields_no_tags:
        response => "Tags:\nThe summary body.",
        tags => None::<&str>,
        summary => "The summary body.",
];
