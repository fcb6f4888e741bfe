use linkmark::parse_link_list;
use spectral::assert_that;

#[test]
fn titled_lines_parse_title_tags_and_notes() {
    let markdown = "- [Parser combinators](https://example.com/parsers) #rust #parsing worth rereading\n";
    let entries = parse_link_list(markdown);

    assert_that(&entries.len()).is_equal_to(1);
    let entry = entries.first().expect("entry missing");
    assert_that(&entry.id).is_equal_to(1);
    assert_that(&entry.url.as_str()).is_equal_to("https://example.com/parsers");
    assert_that(&entry.title).is_equal_to(Some("Parser combinators".to_owned()));
    assert_that(&entry.tags).is_equal_to(vec!["rust".to_owned(), "parsing".to_owned()]);
    assert_that(&entry.notes).is_equal_to(Some("worth rereading".to_owned()));
}

#[test]
fn bare_url_lines_parse_without_title() {
    let markdown = "- https://example.com/other #later\n";
    let entries = parse_link_list(markdown);

    let entry = entries.first().expect("entry missing");
    assert_that(&entry.title).is_equal_to(None);
    assert_that(&entry.tags).is_equal_to(vec!["later".to_owned()]);
    assert_that(&entry.notes).is_equal_to(None);
}

#[test]
fn prose_and_malformed_lines_are_skipped() {
    let markdown = "\
# My links

Some prose about the list.
- not a url at all
- [broken](not-a-url)
- https://example.com/kept
";
    let entries = parse_link_list(markdown);

    assert_that(&entries.len()).is_equal_to(1);
    let entry = entries.first().expect("entry missing");
    assert_that(&entry.url.as_str()).is_equal_to("https://example.com/kept");
}

#[test]
fn ids_count_recognized_entries_only() {
    let markdown = "\
skipped prose
- https://example.com/a
- also skipped
- https://example.com/b
";
    let entries = parse_link_list(markdown);

    let ids: Vec<usize> = entries.iter().map(|entry| entry.id).collect();
    assert_that(&ids).is_equal_to(vec![1, 2]);
}

#[test]
fn empty_titles_are_treated_as_absent() {
    let markdown = "- [](https://example.com/untitled)\n";
    let entries = parse_link_list(markdown);

    let entry = entries.first().expect("entry missing");
    assert_that(&entry.title).is_equal_to(None);
}
