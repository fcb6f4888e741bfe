//! The linklist module parses the hand-edited markdown link list.
//!
//! Recognized line shapes:
//!
//! ```text
//! - [Some title](https://example.com/post) #rust #cooking worth rereading
//! - https://example.com/other #later
//! ```
//!
//! Everything else (prose, headings, list lines without a parsable URL) is
//! skipped; parsing never fails on malformed lines.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static TITLED_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[-*]\s+\[(?P<title>[^\]]*)\]\((?P<url>[^)\s]+)\)\s*(?P<rest>.*)$")
        .expect("Failed to compile TITLED_LINE regex")
});

static BARE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[-*]\s+(?P<url>https?://\S+)\s*(?P<rest>.*)$")
        .expect("Failed to compile BARE_LINE regex")
});

/// One entry of the markdown link list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    /// 1-based position among recognized entries.
    pub id: usize,
    pub url: Url,
    /// The `[title]` of a titled line, if non-empty.
    pub title: Option<String>,
    /// `#tag` tokens after the URL, without the hash.
    pub tags: Vec<String>,
    /// Free-form text after the URL that is not a tag.
    pub notes: Option<String>,
}

/// Parses the markdown link list into entries, skipping unrecognized lines.
pub fn parse_link_list(markdown: &str) -> Vec<LinkEntry> {
    let mut entries = Vec::new();
    for line in markdown.lines() {
        if let Some(entry) = parse_line(line, entries.len() + 1) {
            entries.push(entry);
        } else if !line.trim().is_empty() {
            debug!("Skipping link-list line: {line}");
        }
    }
    entries
}

fn parse_line(line: &str, id: usize) -> Option<LinkEntry> {
    let (raw_url, title, rest) = if let Some(captures) = TITLED_LINE.captures(line) {
        let title = captures.name("title")?.as_str().trim();
        (
            captures.name("url")?.as_str(),
            (!title.is_empty()).then(|| title.to_string()),
            captures.name("rest").map_or("", |m| m.as_str()),
        )
    } else if let Some(captures) = BARE_LINE.captures(line) {
        (
            captures.name("url")?.as_str(),
            None,
            captures.name("rest").map_or("", |m| m.as_str()),
        )
    } else {
        return None;
    };

    let url = Url::parse(raw_url).ok()?;
    let (tags, notes) = split_tags_and_notes(rest);

    Some(LinkEntry {
        id,
        url,
        title,
        tags,
        notes,
    })
}

/// Splits the text after the URL into `#tag` tokens and free-form notes.
/// Tags and note words may be interleaved; word order within the notes is
/// preserved.
fn split_tags_and_notes(rest: &str) -> (Vec<String>, Option<String>) {
    let mut tags = Vec::new();
    let mut note_words = Vec::new();

    for token in rest.split_whitespace() {
        match token.strip_prefix('#') {
            Some(tag) if !tag.is_empty() => tags.push(tag.to_string()),
            _ => note_words.push(token),
        }
    }

    let notes = if note_words.is_empty() {
        None
    } else {
        Some(note_words.join(" "))
    };
    (tags, notes)
}
