//! The scrape module fetches every link-list entry and extracts the readable
//! bits of each page: title, meta description, a crude text rendition for the
//! enricher, and every JSON-LD script-tag payload.

use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector as ScraperSelector};
use serde_json::Value;

use crate::constants::USER_AGENT;
use crate::linklist::{LinkEntry, parse_link_list};
use crate::storage::{Article, Storage};

static JSON_LD_SCRIPT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("Failed to compile JSON_LD_SCRIPT regex")
});

static TAG_STRIPPER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>|<[^>]+>")
        .expect("Failed to compile TAG_STRIPPER regex")
});

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Failed to compile WHITESPACE regex"));

/// Cap on the stored text rendition; the enricher does not need more.
const CONTENT_CAP: usize = 8000;

/// What the extractor pulls out of one fetched page.
#[derive(Debug)]
pub struct PageExtract {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub json_ld_objects: Vec<Value>,
}

/// Scrapes every entry of a markdown link list into the database.
///
/// Entries already stored are skipped unless `refresh` is set. Fetch and
/// parse failures are logged and the loop continues with the next entry.
/// After a full pass, stored articles whose URL is no longer listed are
/// removed.
///
/// # Arguments
///
/// * `links_path` - Path to the markdown link list
/// * `db_path` - Path to the database where articles will be stored
/// * `delay` - Delay between requests in milliseconds
/// * `refresh` - Re-fetch entries that are already stored
///
/// # Errors
///
/// Returns an error if:
/// * The link list cannot be read
/// * The HTTP client cannot be constructed
/// * Database operations fail
pub async fn scrape_links(links_path: &str, db_path: &str, delay: u64, refresh: bool) -> Result<()> {
    let markdown = std::fs::read_to_string(links_path)
        .context(format!("Failed to read link list: {links_path}"))?;
    let entries = parse_link_list(&markdown);
    if entries.is_empty() {
        warn!("No link entries found in {links_path}");
    }

    let storage = Storage::new(db_path)?;
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("Unable to build HTTP client")?;

    let mut scraped_count = 0;
    for entry in &entries {
        if !refresh && storage.get_article(entry.url.as_str())?.is_some() {
            debug!("Skipping already stored {}", entry.url);
            continue;
        }

        if scraped_count > 0 && delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        match fetch_page(&client, entry).await {
            Ok(Some(article)) => {
                storage.upsert_article(&article)?;
                scraped_count += 1;
                info!("Scraped {}", entry.url);
            }
            Ok(None) => {}
            Err(fetch_error) => {
                error!("Error fetching {}: {fetch_error}", entry.url);
            }
        }
    }

    let listed: Vec<String> = entries.iter().map(|e| e.url.to_string()).collect();
    let removed = storage.remove_unlisted(listed)?;
    if removed > 0 {
        info!("Removed {removed} articles no longer in the link list");
    }

    info!("Scraped {scraped_count}/{} entries", entries.len());
    Ok(())
}

async fn fetch_page(client: &reqwest::Client, entry: &LinkEntry) -> Result<Option<Article>> {
    let response = client.get(entry.url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        warn!("Skipping {} as {status}", entry.url);
        return Ok(None);
    }

    let html = response.text().await?;
    let extract = extract_page(&html);

    Ok(Some(Article {
        url: entry.url.clone(),
        entry_id: entry.id as i64,
        added_at: chrono::Utc::now(),
        user_title: entry.title.clone(),
        user_tags: entry.tags.clone(),
        user_notes: entry.notes.clone(),
        title: extract.title,
        description: extract.description,
        content: extract.content,
        json_ld_objects: Some(extract.json_ld_objects),
        llm_tags: None,
        summary: None,
    }))
}

/// Extracts title, description, text content, and JSON-LD payloads from one
/// page's HTML.
pub fn extract_page(html: &str) -> PageExtract {
    let document = Html::parse_document(html);

    PageExtract {
        title: extract_title(&document),
        description: extract_description(&document),
        content: extract_content(html),
        json_ld_objects: extract_json_ld(html),
    }
}

/// Parses the title from the document: `<title>`, falling back to the first
/// `h1` or `h2`.
fn extract_title(document: &Html) -> Option<String> {
    for tag in ["title", "h1", "h2"] {
        if let Ok(selector) = ScraperSelector::parse(tag)
            && let Some(element) = document.select(&selector).next()
        {
            let text = element.text().collect::<Vec<_>>().join(" ").trim().to_string();
            if !text.is_empty() {
                return Some(text);
            }
        }
    }

    None
}

fn extract_description(document: &Html) -> Option<String> {
    for query in [
        r#"meta[name="description"]"#,
        r#"meta[property="og:description"]"#,
    ] {
        if let Ok(selector) = ScraperSelector::parse(query)
            && let Some(element) = document.select(&selector).next()
            && let Some(content) = element.value().attr("content")
        {
            let content = content.trim();
            if !content.is_empty() {
                return Some(content.to_string());
            }
        }
    }

    None
}

/// Crude readable-text heuristic: drop script/style subtrees and every tag,
/// collapse whitespace, cap the length. Good enough as LLM input; this is
/// deliberately not a readability engine.
fn extract_content(html: &str) -> Option<String> {
    let stripped = TAG_STRIPPER.replace_all(html, " ");
    let collapsed = WHITESPACE.replace_all(&stripped, " ");
    let text = collapsed.trim();
    if text.is_empty() {
        return None;
    }

    let capped: String = text.chars().take(CONTENT_CAP).collect();
    Some(capped)
}

/// Extracts and parses every `<script type="application/ld+json">` payload.
/// Bodies that fail to parse are logged and skipped.
pub fn extract_json_ld(html: &str) -> Vec<Value> {
    let mut objects = Vec::new();
    for captures in JSON_LD_SCRIPT.captures_iter(html) {
        let Some(body) = captures.get(1) else {
            continue;
        };
        match serde_json::from_str::<Value>(body.as_str().trim()) {
            Ok(value) => objects.push(value),
            Err(parse_error) => {
                warn!("Skipping malformed JSON-LD block: {parse_error}");
            }
        }
    }
    objects
}

#[cfg(test)]
mod tests {
    use super::{extract_json_ld, extract_page};

    #[test]
    fn json_ld_blocks_are_extracted_and_malformed_ones_skipped() {
        let html = r#"
            <html><head>
            <script type="application/ld+json">{"@type": "Recipe", "name": "Soup"}</script>
            <script type="application/ld+json">{not json}</script>
            <script type="text/javascript">var x = 1;</script>
            </head><body></body></html>
        "#;
        let objects = extract_json_ld(html);
        assert_eq!(objects.len(), 1);
        assert_eq!(
            objects.first().and_then(|o| o.get("name")),
            Some(&serde_json::json!("Soup"))
        );
    }

    #[test]
    fn title_falls_back_to_headings() {
        let html = "<html><head></head><body><h1>Heading title</h1></body></html>";
        let extract = extract_page(html);
        assert_eq!(extract.title.as_deref(), Some("Heading title"));
    }

    #[test]
    fn description_prefers_the_meta_tag() {
        let html = r#"<html><head><title>T</title>
            <meta name="description" content="A summary.">
            </head><body></body></html>"#;
        let extract = extract_page(html);
        assert_eq!(extract.description.as_deref(), Some("A summary."));
    }

    #[test]
    fn content_drops_scripts_and_tags() {
        let html = "<html><body><script>var x;</script><p>Hello <b>world</b></p></body></html>";
        let extract = extract_page(html);
        assert_eq!(extract.content.as_deref(), Some("Hello world"));
    }
}
