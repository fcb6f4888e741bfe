//! The site module renders the stored articles into a static browsable site:
//! an index page with a client-side text filter plus one page per article.

use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::path::Path;

use crate::storage::{Article, Storage};
use crate::structured::render::escape_html;
use crate::structured::render_structured_data;

const STYLE_SHEET: &str = r#"
body { font-family: sans-serif; max-width: 52rem; margin: 0 auto; padding: 1rem; }
a { color: #23566d; }
.tags span { background: #eef3f5; border-radius: 3px; padding: 0 0.4rem; margin-right: 0.3rem; }
section[class^="ld-"] { border-top: 1px solid #ddd; margin-top: 1.5rem; padding-top: 0.5rem; }
.ld-image img { max-width: 100%; }
"#;

const FILTER_SCRIPT: &str = r#"
document.getElementById('filter').addEventListener('input', function () {
  var needle = this.value.toLowerCase();
  document.querySelectorAll('#links li').forEach(function (item) {
    item.hidden = needle !== '' && !item.textContent.toLowerCase().includes(needle);
  });
});
"#;

/// Renders the static site by reading articles from the database and writing
/// the index, per-article pages, and stylesheet to the output directory.
/// Existing files are truncated and rewritten.
///
/// # Arguments
///
/// * `db_path` - Path to the database containing scraped articles
/// * `output_dir` - Directory the site is written into (created if missing)
///
/// # Errors
///
/// Returns an error if:
/// * Database operations fail
/// * File operations fail
pub async fn render_site(db_path: &str, output_dir: &str) -> Result<()> {
    let storage = Storage::new(db_path)?;

    info!("Rendering site from database {db_path} to {output_dir}...");

    let output = Path::new(output_dir);
    let pages_dir = output.join("pages");
    fs::create_dir_all(&pages_dir)
        .context(format!("Failed to create output directory: {output_dir}"))?;

    fs::write(output.join("style.css"), STYLE_SHEET)?;

    let articles = storage.list_articles()?;
    for article in &articles {
        let page = render_article_page(article);
        fs::write(pages_dir.join(format!("{}.html", article.entry_id)), page)?;
    }

    fs::write(output.join("index.html"), render_index(&articles))?;

    info!("Rendered {} article pages to {output_dir}", articles.len());
    Ok(())
}

fn display_title(article: &Article) -> String {
    article
        .user_title
        .clone()
        .or_else(|| article.title.clone())
        .unwrap_or_else(|| article.url.to_string())
}

fn render_index(articles: &[Article]) -> String {
    let mut items = String::new();
    for article in articles {
        let tags: String = article
            .user_tags
            .iter()
            .map(|tag| format!("<span>#{}</span>", escape_html(tag)))
            .collect();
        items.push_str(&format!(
            "<li><a href=\"pages/{}.html\">{}</a> <span class=\"tags\">{tags}</span></li>\n",
            article.entry_id,
            escape_html(&display_title(article)),
        ));
    }

    page_shell(
        "Links",
        ".",
        &format!(
            "<h1>Links</h1>\n<input id=\"filter\" type=\"search\" placeholder=\"Filter…\">\n\
             <ul id=\"links\">\n{items}</ul>\n<script>{FILTER_SCRIPT}</script>\n"
        ),
    )
}

fn render_article_page(article: &Article) -> String {
    let title = display_title(article);
    let mut body = format!(
        "<p><a href=\"../index.html\">← All links</a></p>\n<h1><a href=\"{}\">{}</a></h1>\n",
        escape_html(article.url.as_str()),
        escape_html(&title)
    );

    if !article.user_tags.is_empty() {
        let tags: String = article
            .user_tags
            .iter()
            .map(|tag| format!("<span>#{}</span>", escape_html(tag)))
            .collect();
        body.push_str(&format!("<p class=\"tags\">{tags}</p>\n"));
    }
    if let Some(notes) = &article.user_notes {
        body.push_str(&format!("<p class=\"notes\">{}</p>\n", escape_html(notes)));
    }
    if let Some(summary) = &article.summary {
        body.push_str(&format!("<blockquote class=\"summary\">{}</blockquote>\n", escape_html(summary)));
    }
    if let Some(tags) = &article.llm_tags {
        body.push_str(&format!("<p class=\"llm-tags\">Suggested: {}</p>\n", escape_html(tags)));
    }
    if let Some(description) = &article.description {
        body.push_str(&format!("<p class=\"description\">{}</p>\n", escape_html(description)));
    }

    if let Some(objects) = &article.json_ld_objects {
        body.push_str(&render_structured_data(objects));
    }

    page_shell(&title, "..", &body)
}

fn page_shell(title: &str, root: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n<link rel=\"stylesheet\" href=\"{root}/style.css\">\n\
         </head>\n<body>\n{body}</body>\n</html>\n",
        escape_html(title)
    )
}
