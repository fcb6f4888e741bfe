//! The enrich module handles LLM enrichment of scraped articles: each article
//! gets a short summary and suggested tags, stored back into the database.

use anyhow::Result;
use llm::builder::LLMBuilder;
use llm::chat::{ChatMessage, ChatMessageBuilder, ChatProvider};
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cell::RefCell;

use crate::EnrichTarget;
use crate::constants::{DEFAULT_PROMPT_TEMPLATE, THINK_STRIPPER};
use crate::storage::{EnrichRow, Storage};

static THINK_STRIPPER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(THINK_STRIPPER).expect("Failed to compile THINK_STRIPPER regex"));

/// Configuration containing shared data for enrichment operations
pub struct EnrichContext<'a> {
    /// LLM model to use for enrichment
    pub model: &'a dyn ChatProvider,
    /// Prompt template to use
    pub prompt_template: Option<&'a str>,
}

/// The parsed result of one enrichment call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    /// Comma-separated tags, when the model produced a tags line.
    pub tags: Option<String>,
    pub summary: String,
}

/// Enriches articles from the database with an LLM summary and tags.
/// Articles are processed in batches to avoid overloading memory.
///
/// # Arguments
///
/// * `db_path` - Path to the database containing scraped articles
/// * `llm_builder` - The LLM builder to create the model for processing
/// * `prompt_template` - Optional prompt template to use
/// * `target` - Which articles to enrich
///
/// # Errors
///
/// Returns an error if:
/// * The LLM model fails to build
/// * Database operations fail
pub async fn enrich(
    db_path: &str,
    llm_builder: LLMBuilder,
    prompt_template: Option<&str>,
    target: EnrichTarget,
) -> Result<()> {
    let model = llm_builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build LLM model: {}", e))?;

    let storage = Storage::new(db_path)?;

    let ctx = EnrichContext {
        model: model.as_ref(),
        prompt_template,
    };

    let total_processed = match &target {
        EnrichTarget::Unenriched => {
            info!("Enriching articles from database {db_path} that haven't been enriched yet...");
            enrich_unenriched_articles(&ctx, &storage).await?
        }
        EnrichTarget::All => {
            info!("Enriching ALL articles from database {db_path}...");
            enrich_all_articles(&ctx, &storage).await?
        }
        EnrichTarget::Page { url } => {
            info!("Enriching article {url} from database {db_path}...");
            enrich_single_article(&ctx, &storage, url).await?
        }
    };

    if total_processed == 0 {
        match &target {
            EnrichTarget::Unenriched => {
                info!("No articles to enrich. All articles already have summaries.");
            }
            EnrichTarget::All => {
                info!("No articles in the database.");
            }
            EnrichTarget::Page { url } => {
                info!("Article {url} not found in the database.");
            }
        }
    } else {
        info!("Enriched {total_processed} articles");
    }

    Ok(())
}

const FETCH_BATCH_SIZE: u32 = 100;

/// Enriches articles from the database that have not been enriched yet
async fn enrich_unenriched_articles(ctx: &EnrichContext<'_>, storage: &Storage) -> Result<u32> {
    enrich_fetched_articles(ctx, storage, || {
        storage.fetch_unenriched(FETCH_BATCH_SIZE)
    })
    .await
}

/// Enriches ALL articles from the database, regardless of whether they're already enriched
async fn enrich_all_articles(ctx: &EnrichContext<'_>, storage: &Storage) -> Result<u32> {
    let offset = RefCell::new(0);
    let has_more = RefCell::new(true);
    enrich_fetched_articles(ctx, storage, || {
        if !*has_more.borrow() {
            return Ok(Vec::new());
        }

        let batch = storage.fetch_enrich_batch(FETCH_BATCH_SIZE, *offset.borrow())?;
        let batch_size = batch.len();
        *offset.borrow_mut() += FETCH_BATCH_SIZE;
        if batch_size < FETCH_BATCH_SIZE as usize {
            *has_more.borrow_mut() = false;
        }

        Ok(batch)
    })
    .await
}

/// Enriches a single article by URL
async fn enrich_single_article(
    ctx: &EnrichContext<'_>,
    storage: &Storage,
    url: &str,
) -> Result<u32> {
    let row = match storage.fetch_enrich_source(url)? {
        None => return Ok(0),
        Some(row) => row,
    };
    let enrichment = enrich_article(&row, ctx).await?;
    storage.update_enrichment(url, enrichment.tags.as_deref(), &enrichment.summary)?;
    debug!("Enriched article: {url}");
    Ok(1)
}

/// Generalized function to enrich articles using a fetcher callback
async fn enrich_fetched_articles<F>(
    ctx: &EnrichContext<'_>,
    storage: &Storage,
    mut fetcher: F,
) -> Result<u32>
where
    F: FnMut() -> Result<Vec<EnrichRow>>,
{
    let mut processed = 0;

    loop {
        let batch = fetcher()?;
        if batch.is_empty() {
            break;
        }

        for row in batch {
            let enrichment = enrich_article(&row, ctx).await?;
            storage.update_enrichment(&row.url, enrichment.tags.as_deref(), &enrichment.summary)?;
            processed += 1;
            debug!("Enriched article: {}", row.url);
        }
    }

    Ok(processed)
}

/// Enriches a single article by formatting its URL, title, and content into
/// the prompt and parsing the model's answer.
///
/// # Arguments
///
/// * `row` - The enrichment source (url, title, text)
/// * `ctx` - Context containing model and prompt template
///
/// # Errors
///
/// Returns an error if the LLM chat operation fails
pub async fn enrich_article(row: &EnrichRow, ctx: &EnrichContext<'_>) -> Result<Enrichment> {
    let prompt_template = ctx.prompt_template.unwrap_or(DEFAULT_PROMPT_TEMPLATE);
    let prompt = prompt_template
        .replace("{url}", &row.url)
        .replace("{title}", row.title.as_deref().unwrap_or_default())
        .replace("{text}", &row.text);

    let mut messages: Vec<ChatMessageBuilder> = vec![ChatMessage::user().content(prompt)];

    if !prompt_template.contains("{text}") {
        messages.push(ChatMessage::user().content(row.text.clone()));
    }

    let messages: Vec<ChatMessage> = messages
        .into_iter()
        .map(|message| message.build())
        .collect();

    let response = ctx
        .model
        .chat(&messages)
        .await
        .map_err(|err| anyhow::anyhow!("LLM error: {err}."))?
        .to_string();

    Ok(split_enrichment(&response))
}

/// Parses the model answer: think blocks stripped, an optional leading
/// "Tags:" line, everything after it is the summary. A response without a
/// tags line becomes a summary with no tags.
fn split_enrichment(response: &str) -> Enrichment {
    let cleaned = THINK_STRIPPER_REGEX
        .replace_all(response, "")
        .to_string()
        .trim()
        .to_owned();

    let mut lines = cleaned.lines();
    let first = lines.next().unwrap_or_default();

    if let Some(tags) = strip_tags_prefix(first) {
        return Enrichment {
            tags: (!tags.is_empty()).then(|| tags.to_string()),
            summary: lines.collect::<Vec<_>>().join("\n").trim().to_string(),
        };
    }

    Enrichment {
        tags: None,
        summary: cleaned,
    }
}

fn strip_tags_prefix(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let rest = trimmed
        .strip_prefix("Tags:")
        .or_else(|| trimmed.strip_prefix("tags:"))?;
    Some(rest.trim())
}
