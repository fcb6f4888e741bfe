//! The storage module provides database operations for storing and retrieving
//! scraped article content using SQLite.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::warn;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use std::convert::TryFrom;
use std::sync::{Arc, Mutex};
use url::Url;

/// Storage provides database operations for storing and retrieving scraped
/// articles.
pub struct Storage {
    /// The underlying SQLite connection wrapped in Arc<Mutex<>> to make it thread-safe
    conn: Arc<Mutex<Connection>>,
}

impl Storage {
    /// Creates a new Storage instance with a database at the specified path.
    ///
    /// # Arguments
    ///
    /// * `database_path` - Path where the database file should be created or opened
    ///
    /// # Errors
    ///
    /// Returns an error if database creation fails
    pub fn new(database_path: &str) -> Result<Self> {
        let conn = Connection::open(database_path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Initializes the database schema with the articles table if it doesn't exist.
    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS articles (
                url TEXT PRIMARY KEY,
                entry_id INTEGER NOT NULL,
                added_at INTEGER NOT NULL,
                user_title TEXT NULL,
                user_tags TEXT NULL,
                user_notes TEXT NULL,
                title TEXT NULL,
                description TEXT NULL,
                content TEXT NULL,
                json_ld TEXT NULL,
                llm_tags TEXT NULL,
                summary TEXT NULL
            )",
            params![],
        )?;

        Ok(())
    }

    /// Returns a list of all URLs stored in the database.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn list_urls(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let mut stmt = conn.prepare("SELECT url FROM articles ORDER BY entry_id ASC")?;
        let urls: Result<Vec<String>, rusqlite::Error> =
            stmt.query_map([], |row| row.get(0))?.collect();

        urls.map_err(|e| e.into())
    }

    /// Gets all article data for a specific URL from the database.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to look up in the database
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn get_article(&self, url: &str) -> Result<Option<Article>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE url = ?1"
        ))?;
        let article_row: Result<Option<ArticleRow>, rusqlite::Error> =
            stmt.query_row([url], map_article_row).optional();

        let article_row: Option<ArticleRow> =
            article_row.map_err(|e| anyhow::anyhow!("Unable to fetch article row: {e}"))?;

        let article_row = match article_row {
            Some(article_row) => article_row,
            None => return Ok(None),
        };

        Ok(Some(article_row.try_into()?))
    }

    /// Returns all articles ordered by their link-list position.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn list_articles(&self) -> Result<Vec<Article>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles ORDER BY entry_id ASC"
        ))?;
        let rows: Result<Vec<ArticleRow>, rusqlite::Error> =
            stmt.query_map([], map_article_row)?.collect();

        rows.map_err(|e| anyhow::anyhow!("Unable to fetch article rows: {e}"))?
            .into_iter()
            .map(Article::try_from)
            .collect()
    }

    /// Adds or updates an article in the database.
    ///
    /// # Arguments
    ///
    /// * `article` - The Article struct containing all the article data
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn upsert_article(&self, article: &Article) -> Result<()> {
        let json_ld = article
            .json_ld_objects
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .context("Unable to serialize json_ld objects")?;
        let user_tags = if article.user_tags.is_empty() {
            None
        } else {
            Some(article.user_tags.join(","))
        };

        let conn = self.conn.lock().expect("Storage mutex poisoned");
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO articles ({ARTICLE_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            ),
            params![
                article.url.as_str(),
                article.entry_id,
                article.added_at.timestamp(),
                article.user_title,
                user_tags,
                article.user_notes,
                article.title,
                article.description,
                article.content,
                json_ld,
                article.llm_tags,
                article.summary.as_deref()
            ],
        )?;

        Ok(())
    }

    /// Updates the LLM tags and summary for an article in the database.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL of the article to update
    /// * `tags` - The suggested tags line, if the model produced one
    /// * `summary` - The summary content to store
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn update_enrichment(&self, url: &str, tags: Option<&str>, summary: &str) -> Result<()> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        conn.execute(
            "UPDATE articles SET llm_tags = ?1, summary = ?2 WHERE url = ?3",
            params![tags, summary, url],
        )?;

        Ok(())
    }

    /// Gets a limited number of articles that have not been enriched yet.
    /// This helps manage memory usage when dealing with large databases.
    ///
    /// # Arguments
    ///
    /// * `limit` - The maximum number of articles to retrieve
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn fetch_unenriched(&self, limit: u32) -> Result<Vec<EnrichRow>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENRICH_COLUMNS} FROM articles
             WHERE summary IS NULL OR summary = '' ORDER BY added_at ASC LIMIT ?1"
        ))?;
        let rows = stmt.query_map([limit], map_enrich_row)?;
        let articles: Vec<EnrichRow> = rows.flatten().collect();

        Ok(articles)
    }

    /// Gets a limited number of all articles from the database with an offset.
    /// This allows processing all records in batches.
    ///
    /// # Arguments
    ///
    /// * `limit` - The maximum number of articles to retrieve
    /// * `offset` - The offset from which to start retrieving articles
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn fetch_enrich_batch(&self, limit: u32, offset: u32) -> Result<Vec<EnrichRow>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENRICH_COLUMNS} FROM articles ORDER BY added_at ASC LIMIT ?1 OFFSET ?2"
        ))?;
        let rows = stmt.query_map([limit, offset], map_enrich_row)?;
        let articles: Vec<EnrichRow> = rows.flatten().collect();

        Ok(articles)
    }

    /// Gets the enrichment source for a specific URL from the database.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to look up in the database
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn fetch_enrich_source(&self, url: &str) -> Result<Option<EnrichRow>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENRICH_COLUMNS} FROM articles WHERE url = ?1"
        ))?;
        let row: Result<Option<EnrichRow>, rusqlite::Error> =
            stmt.query_row([url], map_enrich_row).optional();

        row.map_err(|e| e.into())
    }

    /// Removes all articles from the database whose URL is not present in the
    /// provided list. Uses a temporary table so the whole cleanup is a single
    /// SQL DELETE operation.
    ///
    /// # Arguments
    ///
    /// * `listed_urls` - A collection of URLs currently present in the link list
    ///
    /// # Returns
    ///
    /// Returns the number of articles removed on success
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn remove_unlisted<I>(&self, listed_urls: I) -> Result<usize>
    where
        I: IntoIterator<Item = String>,
    {
        let conn = self.conn.lock().expect("Storage mutex poisoned");

        conn.execute_batch(
            r#"
                DROP TABLE IF EXISTS temp_listed_urls;
                CREATE TEMPORARY TABLE temp_listed_urls (url TEXT PRIMARY KEY);
            "#,
        )?;

        let urls: Vec<String> = listed_urls.into_iter().collect();
        const BATCH_SIZE: usize = 100;
        for chunk in urls.chunks(BATCH_SIZE) {
            let placeholders: Vec<String> = vec!["?".to_string(); chunk.len()];
            let sql = format!(
                "INSERT OR IGNORE INTO temp_listed_urls (url) VALUES ({})",
                placeholders.join("), (")
            );

            let params: Vec<&dyn rusqlite::ToSql> =
                chunk.iter().map(|s| s as &dyn rusqlite::ToSql).collect();
            conn.execute(&sql, rusqlite::params_from_iter(params))?;
        }

        let deleted_count = conn.execute(
            "DELETE FROM articles WHERE url NOT IN (SELECT url FROM temp_listed_urls)",
            [],
        )?;

        Ok(deleted_count)
    }
}

const ARTICLE_COLUMNS: &str = "url, entry_id, added_at, user_title, user_tags, user_notes, \
                               title, description, content, json_ld, llm_tags, summary";

const ENRICH_COLUMNS: &str = "url, title, coalesce(content, description, '')";

fn map_article_row(row: &rusqlite::Row<'_>) -> Result<ArticleRow, rusqlite::Error> {
    Ok(ArticleRow {
        url: row.get(0)?,
        entry_id: row.get(1)?,
        added_at: row.get(2)?,
        user_title: row.get(3)?,
        user_tags: row.get(4)?,
        user_notes: row.get(5)?,
        title: row.get(6)?,
        description: row.get(7)?,
        content: row.get(8)?,
        json_ld: row.get(9)?,
        llm_tags: row.get(10)?,
        summary: row.get(11)?,
    })
}

fn map_enrich_row(row: &rusqlite::Row<'_>) -> Result<EnrichRow, rusqlite::Error> {
    Ok(EnrichRow {
        url: row.get(0)?,
        title: row.get(1)?,
        text: row.get(2)?,
    })
}

/// The enrichment source of one article: what the LLM gets to see.
#[derive(Debug)]
pub struct EnrichRow {
    pub url: String,
    pub title: Option<String>,
    pub text: String,
}

/// Represents an article row as stored in the database
#[derive(Debug)]
pub struct ArticleRow {
    pub url: String,
    pub entry_id: i64,
    pub added_at: i64,
    pub user_title: Option<String>,
    pub user_tags: Option<String>,
    pub user_notes: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub json_ld: Option<String>,
    pub llm_tags: Option<String>,
    pub summary: Option<String>,
}

/// Represents a domain Article
#[derive(Debug)]
pub struct Article {
    pub url: Url,
    /// Position of the article in the markdown link list.
    pub entry_id: i64,
    pub added_at: DateTime<Utc>,
    pub user_title: Option<String>,
    pub user_tags: Vec<String>,
    pub user_notes: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    /// The raw parsed JSON-LD script-tag contents scraped from the page.
    pub json_ld_objects: Option<Vec<Value>>,
    pub llm_tags: Option<String>,
    pub summary: Option<String>,
}

impl TryFrom<ArticleRow> for Article {
    type Error = anyhow::Error;

    fn try_from(row: ArticleRow) -> Result<Self> {
        // An unreadable json_ld column means "no structured data", never an
        // error: the render must not fail over one bad row.
        let json_ld_objects = row.json_ld.as_deref().and_then(|raw| {
            serde_json::from_str::<Vec<Value>>(raw)
                .map_err(|e| warn!("Ignoring unreadable json_ld for {}: {e}", row.url))
                .ok()
        });

        Ok(Article {
            url: Url::parse(&row.url)?,
            entry_id: row.entry_id,
            added_at: DateTime::from_timestamp_secs(row.added_at)
                .context("Unable to initialize added_at from database")?,
            user_title: row.user_title,
            user_tags: row
                .user_tags
                .map(|tags| tags.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
            user_notes: row.user_notes,
            title: row.title,
            description: row.description,
            content: row.content,
            json_ld_objects,
            llm_tags: row.llm_tags,
            summary: row.summary,
        })
    }
}
