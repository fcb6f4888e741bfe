//! The linkmark library turns a hand-edited markdown list of links into a
//! browsable static site: pages are scraped into a local database, optionally
//! enriched with an LLM, and rendered together with the normalized JSON-LD
//! structured data found on each page.

pub mod constants;
pub mod enrich;
pub mod linklist;
pub mod scrape;
pub mod site;
pub mod storage;
pub mod structured;

/// Enum representing the target for enrichment.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub enum EnrichTarget {
    /// All database articles with no summary yet.
    #[default]
    Unenriched,
    /// All database articles.
    All,
    /// An article with specified URL.
    Page { url: String },
}

impl From<&str> for EnrichTarget {
    fn from(value: &str) -> Self {
        match value {
            "unenriched" => Self::Unenriched,
            "all" => Self::All,
            url => Self::Page {
                url: url.to_string(),
            },
        }
    }
}

pub use enrich::enrich;
pub use linklist::parse_link_list;
pub use scrape::scrape_links;
pub use site::render_site;
pub use structured::render_structured_data;
