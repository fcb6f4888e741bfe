//! linkmark is a CLI tool that turns a hand-edited markdown list of links
//! into a browsable static site.
//!
//! The tool has three main commands:
//! 1. `scrape` - Fetches every link-list entry and saves the extracted page data to a local database
//! 2. `enrich` - Summarizes and tags stored articles using an LLM model
//! 3. `render` - Generates the static site from the database

use std::fs;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Builder;
use llm::builder::{LLMBackend, LLMBuilder};
use log::{LevelFilter, info};
use std::str::FromStr;
use url::Url;

use linkmark::{
    EnrichTarget, constants::MODEL_API_KEY_ENV_NAME, enrich::enrich, scrape::scrape_links,
    site::render_site,
};

/// A CLI tool to build a browsable link site from a markdown link list
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The command to execute (scrape, enrich, or render)
    #[command(subcommand)]
    command: Command,

    #[arg(long, short, action = clap::ArgAction::Count, help = "Output v(v...)erbosity: error (0), warn (1), info (2), debug (3), trace (4)", global = true, default_value_t = 2)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch every entry of a markdown link list and save page data to a local database
    Scrape {
        /// Path to the markdown link list
        links: String,
        /// Path to database file to store article data
        db: String,
        /// Delay between requests in milliseconds
        #[arg(long, short, default_value_t = 1000)]
        delay: u64,
        /// Re-fetch entries that are already stored
        #[arg(long, short)]
        refresh: bool,
    },
    /// Summarize and tag stored articles using an LLM model
    Enrich {
        /// Path to database file to read articles from
        db: String,
        /// URL of the LLM model to use for processing
        model: String,
        /// Path to the file with a prompt template
        #[arg(long, short = 'p')]
        prompt_file: Option<String>,
        /// Target to enrich: "unenriched", "all" or specify an URL
        #[arg(long, short = 't', default_value = "unenriched")]
        target: EnrichTarget,
    },
    /// Generate the static site from stored articles
    Render {
        /// Path to database file to read articles from
        db: String,
        /// Directory to write the site into
        output_dir: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Error,
            1 => LevelFilter::Warn,
            2 => LevelFilter::Info,
            3 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .init();

    match cli.command {
        Command::Scrape {
            links,
            db,
            delay,
            refresh,
        } => scrape_links(&links, &db, delay, refresh).await,
        Command::Enrich {
            db,
            model,
            prompt_file,
            target,
        } => handle_enrich_command(db, model, prompt_file, target).await,
        Command::Render { db, output_dir } => render_site(&db, &output_dir).await,
    }
}

async fn handle_enrich_command(
    db: String,
    model: String,
    prompt_file: Option<String>,
    target: EnrichTarget,
) -> Result<()> {
    let model_url = Url::parse(&model).map_err(|e| anyhow::anyhow!("Invalid model URL: {}", e))?;
    let llm_builder = LLMBuilder::new()
        .backend(
            LLMBackend::from_str(model_url.scheme())
                .map_err(|e| anyhow::anyhow!("Invalid LLM backend: {}", e))?,
        )
        .model(
            [
                model_url
                    .host_str()
                    .context("Specify model name as host URL.")?,
                model_url.username(),
            ]
            .iter()
            .filter(|x| !x.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(":"),
        );

    let llm_builder = match std::env::var(MODEL_API_KEY_ENV_NAME) {
        Ok(model_key) => {
            info!("API key is provided");
            llm_builder.api_key(model_key)
        }
        Err(err) => {
            info!("{err} while providing api key");
            llm_builder
        }
    };

    let prompt_template = match prompt_file {
        Some(file) => {
            let content =
                fs::read_to_string(&file).context(format!("Failed to read prompt file: {file}"))?;
            Some(content)
        }
        None => None,
    };

    enrich(&db, llm_builder, prompt_template.as_deref(), target).await
}
