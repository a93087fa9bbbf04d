use std::path::PathBuf;

use clap::{Parser, Subcommand};
use engine_logging::LogDestination;
use tubequeue_core::{CategoryOrder, DuplicatePolicy, LinkId};
use tubequeue_engine::DEFAULT_BASE_URL;

/// Top-level CLI for the tubequeue link ingestion queue.
#[derive(Debug, Parser)]
#[command(name = "tubequeue")]
#[command(about = "Queue YouTube links into a tubequeue backend", long_about = None)]
pub struct Cli {
    /// Backend base URL.
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL, value_name = "URL")]
    pub server: String,

    /// Directory holding the local settings file.
    #[arg(long, global = true, default_value = ".", value_name = "DIR")]
    pub state_dir: PathBuf,

    /// Log destination: terminal, file or both.
    #[arg(long, global = true, default_value = "terminal", value_name = "DEST")]
    pub log: LogDestination,

    /// Log at debug level.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Submit links; reads one per line from stdin when none are given.
    Submit {
        /// Target category (defaults to Unsorted).
        #[arg(long, short)]
        category: Option<String>,

        urls: Vec<String>,
    },

    /// Show categories and the ingestion queue.
    Status,

    /// Show or change settings; changes are saved and pushed to the backend.
    Config {
        /// block_category, warn_global or allow_all.
        #[arg(long, value_parser = parse_policy)]
        duplicate_policy: Option<DuplicatePolicy>,

        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
        per_second: Option<u32>,

        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
        per_minute: Option<u32>,

        /// recent, alphabetical, most_items or pinned_first.
        #[arg(long, value_parser = parse_order)]
        category_order: Option<CategoryOrder>,
    },

    /// Create a category on the backend.
    AddCategory { name: String },

    /// Move a stored link to another category.
    MoveLink { id: LinkId, category: String },

    /// Delete a stored link.
    DeleteLink { id: LinkId },

    /// Replace a link's tags; give none to clear them.
    Tag {
        id: LinkId,

        /// Comma separated or one per argument.
        #[arg(value_delimiter = ',')]
        tags: Vec<String>,
    },

    /// Print the canonical identity of each URL without contacting the backend.
    Normalize {
        #[arg(required = true)]
        urls: Vec<String>,
    },
}

fn parse_policy(value: &str) -> Result<DuplicatePolicy, String> {
    [
        DuplicatePolicy::BlockCategory,
        DuplicatePolicy::WarnGlobal,
        DuplicatePolicy::AllowAll,
    ]
    .into_iter()
    .find(|policy| policy.as_str() == value)
    .ok_or_else(|| format!("unknown duplicate policy: {value}"))
}

fn parse_order(value: &str) -> Result<CategoryOrder, String> {
    [
        CategoryOrder::Recent,
        CategoryOrder::Alphabetical,
        CategoryOrder::MostItems,
        CategoryOrder::PinnedFirst,
    ]
    .into_iter()
    .find(|order| order.as_str() == value)
    .ok_or_else(|| format!("unknown category order: {value}"))
}
