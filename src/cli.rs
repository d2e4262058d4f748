//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// quire content engine CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Content directory path (relative to project root)
    #[arg(short, long)]
    pub content: Option<PathBuf>,

    /// Config file name (default: quire.toml)
    #[arg(short = 'C', long, default_value = "quire.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Listing filters shared by `list`
#[derive(clap::Args, Debug, Clone)]
pub struct ListArgs {
    /// 1-based page number (out-of-range values are clamped)
    #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
    pub page: i64,

    /// Items per page (default: [content.per_page])
    #[arg(long)]
    pub per_page: Option<usize>,

    /// Only posts of this type: article, thought, link, ama
    #[arg(short = 't', long = "type")]
    pub kind: Option<String>,

    /// Only posts with this tag
    #[arg(long, conflicts_with = "category")]
    pub tag: Option<String>,

    /// Only posts in this category
    #[arg(long)]
    pub category: Option<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List published posts, newest first
    List {
        #[command(flatten)]
        args: ListArgs,
    },

    /// Show a single post by slug
    Show {
        slug: String,

        /// Also resolve drafts
        #[arg(long)]
        drafts: bool,
    },

    /// List draft posts
    Drafts,

    /// Search published posts by keyword
    Search {
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print corpus statistics
    Stats {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Load the corpus and report every item that failed to parse
    Check,

    /// Print the rss feed, or write it to a file
    Feed {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Serve the JSON api. Reload on content change automatically
    Serve {
        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// The port you should provide
        #[arg(short, long)]
        port: Option<u16>,

        /// enable watch
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        watch: Option<bool>,
    },
}

impl Cli {
    pub const fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve { .. })
    }
}
