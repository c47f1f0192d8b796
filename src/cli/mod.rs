//! CLI parser and dispatch.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Settings;
use crate::models::SortMode;

/// How item streams are written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON (single resources).
    Json,
    /// One JSON object per line (streams).
    #[default]
    Jsonl,
}

/// Comment ordering selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    #[default]
    Top,
    Newest,
    /// Keep re-polling the newest ordering for threads appearing mid-walk.
    Live,
}

impl From<SortArg> for SortMode {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Top => SortMode::Top,
            SortArg::Newest => SortMode::Newest,
            SortArg::Live => SortMode::Live,
        }
    }
}

#[derive(Parser)]
#[command(name = "vida")]
#[command(about = "Video platform data acquisition and crawling system")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a video's metadata
    Video {
        /// Video ID
        video_id: String,
        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Walk a video's comment section, including reply threads
    Comments {
        /// Video ID
        video_id: String,
        /// Comment ordering
        #[arg(short, long, value_enum, default_value = "top")]
        sort: SortArg,
        /// Stop after this many comments (0 = unlimited)
        #[arg(short, long, default_value = "0")]
        limit: usize,
    },

    /// Follow a video's live chat, or drain a finished stream's replay
    Chat {
        /// Video ID
        video_id: String,
        /// Drain the recorded replay instead of polling live
        #[arg(short, long)]
        replay: bool,
    },

    /// List every video on a channel
    Channel {
        /// Channel ID
        channel_id: String,
    },

    /// Crawl outward from seed videos or channels, following related videos
    Crawl {
        /// Seed video IDs (or channel IDs with --channels)
        #[arg(required = true)]
        seeds: Vec<String>,
        /// Treat seeds as channel IDs
        #[arg(long)]
        channels: bool,
        /// Number of crawl workers (overrides config)
        #[arg(short, long)]
        workers: Option<usize>,
        /// Stop after this many crawled resources (0 = drain)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Maximum discovery depth from the seeds (0 = unlimited)
        #[arg(short = 'd', long)]
        max_depth: Option<u32>,
        /// Output file for crawled items (JSON lines)
        #[arg(short, long, default_value = "items.jsonl")]
        output: PathBuf,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Video { video_id, format } => {
            commands::video::cmd_video(&settings, &video_id, format).await
        }
        Commands::Comments {
            video_id,
            sort,
            limit,
        } => commands::comments::cmd_comments(&settings, &video_id, sort.into(), limit).await,
        Commands::Chat { video_id, replay } => {
            commands::chat::cmd_chat(&settings, &video_id, replay).await
        }
        Commands::Channel { channel_id } => {
            commands::channel::cmd_channel(&settings, &channel_id).await
        }
        Commands::Crawl {
            seeds,
            channels,
            workers,
            limit,
            max_depth,
            output,
        } => {
            let mut settings = settings;
            if let Some(workers) = workers {
                settings.crawl.workers = workers;
            }
            if let Some(limit) = limit {
                settings.crawl.limit = limit;
            }
            if let Some(depth) = max_depth {
                settings.crawl.max_depth = depth;
            }
            commands::crawl::cmd_crawl(&settings, seeds, channels, &output).await
        }
    }
}
