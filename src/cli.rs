// src/cli.rs
//! Command-line surface of the `pandemic-news` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::ingest::registry::RunMode;

#[derive(Parser, Debug)]
#[command(name = "pandemic-news", version, about = "Pandemic news aggregator")]
pub struct Cli {
    /// Config file (TOML or JSON). Falls back to config/news.toml, config/news.json.
    #[arg(long, global = true, env = "NEWS_CONFIG_PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch, dedupe and append one batch.
    Run {
        /// Overrides `[run] mode` from config.
        #[arg(long, value_enum)]
        mode: Option<RunMode>,
        /// Print the batch instead of writing output, ledger or quota files.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Zero every provider's daily request counter (point cron here once a day).
    ResetQuotas,
    /// Keep running on an interval, resetting quotas every 24h.
    Watch {
        #[arg(long, default_value_t = 3600)]
        interval_secs: u64,
    },
}
