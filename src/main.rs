//! Pandemic news aggregator: batch entrypoint.
//! One `run` per invocation (cron-friendly), plus `reset-quotas` and `watch`.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pandemic_news_feed::cli::{Cli, Commands};
use pandemic_news_feed::ingest::config::{load_config_default, load_config_from};
use pandemic_news_feed::ingest::scheduler::{spawn_scheduler, SchedulerCfg, DAY_SECS};
use pandemic_news_feed::runtime::NewsRuntime;

/// Logs go to stderr so stdout stays machine-readable.
/// NEWS_LOG_JSON=1 switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("NEWS_LOG_JSON").ok().is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; API keys usually live there.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(p) => load_config_from(p)?,
        None => load_config_default()?,
    };

    match cli.command {
        Commands::Run { mode, dry_run } => {
            let mut rt = if dry_run {
                NewsRuntime::dry_run(&cfg)?
            } else {
                NewsRuntime::from_config(&cfg)?
            };
            if let Some(m) = mode {
                rt.mode = m;
            }
            let summary = rt.run_once().await?;
            // dry runs already printed the batch on stdout
            if dry_run {
                eprintln!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
        }
        Commands::ResetQuotas => {
            let state = NewsRuntime::reset_quota_file(&cfg)?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Commands::Watch { interval_secs } => {
            let rt = NewsRuntime::from_config(&cfg)?;
            let handle = spawn_scheduler(
                SchedulerCfg {
                    interval_secs,
                    reset_every_secs: DAY_SECS,
                },
                rt,
            );
            tokio::select! {
                res = handle => res?,
                _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
            }
        }
    }
    Ok(())
}
