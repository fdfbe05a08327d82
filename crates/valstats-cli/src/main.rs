//! valstats binary entry point.
//!
//! A thin wrapper around valstats-core that:
//! 1. Parses command-line arguments
//! 2. Initializes logging
//! 3. Builds the cache and upstream clients
//! 4. Runs one lookup while rendering its progress

mod cli;
mod render;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, warn};
use valstats_core::ProgressTracker;

use crate::cli::{Cli, Command};
use crate::render::{format_rank, format_tracker, TerminalRenderer};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr so results on stdout stay pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if matches!(cli.command, Command::Rank { .. }) && cli.api_key.is_none() {
        anyhow::bail!("a HenrikDev API key is required for rank lookups (--api-key or HENRIKDEV_API_KEY)");
    }

    let cache = cli.cache().await?;
    let service = cli.service(Arc::clone(&cache))?;

    let progress = ProgressTracker::new();
    progress
        .start(Arc::new(TerminalRenderer::new(!cli.json)))
        .await;

    let output = match &cli.command {
        Command::Rank { riot_id } => service
            .get_player_rank_data(&riot_id.name, &riot_id.tag, &progress)
            .await
            .map(|view| render_output(&view, cli.json, format_rank)),
        Command::Tracker { riot_id } => service
            .get_player_tracker_data(&riot_id.name, &riot_id.tag, &progress)
            .await
            .map(|stats| render_output(&stats, cli.json, format_tracker)),
    };
    progress.finished().await;
    progress.stop();

    if let Err(e) = cache.close().await {
        warn!(error = %e, "failed to close cache");
    }

    match output {
        Ok(text) => {
            println!("{}", text?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            debug!(error = ?e, "lookup failed");
            if cli.json {
                println!("{}", serde_json::json!({ "error": e.user_message }));
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn render_output<T: serde::Serialize>(
    value: &T,
    json: bool,
    text: fn(&T) -> String,
) -> Result<String, serde_json::Error> {
    if json {
        serde_json::to_string_pretty(value)
    } else {
        Ok(text(value))
    }
}
