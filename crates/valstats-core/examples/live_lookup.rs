//! Live lookup against the real upstreams.
//!
//! HENRIKDEV_API_KEY=... cargo run --example live_lookup -- Player#1234

use std::sync::Arc;

use async_trait::async_trait;
use valstats_core::{
    CacheTtls, HenrikClient, HenrikConfig, InMemoryCacheStore, ProgressEvent, ProgressRenderer,
    ProgressTracker, RiotId, ServiceConfig, StatsService, TrackerClient, TrackerConfig,
};

struct Printer;

#[async_trait]
impl ProgressRenderer for Printer {
    async fn render(&self, event: &ProgressEvent) {
        println!("  [{}]", event);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let riot_id: RiotId = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Player#1234".to_string())
        .parse()?;
    let api_key = std::env::var("HENRIKDEV_API_KEY").unwrap_or_default();

    let cache = Arc::new(InMemoryCacheStore::new());
    let ttls = CacheTtls::default();
    let henrik = HenrikClient::new(HenrikConfig::with_api_key(api_key), ttls.clone(), cache.clone())?;
    let tracker = TrackerClient::new(TrackerConfig::default(), ttls.tracker, cache)?;
    let service = StatsService::new(henrik, tracker, ServiceConfig::default());

    println!("Rank lookup for {}", riot_id);
    let progress = ProgressTracker::new();
    progress.start(Arc::new(Printer)).await;
    match service
        .get_player_rank_data(&riot_id.name, &riot_id.tag, &progress)
        .await
    {
        Ok(view) => println!("{:#?}", view),
        Err(e) => println!("failed: {}", e),
    }
    progress.finished().await;

    println!("\nTracker lookup for {}", riot_id);
    let progress = ProgressTracker::new();
    progress.start(Arc::new(Printer)).await;
    match service
        .get_player_tracker_data(&riot_id.name, &riot_id.tag, &progress)
        .await
    {
        Ok(stats) => println!("{:#?}", stats),
        Err(e) => println!("failed: {}", e),
    }
    progress.finished().await;

    Ok(())
}
