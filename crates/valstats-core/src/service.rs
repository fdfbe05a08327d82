//! Lookup orchestration
//!
//! This module provides the high-level API for a player lookup. It sequences
//! the HenrikDev and tracker.gg clients, reports each step on a
//! [`ProgressTracker`], and decides which failures end the lookup.
//!
//! A rank lookup runs three dependent steps:
//! 1. account by Riot ID (fatal on failure)
//! 2. MMR by the account's region and puuid (fatal on failure)
//! 3. detailed account for the player card (tolerated; falls back to the
//!    rank image)
//!
//! Every invocation emits exactly one terminal event.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::ServiceConfig;
use crate::error::{LookupError, LookupStage, StatsError};
use crate::henrik::HenrikClient;
use crate::parser::player_card_url;
use crate::progress::ProgressTracker;
use crate::tracker::TrackerClient;
use crate::types::{RankRecord, RankView, TrackerStatsRecord};

/// Player lookup service
///
/// Holds both upstream clients. Calls to upstreams are strictly sequential
/// within one lookup; concurrent lookups need their own trackers.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use valstats_core::{
///     CacheTtls, HenrikClient, HenrikConfig, InMemoryCacheStore, ProgressTracker,
///     ServiceConfig, StatsService, TrackerClient, TrackerConfig,
/// };
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let cache = Arc::new(InMemoryCacheStore::new());
/// let ttls = CacheTtls::default();
/// let henrik = HenrikClient::new(HenrikConfig::with_api_key("HDEV-..."), ttls.clone(), cache.clone())?;
/// let tracker = TrackerClient::new(TrackerConfig::default(), ttls.tracker, cache)?;
/// let service = StatsService::new(henrik, tracker, ServiceConfig::default());
///
/// let progress = ProgressTracker::new();
/// let view = service.get_player_rank_data("Player", "1234", &progress).await?;
/// println!("{} {}RR", view.rank, view.rr);
/// # Ok(())
/// # }
/// ```
pub struct StatsService {
    henrik: HenrikClient,
    tracker: TrackerClient,
    config: ServiceConfig,
}

impl StatsService {
    pub fn new(henrik: HenrikClient, tracker: TrackerClient, config: ServiceConfig) -> Self {
        Self {
            henrik,
            tracker,
            config,
        }
    }

    /// Rank, RR and player card for a Riot ID.
    ///
    /// Emits one `Update` per step, then `Done`, or `Error` at the first
    /// fatal step. A failed detailed-account lookup only changes the card
    /// URL source.
    ///
    /// # Returns
    /// * `Ok(RankView)` with the aggregated rank data
    /// * `Err(LookupError)` with stage `Account` or `Mmr`
    pub async fn get_player_rank_data(
        &self,
        name: &str,
        tag: &str,
        progress: &ProgressTracker,
    ) -> std::result::Result<RankView, LookupError> {
        self.step(
            progress,
            format!("right now, i'm fetching {}#{}'s rank data", name, tag),
        )
        .await;
        let account = match self.henrik.get_account(name, tag).await {
            Ok(account) => account,
            Err(e) => return Err(fail(progress, LookupStage::Account, e).await),
        };

        self.step(progress, "alright... just some more things...").await;
        let mmr = match self.henrik.get_mmr(&account.region, &account.puuid).await {
            Ok(mmr) => mmr,
            Err(e) => return Err(fail(progress, LookupStage::Mmr, e).await),
        };

        self.step(progress, "oh, we can't forget about their card!").await;
        let card_url = match self.henrik.get_detailed_account(&account.puuid).await {
            Ok(detailed) => {
                player_card_url(&detailed.card).unwrap_or_else(|| fallback_card_url(&mmr))
            }
            Err(e) => {
                warn!(
                    puuid = %account.puuid,
                    error = %e,
                    "detailed account unavailable, using rank image"
                );
                fallback_card_url(&mmr)
            }
        };

        let view = RankView {
            name: account.name,
            tag: account.tag,
            rank: mmr.current_data.current_tier_patched,
            rr: mmr.current_data.ranking_in_tier,
            last_game_delta: mmr.current_data.mmr_change_to_last_game,
            card_url,
        };

        info!(player = %format!("{}#{}", name, tag), rank = %view.rank, "rank lookup complete");
        progress.send_done().await;
        Ok(view)
    }

    /// tracker.gg statistics for a Riot ID.
    ///
    /// A private profile is a successful result with `is_private` set.
    pub async fn get_player_tracker_data(
        &self,
        name: &str,
        tag: &str,
        progress: &ProgressTracker,
    ) -> std::result::Result<TrackerStatsRecord, LookupError> {
        self.step(
            progress,
            format!("right now, i'm fetching {}#{}'s tracker data", name, tag),
        )
        .await;

        match self.tracker.get_player_stats(name, tag).await {
            Ok(stats) => {
                info!(
                    player = %format!("{}#{}", name, tag),
                    private = stats.is_private,
                    "tracker lookup complete"
                );
                progress.send_done().await;
                Ok(stats)
            }
            Err(e) => Err(fail(progress, LookupStage::TrackerStats, e).await),
        }
    }

    async fn step(&self, progress: &ProgressTracker, message: impl Into<String>) {
        if self.config.step_delay > Duration::ZERO {
            sleep(self.config.step_delay).await;
        }
        progress.send_update(message).await;
    }
}

fn fallback_card_url(mmr: &RankRecord) -> String {
    mmr.current_data.images.large.clone()
}

async fn fail(
    progress: &ProgressTracker,
    stage: LookupStage,
    source: StatsError,
) -> LookupError {
    let err = LookupError::classify(stage, source);
    error!(%stage, error = %err.source, "lookup failed");
    progress
        .send_error(err.to_string(), err.user_message.clone())
        .await;
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, InMemoryCacheStore};
    use crate::config::{CacheTtls, HenrikConfig, TrackerConfig};
    use crate::error::{GENERIC_MESSAGE, NOT_FOUND_MESSAGE};
    use crate::progress::{ProgressEvent, ProgressRenderer};
    use async_trait::async_trait;
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct Recorder {
        events: std::sync::Mutex<Vec<ProgressEvent>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<ProgressEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProgressRenderer for Recorder {
        async fn render(&self, event: &ProgressEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    fn service_for(server: &MockServer) -> (StatsService, Arc<InMemoryCacheStore>) {
        let cache = Arc::new(InMemoryCacheStore::new());
        let ttls = CacheTtls::default();
        let henrik = HenrikClient::new(
            HenrikConfig {
                api_key: "HDEV-test".to_string(),
                base_url: server.uri(),
                ..HenrikConfig::default()
            },
            ttls.clone(),
            cache.clone(),
        )
        .unwrap();
        let tracker = TrackerClient::new(
            TrackerConfig {
                base_url: format!("{}/tracker", server.uri()),
                blocked_backoff: Duration::from_millis(5),
                ..TrackerConfig::default()
            },
            ttls.tracker,
            cache.clone(),
        )
        .unwrap();
        (
            StatsService::new(henrik, tracker, ServiceConfig::default()),
            cache,
        )
    }

    async fn mount_account(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/v2/account/Player/1234"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": 200,
                "data": {
                    "puuid": "abc",
                    "region": "na",
                    "account_level": 212,
                    "name": "Player",
                    "tag": "1234",
                    "card": "card-id",
                    "title": "",
                    "platforms": ["PC"],
                    "updated_at": ""
                }
            })))
            .mount(server)
            .await;
    }

    async fn mount_mmr(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/v2/by-puuid/mmr/na/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": 200,
                "data": {
                    "name": "Player",
                    "tag": "1234",
                    "current_data": {
                        "currenttier": 13,
                        "currenttierpatched": "Gold 2",
                        "ranking_in_tier": 47,
                        "mmr_change_to_last_game": -9,
                        "elo": 1047,
                        "images": {"small": "https://r/small.png", "large": "https://r/large.png"}
                    }
                }
            })))
            .mount(server)
            .await;
    }

    async fn run_rank(
        service: &StatsService,
        name: &str,
        tag: &str,
    ) -> (std::result::Result<RankView, LookupError>, Vec<ProgressEvent>) {
        let recorder = Arc::new(Recorder::default());
        let progress = ProgressTracker::new();
        progress.start(recorder.clone()).await;
        let result = service.get_player_rank_data(name, tag, &progress).await;
        progress.finished().await;
        (result, recorder.events())
    }

    fn kinds(events: &[ProgressEvent]) -> Vec<&'static str> {
        events
            .iter()
            .map(|e| match e {
                ProgressEvent::Update(_) => "update",
                ProgressEvent::Error { .. } => "error",
                ProgressEvent::Done => "done",
            })
            .collect()
    }

    #[tokio::test]
    async fn test_rank_lookup_tolerates_detailed_account_failure() {
        let server = MockServer::start().await;
        mount_account(&server).await;
        mount_mmr(&server).await;
        Mock::given(method("GET"))
            .and(path("/v2/by-puuid/account/abc"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (service, _cache) = service_for(&server);
        let (result, events) = run_rank(&service, "Player", "1234").await;

        let view = result.unwrap();
        assert_eq!(
            view,
            RankView {
                name: "Player".to_string(),
                tag: "1234".to_string(),
                rank: "Gold 2".to_string(),
                rr: 47,
                last_game_delta: -9,
                card_url: "https://r/large.png".to_string(),
            }
        );
        assert_eq!(kinds(&events), vec!["update", "update", "update", "done"]);
        assert_eq!(
            events[0],
            ProgressEvent::Update("right now, i'm fetching Player#1234's rank data".to_string())
        );
    }

    #[tokio::test]
    async fn test_unranked_player_with_null_mmr_fields() {
        let server = MockServer::start().await;
        mount_account(&server).await;
        Mock::given(method("GET"))
            .and(path("/v2/by-puuid/mmr/na/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": 200,
                "data": {
                    "current_data": {
                        "currenttier": null,
                        "currenttierpatched": null,
                        "images": null,
                        "ranking_in_tier": null,
                        "mmr_change_to_last_game": null,
                        "elo": null
                    }
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/by-puuid/account/abc"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (service, _cache) = service_for(&server);
        let (result, events) = run_rank(&service, "Player", "1234").await;

        let view = result.unwrap();
        assert_eq!(view.name, "Player");
        assert_eq!(view.tag, "1234");
        assert_eq!(view.rank, "");
        assert_eq!(view.rr, 0);
        assert_eq!(view.card_url, "");
        assert_eq!(kinds(&events), vec!["update", "update", "update", "done"]);
    }

    #[tokio::test]
    async fn test_rank_view_identity_comes_from_account() {
        let server = MockServer::start().await;
        mount_account(&server).await;
        Mock::given(method("GET"))
            .and(path("/v2/by-puuid/mmr/na/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": 200,
                "data": {
                    "current_data": {
                        "currenttierpatched": "Gold 2",
                        "ranking_in_tier": 47,
                        "mmr_change_to_last_game": -9,
                        "images": {"large": "https://r/large.png"}
                    }
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/by-puuid/account/abc"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (service, _cache) = service_for(&server);
        let (result, _events) = run_rank(&service, "Player", "1234").await;

        let view = result.unwrap();
        assert_eq!(view.name, "Player");
        assert_eq!(view.tag, "1234");
        assert_eq!(view.rank, "Gold 2");
    }

    #[tokio::test]
    async fn test_rank_lookup_uses_player_card() {
        let server = MockServer::start().await;
        mount_account(&server).await;
        mount_mmr(&server).await;
        Mock::given(method("GET"))
            .and(path("/v2/by-puuid/account/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": 200,
                "data": {
                    "puuid": "abc",
                    "region": "na",
                    "account_level": 212,
                    "name": "Player",
                    "tag": "1234",
                    "card": "9fb348bc-41a0-91ad-8a3e-818035c4e561",
                    "last_update": "now",
                    "last_update_raw": 0
                }
            })))
            .mount(&server)
            .await;

        let (service, _cache) = service_for(&server);
        let (result, _events) = run_rank(&service, "Player", "1234").await;

        assert_eq!(
            result.unwrap().card_url,
            "https://media.valorant-api.com/playercards/9fb348bc-41a0-91ad-8a3e-818035c4e561/smallart.png"
        );
    }

    #[tokio::test]
    async fn test_unknown_player_reports_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "status": 404,
                "errors": [{"message": "Account not found"}]
            })))
            .mount(&server)
            .await;

        let (service, _cache) = service_for(&server);
        let (result, events) = run_rank(&service, "Nobody", "0000").await;

        let err = result.unwrap_err();
        assert_eq!(err.stage, LookupStage::Account);
        assert_eq!(err.user_message, NOT_FOUND_MESSAGE);
        assert_eq!(kinds(&events), vec!["update", "error"]);
        match &events[1] {
            ProgressEvent::Error { detail, user_message } => {
                assert_eq!(user_message, NOT_FOUND_MESSAGE);
                assert!(detail.contains("Account not found"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mmr_failure_is_fatal() {
        let server = MockServer::start().await;
        mount_account(&server).await;
        Mock::given(method("GET"))
            .and(path("/v2/by-puuid/mmr/na/abc"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/by-puuid/account/abc"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (service, _cache) = service_for(&server);
        let (result, events) = run_rank(&service, "Player", "1234").await;

        let err = result.unwrap_err();
        assert_eq!(err.stage, LookupStage::Mmr);
        assert_eq!(err.user_message, GENERIC_MESSAGE);
        assert_eq!(kinds(&events), vec!["update", "update", "error"]);
    }

    #[tokio::test]
    async fn test_tracker_lookup_private_profile_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tracker/Player%231234"))
            .respond_with(ResponseTemplate::new(451).set_body_string(
                r#"{"errors":[{"code":"CollectorResultStatus::Private","message":"private"}]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let (service, cache) = service_for(&server);
        let recorder = Arc::new(Recorder::default());
        let progress = ProgressTracker::new();
        progress.start(recorder.clone()).await;

        let stats = service
            .get_player_tracker_data("Player", "1234", &progress)
            .await
            .unwrap();
        progress.finished().await;

        assert!(stats.is_private);
        assert_eq!(kinds(&recorder.events()), vec!["update", "done"]);
        assert!(cache.get("tracker:Player:1234").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_tracker_lookup_exhausted_reports_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("You are being rate limited"))
            .expect(5)
            .mount(&server)
            .await;

        let (service, _cache) = service_for(&server);
        let recorder = Arc::new(Recorder::default());
        let progress = ProgressTracker::new();
        progress.start(recorder.clone()).await;

        let err = service
            .get_player_tracker_data("Player", "1234", &progress)
            .await
            .unwrap_err();
        progress.finished().await;

        assert_eq!(err.stage, LookupStage::TrackerStats);
        assert!(matches!(err.source, StatsError::RetriesExhausted { attempts: 5 }));
        assert_eq!(kinds(&recorder.events()), vec!["update", "error"]);
    }
}
