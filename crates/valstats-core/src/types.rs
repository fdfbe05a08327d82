//! Data types for valstats
//!
//! Records decoded from the upstream APIs and the request-scoped views
//! assembled from them. All records round-trip through serde so they can be
//! stored in the cache as JSON.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::StatsError;

/// Public `name#tag` player identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiotId {
    pub name: String,
    pub tag: String,
}

impl FromStr for RiotId {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('#');
        let (Some(name), Some(tag), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(StatsError::InvalidRiotId(s.to_string()));
        };

        let (name, tag) = (name.trim(), tag.trim());
        if name.is_empty() || tag.is_empty() {
            return Err(StatsError::InvalidRiotId(s.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            tag: tag.to_string(),
        })
    }
}

impl fmt::Display for RiotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.tag)
    }
}

/// Decode an absent or `null` field as its default value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Account returned by `/v2/account/{name}/{tag}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub puuid: String,
    pub region: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub account_level: u32,
    pub name: String,
    pub tag: String,
    /// Player card asset id
    #[serde(default, deserialize_with = "null_as_default")]
    pub card: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub platforms: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_at: String,
}

/// Rank images attached to the current MMR data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankImages {
    #[serde(default, deserialize_with = "null_as_default")]
    pub small: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub large: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub triangle_down: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub triangle_up: String,
}

/// Current competitive standing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentRank {
    #[serde(default, rename = "currenttier", deserialize_with = "null_as_default")]
    pub current_tier: u32,
    /// Display name of the tier, e.g. "Gold 2"
    #[serde(default, rename = "currenttierpatched", deserialize_with = "null_as_default")]
    pub current_tier_patched: String,
    /// Ranked rating within the tier (0-100)
    #[serde(default, deserialize_with = "null_as_default")]
    pub ranking_in_tier: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mmr_change_to_last_game: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub elo: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: RankImages,
}

/// MMR record returned by `/v2/by-puuid/mmr/{region}/{puuid}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_data: CurrentRank,
}

/// Player card assets, normalized from either upstream shape
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "crate::parser::RawCard")]
pub struct Card {
    pub small: String,
    pub large: String,
    pub wide: String,
    pub id: String,
}

/// Account record returned by `/v2/by-puuid/account/{puuid}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedAccountRecord {
    pub puuid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub region: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub account_level: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub card: Card,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_update: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_update_raw: i64,
}

/// Aggregate match statistics scraped from tracker.gg
///
/// Values are the upstream display strings (e.g. "54.2%", "1.05").
/// When `is_private` is set, every other field is empty and meaningless.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerStatsRecord {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub wins: String,
    #[serde(default)]
    pub losses: String,
    #[serde(default)]
    pub win_pct: String,
    #[serde(default)]
    pub hs_pct: String,
    #[serde(default)]
    pub kd_ratio: String,
    #[serde(default)]
    pub damage_per_round: String,
    #[serde(default)]
    pub time_played: String,
    #[serde(default)]
    pub rank: String,
    #[serde(default)]
    pub rank_icon_url: String,
    #[serde(default)]
    pub is_private: bool,
}

impl TrackerStatsRecord {
    /// Result for a profile hidden by its owner
    pub fn private() -> Self {
        Self {
            is_private: true,
            ..Self::default()
        }
    }
}

/// Rank summary assembled for a single lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankView {
    pub name: String,
    pub tag: String,
    pub rank: String,
    pub rr: i32,
    pub last_game_delta: i32,
    pub card_url: String,
}
