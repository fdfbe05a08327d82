//! tracker.gg profile parser
//!
//! Extracts display values from `data.segments[0].stats` of a profile
//! response. Values are copied verbatim; no unit conversion happens here.

use serde_json::Value;

use crate::error::{Result, StatsError};
use crate::types::TrackerStatsRecord;

/// Whether `body` contains any of `markers`.
pub fn contains_any(body: &str, markers: &[String]) -> bool {
    markers
        .iter()
        .any(|marker| !marker.is_empty() && body.contains(marker.as_str()))
}

/// Parse a tracker.gg profile body.
///
/// # Arguments
/// * `body` - Raw response body
/// * `private_marker` - Substring identifying a private profile
///
/// # Returns
/// * `Ok(TrackerStatsRecord { is_private: true, .. })` if the marker is present
/// * `Ok(TrackerStatsRecord)` with display values from the first segment
/// * `Err(StatsError::Parse)` if the body is not JSON or has no segments
pub fn parse_tracker_stats(body: &str, private_marker: &str) -> Result<TrackerStatsRecord> {
    if !private_marker.is_empty() && body.contains(private_marker) {
        return Ok(TrackerStatsRecord::private());
    }

    let root: Value = serde_json::from_str(body)
        .map_err(|e| StatsError::Parse(format!("tracker body is not JSON: {}", e)))?;
    let data = &root["data"];

    let stats = data["segments"]
        .as_array()
        .and_then(|segments| segments.first())
        .map(|segment| &segment["stats"])
        .ok_or_else(|| StatsError::Parse("No segments found in player data".to_string()))?;

    Ok(TrackerStatsRecord {
        user: text(data, "/platformInfo/platformUserIdentifier"),
        avatar_url: text(data, "/platformInfo/avatarUrl"),
        wins: text(stats, "/matchesWon/displayValue"),
        losses: text(stats, "/matchesLost/displayValue"),
        win_pct: text(stats, "/matchesWinPct/displayValue"),
        hs_pct: text(stats, "/headshotsPercentage/displayValue"),
        kd_ratio: text(stats, "/kDRatio/displayValue"),
        damage_per_round: text(stats, "/damagePerRound/displayValue"),
        time_played: text(stats, "/timePlayed/displayValue"),
        rank: text(stats, "/rank/metadata/tierName"),
        rank_icon_url: text(stats, "/rank/metadata/iconUrl"),
        is_private: false,
    })
}

/// String form of the value at `pointer`, empty when absent.
fn text(value: &Value, pointer: &str) -> String {
    match value.pointer(pointer) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
