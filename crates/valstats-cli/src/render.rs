//! Terminal output for progress events and lookup results

use async_trait::async_trait;
use valstats_core::{ProgressEvent, ProgressRenderer, RankView, TrackerStatsRecord};

/// Prints progress lines as they arrive
///
/// A disabled renderer still drains the channel.
pub struct TerminalRenderer {
    enabled: bool,
}

impl TerminalRenderer {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl ProgressRenderer for TerminalRenderer {
    async fn render(&self, event: &ProgressEvent) {
        if !self.enabled {
            return;
        }
        if let Some(line) = progress_line(event) {
            println!("{}", line);
        }
    }
}

/// Line shown for a progress event. Error details stay in the logs.
pub fn progress_line(event: &ProgressEvent) -> Option<String> {
    match event {
        ProgressEvent::Update(message) => Some(format!("> {}", message)),
        ProgressEvent::Error { user_message, .. } => Some(format!("> {}", user_message)),
        ProgressEvent::Done => None,
    }
}

pub fn format_rank(view: &RankView) -> String {
    format!(
        "{}#{}\nRank: {} ({} RR)\nLast game: {:+} RR\nCard: {}",
        view.name, view.tag, view.rank, view.rr, view.last_game_delta, view.card_url
    )
}

pub fn format_tracker(stats: &TrackerStatsRecord) -> String {
    if stats.is_private {
        return "This profile is private".to_string();
    }

    let rows = [
        ("Rank", &stats.rank),
        ("Wins", &stats.wins),
        ("Losses", &stats.losses),
        ("Win %", &stats.win_pct),
        ("HS %", &stats.hs_pct),
        ("K/D", &stats.kd_ratio),
        ("ADR", &stats.damage_per_round),
        ("Playtime", &stats.time_played),
    ];

    let mut out = stats.user.clone();
    for (label, value) in rows {
        let value = if value.is_empty() { "-" } else { value.as_str() };
        out.push_str(&format!("\n{}: {}", label, value));
    }
    out
}
