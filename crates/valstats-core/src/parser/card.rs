//! Player card normalization
//!
//! The detailed-account endpoint reports `card` either as a bare asset id
//! or as an object with `small`/`large`/`wide`/`id`. Both decode into
//! [`Card`].

use serde::Deserialize;

use crate::types::{null_as_default, Card};

/// Base URL for player card art keyed by card asset id
const PLAYER_CARD_CDN: &str = "https://media.valorant-api.com/playercards";

/// Wire shape of the `card` field.
///
/// Variant order matters: serde tries the object form before the string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawCard {
    Object {
        #[serde(default, deserialize_with = "null_as_default")]
        small: String,
        #[serde(default, deserialize_with = "null_as_default")]
        large: String,
        #[serde(default, deserialize_with = "null_as_default")]
        wide: String,
        #[serde(default, deserialize_with = "null_as_default")]
        id: String,
    },
    Id(String),
    Missing,
}

impl From<RawCard> for Card {
    fn from(raw: RawCard) -> Self {
        match raw {
            RawCard::Object {
                small,
                large,
                wide,
                id,
            } => Card {
                small,
                large,
                wide,
                id,
            },
            RawCard::Id(id) => Card {
                small: id.clone(),
                large: id.clone(),
                wide: id.clone(),
                id,
            },
            RawCard::Missing => Card::default(),
        }
    }
}

/// Small card art URL for a normalized card.
///
/// Returns `None` when the card carries no usable asset.
pub fn player_card_url(card: &Card) -> Option<String> {
    let small = card.small.trim();
    if small.is_empty() {
        return None;
    }

    if small.starts_with("http://") || small.starts_with("https://") {
        return Some(small.to_string());
    }

    Some(format!("{}/{}/smallart.png", PLAYER_CARD_CDN, small))
}
