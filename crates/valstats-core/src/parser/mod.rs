//! Payload parsers for the upstream APIs
//!
//! This module contains parsers for extracting records from upstream bodies:
//! - `envelope`: HenrikDev `{status, data}` envelopes and error bodies
//! - `card`: the polymorphic player card field
//! - `tracker`: tracker.gg profile statistics

pub mod card;
pub mod envelope;
pub mod tracker;

// Re-export main parsing functions
pub use card::{player_card_url, RawCard};
pub use envelope::decode_envelope;
pub use tracker::{contains_any, parse_tracker_stats};
