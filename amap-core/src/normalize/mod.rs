//! Turns noisy, scraped address strings into stable lookup keys.
//!
//! The pipeline is an ordered list of [`rules::Rule`]s
//! followed by a normalization of the comma separated segments.
//! Every step leaves already clean input untouched,
//! i.e. normalizing a canonical key again yields the same key.

use crate::entities::*;

pub mod rules;

use self::rules::{ADDRESS_RULES, STREET_LINE_RULES};

/// Derives the lookup key from a raw address.
///
/// This never fails: empty or garbage input
/// results in an empty or partial key.
pub fn normalize_address(raw: &str) -> CanonicalKey {
    let mut text = raw.trim().to_owned();
    if text.is_empty() {
        return CanonicalKey::default();
    }
    for rule in ADDRESS_RULES.iter() {
        text = rule.apply(&text).into_owned();
    }
    join_segments(&text).into()
}

/// Picks the address field of a record that is used for the lookup.
///
/// The primary address wins, the combined
/// city/state/zip field is the fallback.
pub fn select_address(record: &AuctionRecord) -> Option<&str> {
    [record.address(), record.city_state_zip()]
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
}

pub fn normalize_record(record: &AuctionRecord) -> CanonicalKey {
    select_address(record)
        .map(normalize_address)
        .unwrap_or_default()
}

// Trims all comma separated segments, drops empty ones
// and applies the street line rules to the first one.
fn join_segments(text: &str) -> String {
    let mut segments: Vec<String> = text
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();
    if let Some(street_line) = segments.first_mut() {
        for rule in STREET_LINE_RULES.iter() {
            *street_line = rule.apply(street_line).into_owned();
        }
    }
    segments.join(", ")
}
