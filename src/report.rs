//! Reading scraped auction reports and writing the enriched result.

use amap_core::entities::*;
use anyhow::{anyhow, Result};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::{fs, path::Path};
use time::OffsetDateTime;

const FIELD_ITEMS: &str = "items";

pub const FIELD_ADDRESS_CLEAN: &str = "address_clean";
pub const FIELD_LAT: &str = "lat";
pub const FIELD_LNG: &str = "lng";

pub fn load_records(path: &Path) -> Result<Vec<AuctionRecord>> {
    let json = fs::read_to_string(path)
        .map_err(|err| anyhow!("Unable to read report {}: {err}", path.display()))?;
    let records = parse_records(&json)?;
    log::info!("Loaded {} record(s) from {}", records.len(), path.display());
    Ok(records)
}

/// Accepts a list of records, an object with an `items` list
/// or a single record object.
pub fn parse_records(json: &str) -> Result<Vec<AuctionRecord>> {
    let items = match serde_json::from_str::<Value>(json)? {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove(FIELD_ITEMS) {
            Some(Value::Array(items)) => items,
            Some(other) => {
                obj.insert(FIELD_ITEMS.to_owned(), other);
                vec![Value::Object(obj)]
            }
            None => vec![Value::Object(obj)],
        },
        other => {
            return Err(anyhow!("Expected a JSON array or object, found: {other}"));
        }
    };
    let records = items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match item {
            Value::Object(fields) => Some(AuctionRecord::new(fields)),
            other => {
                log::warn!("Skipping report item #{i} that is no object: {other}");
                None
            }
        })
        .collect();
    Ok(records)
}

/// Identifies the version of a report by its content and modification time.
pub fn file_signature(path: &Path) -> Result<FileSignature> {
    let content = fs::read(path)?;
    let content_hash = format!("{:x}", Sha256::digest(&content));
    let modified = fs::metadata(path)?.modified()?;
    let modified_at = OffsetDateTime::from(modified).unix_timestamp();
    Ok(FileSignature {
        content_hash,
        modified_at,
    })
}

/// The original record fields plus the lookup key and the position.
///
/// Unmapped records get `null` coordinates.
pub fn enrich_record(resolved: &ResolvedRecord) -> Map<String, Value> {
    let mut fields = resolved.record.fields().clone();
    fields.insert(
        FIELD_ADDRESS_CLEAN.to_owned(),
        Value::String(resolved.key.as_str().to_owned()),
    );
    let (lat, lng) = match resolved.map_point() {
        Some(pos) => (Value::from(pos.lat()), Value::from(pos.lng())),
        None => (Value::Null, Value::Null),
    };
    fields.insert(FIELD_LAT.to_owned(), lat);
    fields.insert(FIELD_LNG.to_owned(), lng);
    fields
}

pub fn write_enriched(path: &Path, records: &[ResolvedRecord]) -> Result<()> {
    let items: Vec<Value> = records
        .iter()
        .map(|r| Value::Object(enrich_record(r)))
        .collect();
    let json = serde_json::to_string_pretty(&items)?;
    fs::write(path, json)?;
    log::info!("Wrote {} record(s) to {}", items.len(), path.display());
    Ok(())
}
