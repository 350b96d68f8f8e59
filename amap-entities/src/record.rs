use crate::{address::CanonicalKey, geo::MapPoint};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const FIELD_ADDRESS: &str = "address";
pub const FIELD_CITY_STATE_ZIP: &str = "cityStateZip";

// Coordinate field names in order of precedence.
const COORD_FIELD_PAIRS: [(&str, &str); 2] = [("lat", "lng"), ("latitude", "longitude")];

/// A single scraped auction record.
///
/// The record is treated as opaque apart from its address
/// fields and optional pre-supplied coordinates. All other
/// fields are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuctionRecord(Map<String, Value>);

impl AuctionRecord {
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn address(&self) -> Option<&str> {
        self.text_field(FIELD_ADDRESS)
    }

    pub fn city_state_zip(&self) -> Option<&str> {
        self.text_field(FIELD_CITY_STATE_ZIP)
    }

    /// Coordinates that have been delivered together with the record.
    ///
    /// Only a complete and valid pair counts, everything else
    /// is treated as missing.
    pub fn supplied_pos(&self) -> Option<MapPoint> {
        let (lat_field, lng_field) = COORD_FIELD_PAIRS
            .into_iter()
            .find(|(lat, lng)| self.0.contains_key(*lat) && self.0.contains_key(*lng))?;
        let lat = self.0.get(lat_field).and_then(coord_value)?;
        let lng = self.0.get(lng_field).and_then(coord_value)?;
        MapPoint::try_from_lat_lng_deg(lat, lng)
    }

    fn text_field(&self, name: &str) -> Option<&str> {
        match self.0.get(name)? {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for AuctionRecord {
    fn from(from: Map<String, Value>) -> Self {
        Self(from)
    }
}

fn coord_value(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Where the position of a resolved record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosSource {
    /// Delivered together with the record.
    Supplied,
    /// Found in the geocode cache.
    Cache,
    /// Resolved by a geocoding service during the current batch.
    Geocoder,
}

/// An auction record enriched with its lookup key and position.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRecord {
    pub record: AuctionRecord,
    pub key: CanonicalKey,
    pub pos: Option<(MapPoint, PosSource)>,
}

impl ResolvedRecord {
    pub fn is_mapped(&self) -> bool {
        self.pos.is_some()
    }

    pub fn map_point(&self) -> Option<MapPoint> {
        self.pos.map(|(pos, _)| pos)
    }
}
