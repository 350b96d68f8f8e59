use std::{fmt, str::FromStr};
use thiserror::Error;

const LAT_DEG_MIN: f64 = -90.0;
const LAT_DEG_MAX: f64 = 90.0;
const LNG_DEG_MIN: f64 = -180.0;
const LNG_DEG_MAX: f64 = 180.0;

/// A geographic position in degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapPoint {
    lat: f64,
    lng: f64,
}

impl MapPoint {
    /// Creates a point without any validation.
    ///
    /// Prefer [`MapPoint::try_from_lat_lng_deg`] for values
    /// that originate from external sources.
    pub const fn from_lat_lng_deg(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn try_from_lat_lng_deg(lat: f64, lng: f64) -> Option<Self> {
        let pos = Self::from_lat_lng_deg(lat, lng);
        pos.is_valid().then_some(pos)
    }

    pub const fn lat(&self) -> f64 {
        self.lat
    }

    pub const fn lng(&self) -> f64 {
        self.lng
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (LAT_DEG_MIN..=LAT_DEG_MAX).contains(&self.lat)
            && (LNG_DEG_MIN..=LNG_DEG_MAX).contains(&self.lng)
    }

    /// The coordinate pair as stored in the geocode cache.
    pub const fn to_lat_lng_array(self) -> [f64; 2] {
        [self.lat, self.lng]
    }
}

impl fmt::Display for MapPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// A rectangular area bounded by its south-west and north-east corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapBbox {
    sw: MapPoint,
    ne: MapPoint,
}

impl MapBbox {
    pub const fn new(sw: MapPoint, ne: MapPoint) -> Self {
        Self { sw, ne }
    }

    pub fn is_valid(&self) -> bool {
        self.sw.is_valid() && self.ne.is_valid() && self.sw.lat() <= self.ne.lat()
    }

    pub fn contains_point(&self, pos: MapPoint) -> bool {
        let lat_ok = pos.lat() >= self.sw.lat() && pos.lat() <= self.ne.lat();
        let lng_ok = if self.sw.lng() <= self.ne.lng() {
            pos.lng() >= self.sw.lng() && pos.lng() <= self.ne.lng()
        } else {
            // crosses the antimeridian
            pos.lng() >= self.sw.lng() || pos.lng() <= self.ne.lng()
        };
        lat_ok && lng_ok
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BboxParseError {
    #[error("Expected 4 comma separated numbers: min_lng,min_lat,max_lng,max_lat")]
    Format,
    #[error("Bounding box is invalid")]
    Invalid,
}

/// Parses the `min_lng,min_lat,max_lng,max_lat` notation
/// that is used by most geocoding services.
impl FromStr for MapBbox {
    type Err = BboxParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let c = s
            .split(',')
            .map(|x| x.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| BboxParseError::Format)?;
        if c.len() != 4 {
            return Err(BboxParseError::Format);
        }
        let bbox = Self::new(
            MapPoint::from_lat_lng_deg(c[1], c[0]),
            MapPoint::from_lat_lng_deg(c[3], c[2]),
        );
        if !bbox.is_valid() {
            return Err(BboxParseError::Invalid);
        }
        Ok(bbox)
    }
}

impl fmt::Display for MapBbox {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.sw.lng(),
            self.sw.lat(),
            self.ne.lng(),
            self.ne.lat()
        )
    }
}
