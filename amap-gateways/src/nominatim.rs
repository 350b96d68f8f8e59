//! Forward geocoding with the public [Nominatim](https://nominatim.org/) search service.
//!
//! The usage policy permits at most one request per second
//! and requires an identifying user agent.

use super::{check_status, http_client, resolve_or_log};
use amap_core::{entities::*, gateways::geocode::GeoCodingGateway};
use anyhow::Result;
use reqwest::{blocking::Client, Url};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct NominatimSettings {
    pub base_url: Url,
    /// ISO 3166 alpha-2 country codes, comma separated.
    pub country: Option<String>,
    pub user_agent: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug)]
pub struct Nominatim {
    client: Client,
    base_url: Url,
    country: Option<String>,
}

impl Nominatim {
    pub fn try_new(settings: NominatimSettings) -> reqwest::Result<Self> {
        let NominatimSettings {
            base_url,
            country,
            user_agent,
            timeout,
        } = settings;
        let user_agent = user_agent.filter(|ua| !ua.trim().is_empty());
        let client = http_client(timeout, user_agent.as_deref())?;
        Ok(Self {
            client,
            base_url,
            country,
        })
    }

    fn search(&self, addr: &str) -> Result<Option<MapPoint>> {
        let params = query_params(addr, self.country.as_deref());
        let response = self
            .client
            .get(self.base_url.clone())
            .query(&params)
            .send()?;
        let places: Vec<Place> = check_status(response)?.json()?;
        Ok(first_position(places))
    }
}

impl GeoCodingGateway for Nominatim {
    fn resolve_address_lat_lng(&self, addr: &CanonicalKey) -> Option<MapPoint> {
        resolve_or_log("Nominatim", addr, |addr| self.search(addr))
    }

    fn requires_throttling(&self) -> bool {
        true
    }
}

fn query_params(addr: &str, country: Option<&str>) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("format", "json".to_owned()),
        ("limit", "1".to_owned()),
        ("q", addr.to_owned()),
    ];
    if let Some(country) = country.filter(|c| !c.trim().is_empty()) {
        params.push(("countrycodes", country.trim().to_lowercase()));
    }
    params
}

// Coordinates are encoded as decimal strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

fn first_position(places: Vec<Place>) -> Option<MapPoint> {
    let place = places.into_iter().next()?;
    let lat = place.lat.trim().parse().ok()?;
    let lng = place.lon.trim().parse().ok()?;
    MapPoint::try_from_lat_lng_deg(lat, lng)
}
