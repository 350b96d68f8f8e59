//! Forward geocoding with the [Mapbox Geocoding API](https://docs.mapbox.com/api/search/geocoding/).

use super::{check_status, http_client, resolve_or_log};
use amap_core::{
    entities::*,
    gateways::geocode::{GeoCodingGateway, PreconditionError},
};
use anyhow::{anyhow, Result};
use reqwest::{blocking::Client, Url};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct MapboxSettings {
    pub token: Option<String>,
    pub base_url: Url,
    /// ISO 3166 alpha-2 country codes, comma separated.
    pub country: Option<String>,
    pub bbox: Option<MapBbox>,
    pub timeout: Duration,
}

#[derive(Debug)]
pub struct Mapbox {
    client: Client,
    token: String,
    base_url: Url,
    country: Option<String>,
    bbox: Option<MapBbox>,
}

impl Mapbox {
    pub fn try_new(settings: MapboxSettings) -> reqwest::Result<Self> {
        let MapboxSettings {
            token,
            base_url,
            country,
            bbox,
            timeout,
        } = settings;
        let client = http_client(timeout, None)?;
        Ok(Self {
            client,
            token: token.unwrap_or_default(),
            base_url,
            country,
            bbox,
        })
    }

    fn forward(&self, addr: &str) -> Result<Option<MapPoint>> {
        let url = forward_url(&self.base_url, addr)?;
        let params = query_params(&self.token, self.country.as_deref(), self.bbox.as_ref());
        let response = self.client.get(url).query(&params).send()?;
        let collection: FeatureCollection = check_status(response)?.json()?;
        Ok(first_position(collection, self.bbox.as_ref()))
    }
}

impl GeoCodingGateway for Mapbox {
    fn resolve_address_lat_lng(&self, addr: &CanonicalKey) -> Option<MapPoint> {
        resolve_or_log("Mapbox", addr, |addr| self.forward(addr))
    }

    fn check_preconditions(&self) -> Result<(), PreconditionError> {
        if self.token.trim().is_empty() {
            return Err(PreconditionError::MissingCredential("Mapbox"));
        }
        Ok(())
    }
}

// The query is the last path segment, e.g. `.../mapbox.places/1%20Main%20St.json`
fn forward_url(base_url: &Url, addr: &str) -> Result<Url> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|()| anyhow!("Invalid base URL: {base_url}"))?
        .pop_if_empty()
        .push(&format!("{addr}.json"));
    Ok(url)
}

fn query_params(
    token: &str,
    country: Option<&str>,
    bbox: Option<&MapBbox>,
) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("access_token", token.to_owned()),
        ("limit", "1".to_owned()),
        ("autocomplete", "false".to_owned()),
    ];
    if let Some(country) = country.filter(|c| !c.trim().is_empty()) {
        params.push(("country", country.trim().to_lowercase()));
    }
    if let Some(bbox) = bbox {
        params.push(("bbox", bbox.to_string()));
    }
    params
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    // [lng, lat]
    center: Option<[f64; 2]>,
}

// Mapbox may still answer with a position outside of the
// requested bounding box, e.g. for a country level match.
fn first_position(collection: FeatureCollection, bbox: Option<&MapBbox>) -> Option<MapPoint> {
    let [lng, lat] = collection.features.into_iter().next()?.center?;
    let pos = MapPoint::try_from_lat_lng_deg(lat, lng)?;
    if let Some(bbox) = bbox {
        if !bbox.contains_point(pos) {
            log::debug!("Ignoring position {pos} outside of {bbox}");
            return None;
        }
    }
    Some(pos)
}
