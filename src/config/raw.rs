use duration_str::deserialize_option_duration;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

const DEFAULT_CONFIG_FILE: &str = include_str!("auctionmap.default.toml");

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub geocache: Option<Geocache>,
    pub geocoding: Option<Geocoding>,
    pub gateway: Option<Gateway>,
    pub session: Option<Session>,
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_FILE).expect("Default configuration")
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Geocache {
    pub file: PathBuf,
}

impl Default for Geocache {
    fn default() -> Self {
        Config::default().geocache.expect("Geocache configuration")
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Geocoding {
    pub gateway: Option<GeocodingGateway>,
    #[serde(default, deserialize_with = "deserialize_option_duration")]
    pub throttle: Option<Duration>,
    pub workers: Option<usize>,
}

impl Default for Geocoding {
    fn default() -> Self {
        Config::default().geocoding.expect("Geocoding configuration")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeocodingGateway {
    Mapbox,
    Nominatim,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Gateway {
    pub mapbox: Option<Mapbox>,
    pub nominatim: Option<Nominatim>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Mapbox {
    pub token: Option<String>,
    pub base_url: Option<String>,
    pub country: Option<String>,
    pub bbox: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_duration")]
    pub timeout: Option<Duration>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Nominatim {
    pub base_url: Option<String>,
    pub country: Option<String>,
    pub user_agent: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_duration")]
    pub timeout: Option<Duration>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Session {
    pub state_file: PathBuf,
}

impl Default for Session {
    fn default() -> Self {
        Config::default().session.expect("Session configuration")
    }
}
