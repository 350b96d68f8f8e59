use amap_core::{entities::MapBbox, usecases::DEFAULT_THROTTLE};
use amap_gateways::{
    mapbox::{self, MapboxSettings},
    nominatim::{self, NominatimSettings},
    Url,
};
use anyhow::{anyhow, Result};
use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

mod raw;

const DEFAULT_CONFIG_FILE_NAME: &str = "auctionmap.toml";

const ENV_NAME_MAPBOX_TOKEN: &str = "MAPBOX_TOKEN";
const ENV_NAME_GEOCACHE: &str = "AUCTIONMAP_GEOCACHE";

const DEFAULT_WORKERS: usize = 1;

#[derive(Debug)]
pub struct Config {
    pub geocache: Geocache,
    pub geocoding: Geocoding,
    pub session: Session,
}

impl Config {
    /// Loads the given file or `auctionmap.toml` from the working directory.
    ///
    /// Only a missing default file falls back to the built-in configuration.
    pub fn try_load_from_file_or_default<P: AsRef<Path>>(file_path: Option<P>) -> Result<Self> {
        let file_path: Option<&Path> = file_path.as_ref().map(|p| p.as_ref());
        let raw_config = match file_path {
            Some(file_path) => {
                let cfg_string = fs::read_to_string(file_path).map_err(|err| {
                    anyhow!("Unable to read configuration {}: {err}", file_path.display())
                })?;
                toml::from_str(&cfg_string)?
            }
            None => {
                log::info!("No configuration file specified. load {DEFAULT_CONFIG_FILE_NAME}");
                match fs::read_to_string(DEFAULT_CONFIG_FILE_NAME) {
                    Ok(cfg_string) => toml::from_str(&cfg_string)?,
                    Err(err) if err.kind() == ErrorKind::NotFound => {
                        log::info!(
                            "{DEFAULT_CONFIG_FILE_NAME} not found => load default configuration."
                        );
                        raw::Config::default()
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        };
        Self::try_from_raw(raw_config, EnvOverrides::from_env())
    }

    fn try_from_raw(mut raw_config: raw::Config, overrides: EnvOverrides) -> Result<Self> {
        let EnvOverrides {
            mapbox_token,
            geocache_file,
        } = overrides;
        if let Some(token) = mapbox_token {
            raw_config
                .gateway
                .get_or_insert_with(Default::default)
                .mapbox
                .get_or_insert_with(Default::default)
                .token = Some(token);
        }
        let mut cfg = Self::try_from(raw_config)?;
        if let Some(file) = geocache_file {
            cfg.geocache.file = file;
        }
        Ok(cfg)
    }
}

#[derive(Debug, Default)]
struct EnvOverrides {
    mapbox_token: Option<String>,
    geocache_file: Option<PathBuf>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        let non_empty = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            mapbox_token: non_empty(ENV_NAME_MAPBOX_TOKEN),
            geocache_file: non_empty(ENV_NAME_GEOCACHE).map(PathBuf::from),
        }
    }
}

#[derive(Debug)]
pub struct Geocache {
    pub file: PathBuf,
}

#[derive(Debug)]
pub struct Geocoding {
    pub gateway: GeocodingGateway,
    /// Pause between two requests to a throttled gateway.
    pub throttle: Duration,
    pub workers: usize,
}

#[derive(Debug, Clone)]
pub enum GeocodingGateway {
    Mapbox(MapboxSettings),
    Nominatim(NominatimSettings),
}

#[derive(Debug)]
pub struct Session {
    /// Remembers the last processed report between runs.
    pub state_file: PathBuf,
}

impl TryFrom<raw::Config> for Config {
    type Error = anyhow::Error;
    fn try_from(from: raw::Config) -> Result<Self> {
        let raw::Config {
            geocache,
            geocoding,
            gateway,
            session,
        } = from;

        let raw::Geocache { file } = geocache.unwrap_or_default();
        let geocache = Geocache { file };

        let raw::Geocoding {
            gateway: gateway_name,
            throttle,
            workers,
        } = geocoding.unwrap_or_default();
        let workers = workers.unwrap_or(DEFAULT_WORKERS);
        if workers == 0 {
            return Err(anyhow!("At least one geocoding worker is required"));
        }
        let raw::Gateway {
            mapbox: raw_mapbox,
            nominatim: raw_nominatim,
        } = gateway.unwrap_or_default();
        let mapbox = mapbox_settings(raw_mapbox.unwrap_or_default())?;
        let gateway_name = gateway_name.unwrap_or_else(|| {
            if mapbox.token.is_some() {
                raw::GeocodingGateway::Mapbox
            } else {
                raw::GeocodingGateway::Nominatim
            }
        });
        let gateway = match gateway_name {
            raw::GeocodingGateway::Mapbox => GeocodingGateway::Mapbox(mapbox),
            raw::GeocodingGateway::Nominatim => GeocodingGateway::Nominatim(
                nominatim_settings(raw_nominatim.unwrap_or_default())?,
            ),
        };
        let geocoding = Geocoding {
            gateway,
            throttle: throttle.unwrap_or(DEFAULT_THROTTLE),
            workers,
        };

        let raw::Session { state_file } = session.unwrap_or_default();
        let session = Session { state_file };

        Ok(Self {
            geocache,
            geocoding,
            session,
        })
    }
}

fn mapbox_settings(from: raw::Mapbox) -> Result<MapboxSettings> {
    let raw::Mapbox {
        token,
        base_url,
        country,
        bbox,
        timeout,
    } = from;
    let base_url = parse_base_url(base_url, mapbox::DEFAULT_BASE_URL)?;
    let bbox = bbox
        .map(|bbox| {
            bbox.parse::<MapBbox>()
                .map_err(|err| anyhow!("Invalid Mapbox bbox '{bbox}': {err}"))
        })
        .transpose()?;
    Ok(MapboxSettings {
        token: token.filter(|t| !t.trim().is_empty()),
        base_url,
        country,
        bbox,
        timeout: timeout.unwrap_or(mapbox::DEFAULT_TIMEOUT),
    })
}

fn nominatim_settings(from: raw::Nominatim) -> Result<NominatimSettings> {
    let raw::Nominatim {
        base_url,
        country,
        user_agent,
        timeout,
    } = from;
    let base_url = parse_base_url(base_url, nominatim::DEFAULT_BASE_URL)?;
    Ok(NominatimSettings {
        base_url,
        country,
        user_agent,
        timeout: timeout.unwrap_or(nominatim::DEFAULT_TIMEOUT),
    })
}

fn parse_base_url(url: Option<String>, default_url: &str) -> Result<Url> {
    let url = url.as_deref().unwrap_or(default_url);
    url.parse()
        .map_err(|err| anyhow!("Invalid base URL '{url}': {err}"))
}
