//! Network gateways of the address resolver.

use amap_core::entities::{CanonicalKey, MapPoint};
use anyhow::Result;
use reqwest::blocking::Client;
use std::time::Duration;

pub use reqwest::Url;

pub mod mapbox;
pub mod nominatim;

const USER_AGENT: &str = concat!("auctionmap/", env!("CARGO_PKG_VERSION"));

fn http_client(timeout: Duration, user_agent: Option<&str>) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent.unwrap_or(USER_AGENT))
        .build()
}

// Turns every kind of failure into a missing position.
fn resolve_or_log<F>(service: &str, addr: &CanonicalKey, forward: F) -> Option<MapPoint>
where
    F: FnOnce(&str) -> Result<Option<MapPoint>>,
{
    if addr.is_empty() {
        return None;
    }
    match forward(addr.as_str()) {
        Ok(Some(pos)) => {
            log::debug!("Resolved address location '{addr}' with {service}: {pos}");
            Some(pos)
        }
        Ok(None) => {
            log::debug!("No location found for address '{addr}' with {service}");
            None
        }
        Err(err) => {
            log::warn!("Failed to resolve address location '{addr}' with {service}: {err}");
            None
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("HTTP status {0}")]
struct StatusError(reqwest::StatusCode);

fn check_status(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(StatusError(status).into())
    }
}
