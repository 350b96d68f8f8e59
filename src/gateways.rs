use crate::config::GeocodingGateway as GatewayConfig;
use amap_core::gateways::geocode::GeoCodingGateway;
use amap_gateways::{mapbox::Mapbox, nominatim::Nominatim};
use anyhow::Result;

pub type DynGeoCodingGateway = Box<dyn GeoCodingGateway + Send + Sync>;

pub fn geocoding_gateway(cfg: GatewayConfig) -> Result<DynGeoCodingGateway> {
    let gw: DynGeoCodingGateway = match cfg {
        GatewayConfig::Mapbox(settings) => {
            log::info!("Use Mapbox geocoding gateway");
            Box::new(Mapbox::try_new(settings)?)
        }
        GatewayConfig::Nominatim(settings) => {
            log::info!("Use Nominatim geocoding gateway");
            Box::new(Nominatim::try_new(settings)?)
        }
    };
    Ok(gw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use amap_core::gateways::geocode::PreconditionError;
    use amap_gateways::{mapbox, nominatim};

    #[test]
    fn mapbox_without_token_fails_early() {
        let gw = geocoding_gateway(GatewayConfig::Mapbox(mapbox::MapboxSettings {
            token: None,
            base_url: mapbox::DEFAULT_BASE_URL.parse().unwrap(),
            country: None,
            bbox: None,
            timeout: mapbox::DEFAULT_TIMEOUT,
        }))
        .unwrap();
        assert_eq!(
            gw.check_preconditions(),
            Err(PreconditionError::MissingCredential("Mapbox"))
        );
        assert!(!gw.requires_throttling());
    }

    #[test]
    fn nominatim_is_throttled() {
        let gw = geocoding_gateway(GatewayConfig::Nominatim(nominatim::NominatimSettings {
            base_url: nominatim::DEFAULT_BASE_URL.parse().unwrap(),
            country: None,
            user_agent: None,
            timeout: nominatim::DEFAULT_TIMEOUT,
        }))
        .unwrap();
        assert!(gw.requires_throttling());
        assert!(gw.check_preconditions().is_ok());
    }
}
