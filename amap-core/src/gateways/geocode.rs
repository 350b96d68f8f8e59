use crate::entities::*;
use thiserror::Error;

/// A (network) service that resolves addresses to positions.
pub trait GeoCodingGateway {
    /// Resolves a single address.
    ///
    /// Every kind of failure (timeout, transport or HTTP error,
    /// unexpected response, no match) results in `None`.
    fn resolve_address_lat_lng(&self, addr: &CanonicalKey) -> Option<MapPoint>;

    /// Whether consecutive requests must be throttled
    /// to respect the usage policy of the service.
    fn requires_throttling(&self) -> bool {
        false
    }

    /// Verifies that the gateway is usable before any request is sent.
    fn check_preconditions(&self) -> Result<(), PreconditionError> {
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("Missing credential for the {0} geocoding gateway")]
    MissingCredential(&'static str),
}

impl<G> GeoCodingGateway for &G
where
    G: GeoCodingGateway + ?Sized,
{
    fn resolve_address_lat_lng(&self, addr: &CanonicalKey) -> Option<MapPoint> {
        (**self).resolve_address_lat_lng(addr)
    }
    fn requires_throttling(&self) -> bool {
        (**self).requires_throttling()
    }
    fn check_preconditions(&self) -> Result<(), PreconditionError> {
        (**self).check_preconditions()
    }
}

impl<G> GeoCodingGateway for Box<G>
where
    G: GeoCodingGateway + ?Sized,
{
    fn resolve_address_lat_lng(&self, addr: &CanonicalKey) -> Option<MapPoint> {
        (**self).resolve_address_lat_lng(addr)
    }
    fn requires_throttling(&self) -> bool {
        (**self).requires_throttling()
    }
    fn check_preconditions(&self) -> Result<(), PreconditionError> {
        (**self).check_preconditions()
    }
}
