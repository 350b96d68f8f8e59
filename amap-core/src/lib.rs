//! Address resolution: normalization, geocode cache lookup
//! and network fallback for scraped auction records.

pub mod gateways;
pub mod normalize;
pub mod repositories;
pub mod usecases;

pub mod entities {
    pub use amap_entities::{address::*, geo::*, record::*, session::*, signature::*};
}
