#![deny(missing_debug_implementations)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # amap-entities
//!
//! Reusable, agnostic domain entities for the auction map address resolver.
//!
//! The entities only contain generic functionality that does not reveal any application-specific business logic.

pub mod address;
pub mod geo;
pub mod record;
pub mod session;
pub mod signature;

#[cfg(any(test, feature = "builders"))]
pub mod builders;
