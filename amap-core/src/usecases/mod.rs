mod clear_geocache;
mod error;
mod prefill_from_cache;
mod resolve_batch;
mod should_resolve;

#[cfg(test)]
pub mod tests;

pub use self::{
    clear_geocache::*, error::Error, prefill_from_cache::*, resolve_batch::*, should_resolve::*,
};

mod prelude {
    pub use super::error::Error;
    pub type Result<T> = std::result::Result<T, Error>;
    pub use crate::{entities::*, repositories::*};
}
