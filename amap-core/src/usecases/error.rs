use crate::{gateways::geocode::PreconditionError, repositories};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    #[error(transparent)]
    Repo(#[from] repositories::Error),
}
