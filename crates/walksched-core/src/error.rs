//! Errors surfaced by the scheduling engine

use thiserror::Error;
use walksched_api::RequestError;
use walksched_store::StoreError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid schedule request: {0}")]
    Validation(#[from] RequestError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// True when the caller sent something wrong, as opposed to a server fault
    pub fn is_client_error(&self) -> bool {
        matches!(self, CoreError::Validation(_))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
