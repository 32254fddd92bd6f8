//! Persistence layer for walksched
//!
//! Provides:
//! - Document access addressed by collection + ID
//! - Atomic multi-document batch writes with field deletion
//! - Typed views of walk and user documents
//! - Audit log (append-only) for job outcomes

mod audit;
mod document;
mod records;
mod sqlite;
mod traits;

pub use audit::*;
pub use document::*;
pub use records::*;
pub use sqlite::*;
pub use traits::*;

use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed document {collection}/{id}: {message}")]
    Malformed {
        collection: &'static str,
        id: String,
        message: String,
    },
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
