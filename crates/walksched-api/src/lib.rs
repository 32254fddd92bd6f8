//! Wire types for walksched
//!
//! This crate defines the stable API between walksched and its clients:
//! - Walk status and job vocabulary shared with the store and the core
//! - Schedule requests and responses for the HTTP surface
//! - Diagnostics views and error payloads
//! - Versioning

mod messages;
mod types;

pub use messages::*;
pub use types::*;

/// Current API version
pub const API_VERSION: u32 = 1;
