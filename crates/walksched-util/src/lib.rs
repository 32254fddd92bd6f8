//! Shared utilities for walksched
//!
//! This crate provides:
//! - ID types (WalkId, UserId, JobId)
//! - Wall-clock helpers (mockable `now()`, ISO-8601 parsing, late-request clamping)
//! - Default paths for config and data directories

mod ids;
mod paths;
mod time;

pub use ids::*;
pub use paths::*;
pub use time::*;
