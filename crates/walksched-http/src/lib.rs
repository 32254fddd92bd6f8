//! HTTP layer for walkschedd
//!
//! Provides:
//! - `POST /schedule` to install a walk's activation and timeout jobs
//! - `GET /jobs/{walk_id}` to inspect the jobs registered for a walk
//! - `DELETE /jobs/{walk_id}` to cancel a walk's pending jobs
//! - `GET /health` for store health and live walk count
//! - JSON error bodies with a stable error code

mod error;
mod routes;
mod server;

pub use error::*;
pub use routes::*;
pub use server::*;
