//! Push notification transport for walksched
//!
//! Defines the interface between the scheduler and whatever delivers
//! messages to devices:
//! - `PushTransport` trait and the `Notification` payload
//! - `HttpPushTransport` for a JSON-over-HTTP push gateway
//! - `LogOnlyTransport` when no gateway is configured
//! - `MockTransport` for tests

mod http;
mod log_only;
mod mock;
mod traits;

pub use http::*;
pub use log_only::*;
pub use mock::*;
pub use traits::*;
