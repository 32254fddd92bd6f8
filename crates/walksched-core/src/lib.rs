//! Scheduling engine for walksched
//!
//! This crate is the heart of walksched, containing:
//! - A cancellable one-shot timer primitive on the tokio runtime
//! - The job registry (walk ID -> live activation/timeout pair)
//! - The state guard that re-reads the store before any effect
//! - The activation and timeout executors
//! - The `Scheduler` facade that installs and supersedes job pairs

mod error;
mod events;
mod executor;
mod guard;
mod job;
mod messages;
mod registry;
mod scheduler;
mod timer;

pub use error::*;
pub use events::*;
pub use executor::*;
pub use guard::*;
pub use job::*;
pub use messages::*;
pub use registry::*;
pub use scheduler::*;
pub use timer::*;
