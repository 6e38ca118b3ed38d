//! Session history eviction
//!
//! Tracks which sessions already have an eviction job and runs those jobs
//! on a recurring trigger, independent of request handling.

mod error;
mod eviction;
mod registry;
mod scheduler;
mod trigger;

pub use error::{Result, ScheduleError};
pub use eviction::{EvictionCallback, HistoryEvictor};
pub use registry::SessionRegistry;
pub use scheduler::EvictionScheduler;
pub use trigger::EvictionTrigger;
