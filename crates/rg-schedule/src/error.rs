//! Error types (rg-schedule)

use thiserror::Error;

/// rg-schedule error type
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Cron parse error: {0}")]
    CronParse(#[from] cron::error::Error),

    #[error("Eviction interval must be positive")]
    ZeroInterval,

    #[error("Scheduler has been stopped")]
    SchedulerStopped,

    #[error("Core error: {0}")]
    Core(#[from] rg_core::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ScheduleError>;
