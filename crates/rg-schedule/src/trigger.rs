//! Recurrence rules for eviction jobs

use chrono::Utc;
use cron::Schedule as CronSchedule;
use rg_core::EvictionConfig;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

use crate::{Result, ScheduleError};

/// When an eviction job fires
#[derive(Debug, Clone)]
pub enum EvictionTrigger {
    /// Every `period`, starting one period after the job starts
    Interval(Duration),
    /// At every time matched by a cron expression (seconds field included)
    Cron {
        expression: String,
        schedule: Box<CronSchedule>,
    },
}

impl EvictionTrigger {
    pub fn interval(period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(ScheduleError::ZeroInterval);
        }
        Ok(Self::Interval(period))
    }

    /// Parse a cron expression, e.g. `"0 0 4 * * *"` for every day at 04:00 UTC
    pub fn cron(expression: &str) -> Result<Self> {
        let schedule = expression.parse::<CronSchedule>()?;
        Ok(Self::Cron {
            expression: expression.to_string(),
            schedule: Box::new(schedule),
        })
    }

    /// The cron expression wins over the interval when both are configured
    pub fn from_config(config: &EvictionConfig) -> Result<Self> {
        match &config.cron {
            Some(expression) => Self::cron(expression),
            None => Self::interval(config.interval()),
        }
    }

    /// Deadline of the firing that follows one scheduled at `previous`
    pub(crate) fn next_after(&self, previous: Instant) -> Option<Instant> {
        let now = Instant::now();
        match self {
            Self::Interval(period) => {
                let next = previous + *period;
                // A firing that overran its slot pushes the next one a full period out
                if next < now { Some(now + *period) } else { Some(next) }
            }
            Self::Cron { schedule, .. } => {
                let next = schedule.upcoming(Utc).next()?;
                let delay = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
                Some(now + delay)
            }
        }
    }
}

impl fmt::Display for EvictionTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interval(period) => write!(f, "every {}s", period.as_secs()),
            Self::Cron { expression, .. } => write!(f, "cron '{}'", expression),
        }
    }
}
