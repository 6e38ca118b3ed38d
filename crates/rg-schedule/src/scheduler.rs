//! Eviction scheduler
//!
//! Runs one background task per session, firing the session's eviction
//! callback on its trigger until the job is cancelled or the scheduler stops.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::eviction::EvictionCallback;
use crate::trigger::EvictionTrigger;
use crate::{Result, ScheduleError};

/// A recurring eviction bound to one session
struct EvictionJob {
    session_id: String,
    trigger: EvictionTrigger,
    callback: Arc<dyn EvictionCallback>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Running,
    Stopped,
}

struct State {
    lifecycle: Lifecycle,
    /// Jobs scheduled before `start`
    pending: Vec<EvictionJob>,
    running: HashMap<String, JoinHandle<()>>,
}

/// Scheduler for per-session eviction jobs
pub struct EvictionScheduler {
    state: Mutex<State>,
    shutdown_tx: broadcast::Sender<()>,
}

impl EvictionScheduler {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            state: Mutex::new(State {
                lifecycle: Lifecycle::Idle,
                pending: Vec::new(),
                running: HashMap::new(),
            }),
            shutdown_tx,
        }
    }

    /// Register a recurring eviction for the session.
    ///
    /// Jobs scheduled before [`start`](Self::start) are queued. Returns
    /// `false` when the session already has a job.
    pub async fn schedule(
        &self,
        session_id: &str,
        trigger: EvictionTrigger,
        callback: Arc<dyn EvictionCallback>,
    ) -> Result<bool> {
        let mut state = self.state.lock().await;

        if state.lifecycle == Lifecycle::Stopped {
            return Err(ScheduleError::SchedulerStopped);
        }

        let exists = state.running.contains_key(session_id)
            || state.pending.iter().any(|job| job.session_id == session_id);
        if exists {
            warn!(session_id = %session_id, "Eviction already scheduled");
            return Ok(false);
        }

        info!(session_id = %session_id, trigger = %trigger, "Eviction scheduled");

        let job = EvictionJob {
            session_id: session_id.to_string(),
            trigger,
            callback,
        };

        if state.lifecycle == Lifecycle::Running {
            let handle = self.spawn_job(job);
            state.running.insert(session_id.to_string(), handle);
        } else {
            state.pending.push(job);
        }

        Ok(true)
    }

    /// Start firing jobs. Calling it on a running scheduler is a no-op.
    pub async fn start(&self) -> Result<()> {
        let mut state = self.state.lock().await;

        match state.lifecycle {
            Lifecycle::Running => return Ok(()),
            Lifecycle::Stopped => return Err(ScheduleError::SchedulerStopped),
            Lifecycle::Idle => {}
        }

        state.lifecycle = Lifecycle::Running;
        let pending = std::mem::take(&mut state.pending);
        for job in pending {
            let session_id = job.session_id.clone();
            let handle = self.spawn_job(job);
            state.running.insert(session_id, handle);
        }

        info!("Eviction scheduler started ({} jobs)", state.running.len());
        Ok(())
    }

    /// Stop every job and wait for them to exit.
    ///
    /// A firing already in progress runs to completion first.
    pub async fn stop(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut state = self.state.lock().await;
            if state.lifecycle == Lifecycle::Stopped {
                return;
            }
            state.lifecycle = Lifecycle::Stopped;
            state.pending.clear();
            let _ = self.shutdown_tx.send(());
            state.running.drain().map(|(_, handle)| handle).collect()
        };

        futures::future::join_all(handles).await;
        info!("Eviction scheduler stopped");
    }

    /// Remove the session's job; returns `false` if it had none
    pub async fn cancel(&self, session_id: &str) -> bool {
        let mut state = self.state.lock().await;

        if let Some(handle) = state.running.remove(session_id) {
            handle.abort();
            info!(session_id = %session_id, "Eviction cancelled");
            return true;
        }

        let before = state.pending.len();
        state.pending.retain(|job| job.session_id != session_id);
        before != state.pending.len()
    }

    /// Number of scheduled jobs, queued or running
    pub async fn job_count(&self) -> usize {
        let state = self.state.lock().await;
        state.pending.len() + state.running.len()
    }

    pub async fn is_running(&self) -> bool {
        self.state.lock().await.lifecycle == Lifecycle::Running
    }

    fn spawn_job(&self, job: EvictionJob) -> JoinHandle<()> {
        let shutdown_rx = self.shutdown_tx.subscribe();
        tokio::spawn(run_job(job, shutdown_rx))
    }
}

impl Default for EvictionScheduler {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_job(job: EvictionJob, mut shutdown_rx: broadcast::Receiver<()>) {
    let mut previous = Instant::now();

    loop {
        let Some(deadline) = job.trigger.next_after(previous) else {
            warn!(session_id = %job.session_id, "No upcoming eviction time, job finished");
            break;
        };

        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => {
                previous = deadline;
                fire(&job).await;
            }
            _ = shutdown_rx.recv() => {
                debug!(session_id = %job.session_id, "Eviction job received shutdown");
                break;
            }
        }
    }
}

/// Run one firing; failures are logged and never end the job
async fn fire(job: &EvictionJob) {
    let callback = Arc::clone(&job.callback);
    let session_id = job.session_id.clone();

    // A separate task so a panicking callback cannot take the job down
    let outcome = tokio::spawn(async move { callback.evict(&session_id).await }).await;

    match outcome {
        Ok(Ok(())) => debug!(session_id = %job.session_id, "Eviction fired"),
        Ok(Err(e)) => error!(session_id = %job.session_id, "Eviction failed: {}", e),
        Err(e) => error!(session_id = %job.session_id, "Eviction task aborted: {}", e),
    }
}
