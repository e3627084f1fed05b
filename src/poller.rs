//! Render status polling.
//!
//! Queries a render at a fixed interval until the service reports a terminal
//! state or the deadline passes. The deadline is measured from the first
//! query and is never reset. Expected endings (completed, failed, timed out)
//! come back as a [`PollOutcome`]; only faults use the error channel.

use crate::api::error::RenderError;
use crate::api::RenderService;
use crate::consts::polling;
use crate::job::{ArtifactRef, JobHandle, JobStatus};
use log::{info, warn};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    interval: Duration,
    max_wait: Duration,
}

impl PollPolicy {
    pub fn new(interval: Duration, max_wait: Duration) -> Result<Self, RenderError> {
        if interval.is_zero() {
            return Err(RenderError::Config("poll interval must be greater than zero".into()));
        }
        Ok(Self { interval, max_wait })
    }

    pub fn from_secs(interval_secs: u64, max_wait_secs: u64) -> Result<Self, RenderError> {
        Self::new(Duration::from_secs(interval_secs), Duration::from_secs(max_wait_secs))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(polling::DEFAULT_INTERVAL_SECS),
            max_wait: Duration::from_secs(polling::DEFAULT_MAX_WAIT_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed {
        artifact: ArtifactRef,
        attempts: u32,
        elapsed: Duration,
    },
    Failed {
        reason: String,
        attempts: u32,
        elapsed: Duration,
    },
    TimedOut {
        attempts: u32,
        elapsed: Duration,
    },
}

impl PollOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Completed { attempts, .. }
            | PollOutcome::Failed { attempts, .. }
            | PollOutcome::TimedOut { attempts, .. } => *attempts,
        }
    }

    /// Collapse into the artifact, turning failure and timeout into errors.
    pub fn into_result(self) -> Result<ArtifactRef, RenderError> {
        match self {
            PollOutcome::Completed { artifact, .. } => Ok(artifact),
            PollOutcome::Failed { reason, .. } => Err(RenderError::JobFailed { reason }),
            PollOutcome::TimedOut { attempts, elapsed } => Err(RenderError::Timeout {
                waited: elapsed,
                attempts,
            }),
        }
    }
}

/// Poll `handle` until it completes, fails, or `policy.max_wait` has elapsed.
///
/// Transient errors (network failures, 5xx, 429) are logged and the query is
/// repeated on the next tick; any other error ends polling immediately.
pub async fn wait_for_render<S: RenderService + ?Sized>(
    service: &S,
    handle: &JobHandle,
    policy: PollPolicy,
) -> Result<PollOutcome, RenderError> {
    let started = Instant::now();
    let mut attempts: u32 = 0;

    info!(
        "Waiting for render {} (checking every {}s, up to {}s)",
        handle,
        policy.interval.as_secs_f64(),
        policy.max_wait.as_secs_f64()
    );

    loop {
        attempts += 1;
        match service.render_status(handle).await {
            Ok(JobStatus::Completed(artifact)) => {
                let elapsed = started.elapsed();
                info!("Render {} completed after {:.1}s", handle, elapsed.as_secs_f64());
                return Ok(PollOutcome::Completed {
                    artifact,
                    attempts,
                    elapsed,
                });
            }
            Ok(JobStatus::Failed(reason)) => {
                let elapsed = started.elapsed();
                warn!("Render {} failed: {}", handle, reason);
                return Ok(PollOutcome::Failed {
                    reason,
                    attempts,
                    elapsed,
                });
            }
            Ok(status) => {
                info!(
                    "Render {} status: {} (check {}, {:.0}s elapsed)",
                    handle,
                    status,
                    attempts,
                    started.elapsed().as_secs_f64()
                );
            }
            Err(e) if e.is_transient() => {
                match e.retry_after_seconds() {
                    Some(secs) => warn!(
                        "Error checking render {} (check {}, server asked to wait {}s): {}",
                        handle, attempts, secs, e
                    ),
                    None => warn!("Error checking render {} (check {}): {}", handle, attempts, e),
                }
            }
            Err(e) => return Err(e),
        }

        let elapsed = started.elapsed();
        if elapsed >= policy.max_wait {
            warn!("Render {} still not finished after {:.0}s", handle, elapsed.as_secs_f64());
            return Ok(PollOutcome::TimedOut { attempts, elapsed });
        }
        tokio::time::sleep(policy.interval).await;
    }
}
