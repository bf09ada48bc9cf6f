//! Bounded status polling for provider runs

use crate::client::{JobProvider, RunHandle, RunStatus};
use crate::SearchError;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How long and how often to poll a run
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    /// Optional wall-clock ceiling on top of `interval * max_attempts`
    pub deadline: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_attempts: 24,
            deadline: None,
        }
    }
}

/// How a poll loop ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Succeeded { attempts: u32 },
    /// The provider reported a terminal failure status
    Failed { status: RunStatus, attempts: u32 },
    /// Budget or deadline exhausted while the run was still pending
    TimedOut { attempts: u32 },
    Cancelled { attempts: u32 },
}

impl PollOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Succeeded { attempts }
            | PollOutcome::Failed { attempts, .. }
            | PollOutcome::TimedOut { attempts }
            | PollOutcome::Cancelled { attempts } => *attempts,
        }
    }

    /// `Ok` only for a succeeded run
    pub fn into_result(self) -> Result<u32, SearchError> {
        match self {
            PollOutcome::Succeeded { attempts } => Ok(attempts),
            PollOutcome::Failed { status, .. } => Err(SearchError::JobFailed(status)),
            PollOutcome::TimedOut { attempts } => Err(SearchError::JobTimedOut { attempts }),
            PollOutcome::Cancelled { .. } => Err(SearchError::Cancelled),
        }
    }
}

/// Resolves a run handle to a terminal outcome
pub struct JobPoller<'a> {
    provider: &'a dyn JobProvider,
    policy: PollPolicy,
}

impl<'a> JobPoller<'a> {
    pub fn new(provider: &'a dyn JobProvider, policy: PollPolicy) -> Self {
        Self { provider, policy }
    }

    pub async fn poll(&self, run: &RunHandle, cancel: &CancellationToken) -> PollOutcome {
        let mut attempts = 0u32;
        let outcome = match self.policy.deadline {
            Some(deadline) => {
                let result = tokio::time::timeout(deadline, self.poll_loop(run, cancel, &mut attempts)).await;
                match result {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!(run_id = %run.run_id, attempts, "Poll deadline reached");
                        PollOutcome::TimedOut { attempts }
                    }
                }
            }
            None => self.poll_loop(run, cancel, &mut attempts).await,
        };

        match &outcome {
            PollOutcome::Succeeded { attempts } => {
                info!(run_id = %run.run_id, attempts, "Provider run succeeded")
            }
            PollOutcome::Failed { status, attempts } => {
                warn!(run_id = %run.run_id, status = %status, attempts, "Provider run failed")
            }
            PollOutcome::TimedOut { attempts } => {
                warn!(run_id = %run.run_id, attempts, "Provider run timed out")
            }
            PollOutcome::Cancelled { attempts } => {
                info!(run_id = %run.run_id, attempts, "Polling cancelled")
            }
        }
        outcome
    }

    async fn poll_loop(&self, run: &RunHandle, cancel: &CancellationToken, attempts: &mut u32) -> PollOutcome {
        while *attempts < self.policy.max_attempts {
            tokio::select! {
                _ = cancel.cancelled() => return PollOutcome::Cancelled { attempts: *attempts },
                _ = tokio::time::sleep(self.policy.interval) => {}
            }

            *attempts += 1;
            match self.provider.get_status(run).await {
                Ok(RunStatus::Succeeded) => return PollOutcome::Succeeded { attempts: *attempts },
                Ok(status) if status.is_terminal_failure() => {
                    return PollOutcome::Failed {
                        status,
                        attempts: *attempts,
                    }
                }
                Ok(status) => {
                    debug!(run_id = %run.run_id, attempt = *attempts, status = %status, "Run still pending");
                }
                Err(e) => {
                    warn!(run_id = %run.run_id, attempt = *attempts, error = %e, "Status check failed, will retry");
                }
            }
        }
        PollOutcome::TimedOut { attempts: *attempts }
    }
}
