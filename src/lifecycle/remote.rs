use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::api::GenerationApi;
use crate::api::schemas::JobDescriptor;
use crate::config::ClientConfig;
use crate::job::{GenerationJob, GenerationRequest, JobStatus, JobUpdate};
use crate::lifecycle::runner::{JobHandle, JobRunner};
use crate::lifecycle::store::AdvanceOutcome;

/// Submits to a [`GenerationApi`] and mirrors the backend's state by polling.
pub struct RemoteRunner {
    api: Arc<dyn GenerationApi>,
    poll_interval: Duration,
    job_timeout: Duration,
}

enum Flow {
    Continue,
    Stop,
}

impl RemoteRunner {
    pub fn new(api: Arc<dyn GenerationApi>, poll_interval: Duration, job_timeout: Duration) -> Self {
        Self {
            api,
            poll_interval,
            job_timeout,
        }
    }

    pub fn from_config(api: Arc<dyn GenerationApi>, config: &ClientConfig) -> Self {
        Self::new(api, config.poll_interval, config.job_timeout)
    }

    async fn mirror(&self, handle: &JobHandle, descriptor: &JobDescriptor) -> Flow {
        let outcome = match descriptor.status {
            JobStatus::Pending => return Flow::Continue,
            JobStatus::Processing | JobStatus::Failed => {
                handle.advance(descriptor.to_update()).await
            }
            JobStatus::Completed => {
                // Backends may skip straight to completed between polls.
                let step = handle.advance(JobUpdate::status(JobStatus::Processing)).await;
                if !step.is_applied() {
                    return Flow::Stop;
                }
                handle.advance(descriptor.to_update()).await
            }
        };

        match outcome {
            AdvanceOutcome::Applied if descriptor.status.is_terminal() => Flow::Stop,
            AdvanceOutcome::Applied => Flow::Continue,
            AdvanceOutcome::Rejected(reason) => {
                warn!(job_id = handle.job_id(), "backend update rejected: {reason}");
                handle
                    .fail(format!("Backend reported an invalid update: {reason}"))
                    .await;
                Flow::Stop
            }
            AdvanceOutcome::UnknownJob | AdvanceOutcome::Terminal => Flow::Stop,
        }
    }
}

impl std::fmt::Debug for RemoteRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteRunner")
            .field("poll_interval", &self.poll_interval)
            .field("job_timeout", &self.job_timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl JobRunner for RemoteRunner {
    async fn run(&self, job: GenerationJob, request: GenerationRequest, handle: JobHandle) {
        let started = Instant::now();
        let submitted = tokio::select! {
            _ = handle.token().cancelled() => return,
            submitted = self.api.generate(&request) => submitted,
        };
        let mut descriptor = match submitted {
            Ok(descriptor) => descriptor,
            Err(err) => {
                warn!(job_id = %job.id, "submission failed: {err}");
                handle.fail(err.to_string()).await;
                return;
            }
        };
        let remote_id = descriptor.id.clone();
        debug!(job_id = %job.id, %remote_id, "backend accepted job");
        handle
            .advance(JobUpdate {
                remote_id: Some(remote_id.clone()),
                ..Default::default()
            })
            .await;

        loop {
            if let Flow::Stop = self.mirror(&handle, &descriptor).await {
                return;
            }
            if started.elapsed() >= self.job_timeout {
                warn!(job_id = %job.id, "job timed out");
                handle
                    .fail(format!(
                        "Generation timed out after {} seconds",
                        self.job_timeout.as_secs()
                    ))
                    .await;
                return;
            }
            if !handle.sleep(self.poll_interval).await {
                return;
            }
            let polled = tokio::select! {
                _ = handle.token().cancelled() => return,
                polled = self.api.result(&remote_id) => polled,
            };
            descriptor = match polled {
                Ok(descriptor) => descriptor,
                Err(err) => {
                    warn!(job_id = %job.id, "polling failed: {err}");
                    handle.fail(err.to_string()).await;
                    return;
                }
            };
        }
    }
}
