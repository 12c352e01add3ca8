use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::job::{GenerationJob, GenerationRequest, JobUpdate};
use crate::lifecycle::store::{AdvanceOutcome, JobStore};

/// Strategy that drives a submitted job to a terminal state.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run(&self, job: GenerationJob, request: GenerationRequest, handle: JobHandle);
}

/// A runner's view of its job: updates go through the store's guards.
#[derive(Debug, Clone)]
pub struct JobHandle {
    job_id: String,
    store: JobStore,
    token: CancellationToken,
}

impl JobHandle {
    pub fn new(job_id: String, store: JobStore, token: CancellationToken) -> Self {
        Self {
            job_id,
            store,
            token,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub async fn advance(&self, update: JobUpdate) -> AdvanceOutcome {
        if self.is_cancelled() {
            return AdvanceOutcome::UnknownJob;
        }
        self.store.advance(&self.job_id, update).await
    }

    pub async fn fail(&self, message: impl Into<String>) -> AdvanceOutcome {
        self.advance(JobUpdate::failed(message)).await
    }

    /// Sleeps for `duration`; returns `false` if the job was cancelled meanwhile.
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.token.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}
