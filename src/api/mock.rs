use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::api::GenerationApi;
use crate::api::schemas::{
    GpuMemory, GpuStatus, Health, JobDescriptor, ModelAvailability, ModelDescriptor, SystemStatus,
};
use crate::catalog::KnownModel;
use crate::config::SimulationConfig;
use crate::error::TransportError;
use crate::job::{GenerationJob, GenerationRequest};
use crate::lifecycle::{JobHandle, JobRunner, JobStore, ResultRenderer, SimulatedRunner};

/// In-process stand-in for the generation service; jobs advance on a local timer.
///
/// Requests are accepted as given: validation is the caller's business.
#[derive(Clone)]
pub struct MockApiClient {
    store: JobStore,
    runner: Arc<SimulatedRunner>,
}

impl MockApiClient {
    pub fn new(config: SimulationConfig) -> Self {
        Self::from_runner(SimulatedRunner::new(config))
    }

    pub fn with_renderer(config: SimulationConfig, renderer: Arc<dyn ResultRenderer>) -> Self {
        Self::from_runner(SimulatedRunner::with_renderer(config, renderer))
    }

    fn from_runner(runner: SimulatedRunner) -> Self {
        Self {
            store: JobStore::new(),
            runner: Arc::new(runner),
        }
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Most recent jobs first, at most `limit`.
    pub async fn recent(&self, limit: usize) -> Vec<JobDescriptor> {
        self.store
            .jobs()
            .await
            .iter()
            .take(limit)
            .map(JobDescriptor::from)
            .collect()
    }

    async fn start(&self, request: &GenerationRequest) -> JobDescriptor {
        let job = GenerationJob::pending(Uuid::new_v4().to_string(), request);
        let token = self.store.insert(job.clone()).await;
        debug!(job_id = %job.id, mode = job.mode.as_str(), "mock job accepted");

        let handle = JobHandle::new(job.id.clone(), self.store.clone(), token);
        let runner = Arc::clone(&self.runner);
        let descriptor = JobDescriptor::from(&job);
        let request = request.clone();
        tokio::spawn(async move {
            runner.run(job, request, handle).await;
        });
        descriptor
    }
}

impl Default for MockApiClient {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl std::fmt::Debug for MockApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockApiClient")
            .field("runner", &self.runner)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl GenerationApi for MockApiClient {
    async fn generate_text_to_image(
        &self,
        request: &GenerationRequest,
    ) -> Result<JobDescriptor, TransportError> {
        Ok(self.start(request).await)
    }

    async fn generate_image_to_image(
        &self,
        request: &GenerationRequest,
    ) -> Result<JobDescriptor, TransportError> {
        Ok(self.start(request).await)
    }

    async fn status(&self) -> Result<SystemStatus, TransportError> {
        Ok(SystemStatus {
            status: Health::Healthy,
            gpu: GpuStatus {
                available: true,
                name: Some("NVIDIA RTX 4090".to_string()),
                memory: Some(GpuMemory {
                    total: 24_576,
                    used: 8_192,
                    free: 16_384,
                }),
            },
            models: ModelAvailability {
                loaded: vec![KnownModel::DreamShaperV8.id().to_string()],
                available: KnownModel::all()
                    .iter()
                    .map(|model| model.id().to_string())
                    .collect(),
            },
            queue: self.store.queue_depth().await,
        })
    }

    async fn models(&self) -> Result<Vec<ModelDescriptor>, TransportError> {
        Ok(KnownModel::all().iter().map(KnownModel::descriptor).collect())
    }

    async fn result(&self, id: &str) -> Result<JobDescriptor, TransportError> {
        self.store
            .job(id)
            .await
            .map(|job| JobDescriptor::from(&job))
            .ok_or_else(|| TransportError::NotFound(id.to_string()))
    }
}
