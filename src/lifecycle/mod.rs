pub mod events;
pub mod gallery;
pub mod remote;
pub mod runner;
pub mod simulated;
pub mod store;

use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::GenerationApi;
use crate::api::schemas::QueueDepth;
use crate::catalog::ModelCatalog;
use crate::config::{ClientConfig, SimulationConfig};
use crate::error::{TransportError, ValidationError};
use crate::job::{GenerationJob, GenerationRequest, JobUpdate};
use crate::validation::{RequestValidator, sanitize_prompt};

pub use events::JobEvent;
pub use gallery::GalleryQuery;
pub use remote::RemoteRunner;
pub use runner::{JobHandle, JobRunner};
pub use simulated::{PicsumRenderer, ResultRenderer, SimulatedRunner};
pub use store::{AdvanceOutcome, JobStore};

pub const CANCELLED_MESSAGE: &str = "Job cancelled";

/// Owns the job collection and hands each accepted request to a runner.
#[derive(Clone)]
pub struct JobManager {
    store: JobStore,
    runner: Arc<dyn JobRunner>,
    validator: Arc<RwLock<RequestValidator>>,
}

impl JobManager {
    pub fn new(runner: Arc<dyn JobRunner>, validator: RequestValidator) -> Self {
        Self {
            store: JobStore::new(),
            runner,
            validator: Arc::new(RwLock::new(validator)),
        }
    }

    /// Manager whose jobs progress on a local timer.
    pub fn simulated(config: SimulationConfig) -> Self {
        Self::new(
            Arc::new(SimulatedRunner::new(config)),
            RequestValidator::default(),
        )
    }

    /// Manager whose jobs are executed by `api` and tracked by polling.
    pub fn remote(api: Arc<dyn GenerationApi>, config: &ClientConfig) -> Self {
        Self::new(
            Arc::new(RemoteRunner::from_config(api, config)),
            RequestValidator::default(),
        )
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    pub async fn submit(&self, request: GenerationRequest) -> Result<GenerationJob, ValidationError> {
        // Checks run on the text that will be stored, not on the raw input.
        let mut request = request;
        request.prompt = sanitize_prompt(&request.prompt);
        request.negative_prompt = request
            .negative_prompt
            .as_deref()
            .map(sanitize_prompt)
            .filter(|negative| !negative.is_empty());

        let validator = self.validator.read().await.clone();
        if let Err(err) = validator.validate(&request).await {
            debug!(field = %err.field, "rejected request: {err}");
            return Err(err);
        }

        let job = GenerationJob::pending(Uuid::new_v4().to_string(), &request);
        let token = self.store.insert(job.clone()).await;
        info!(job_id = %job.id, model = %job.model, mode = job.mode.as_str(), "job queued");

        let handle = JobHandle::new(job.id.clone(), self.store.clone(), token);
        let runner = Arc::clone(&self.runner);
        let spawned = job.clone();
        tokio::spawn(async move {
            let job_id = spawned.id.clone();
            runner.run(spawned, request, handle).await;
            debug!(%job_id, "runner finished");
        });

        Ok(job)
    }

    pub async fn advance(&self, id: &str, update: JobUpdate) -> AdvanceOutcome {
        self.store.advance(id, update).await
    }

    pub async fn cancel(&self, id: &str) -> AdvanceOutcome {
        let outcome = self.store.cancel(id, CANCELLED_MESSAGE).await;
        if outcome.is_applied() {
            info!(job_id = id, "job cancelled");
        }
        outcome
    }

    pub async fn clear(&self) {
        self.store.clear().await;
        info!("job history cleared");
    }

    pub async fn jobs(&self) -> Vec<GenerationJob> {
        self.store.jobs().await
    }

    pub async fn job(&self, id: &str) -> Option<GenerationJob> {
        self.store.job(id).await
    }

    pub async fn active_job(&self) -> Option<GenerationJob> {
        self.store.active_job().await
    }

    pub async fn gallery(&self, query: &GalleryQuery) -> Vec<GenerationJob> {
        self.store.gallery(query).await
    }

    pub async fn gallery_models(&self) -> Vec<String> {
        self.store.gallery_models().await
    }

    pub async fn queue_depth(&self) -> QueueDepth {
        self.store.queue_depth().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.store.subscribe()
    }

    pub async fn catalog(&self) -> ModelCatalog {
        self.validator.read().await.catalog().clone()
    }

    pub async fn set_catalog(&self, catalog: ModelCatalog) {
        self.validator.write().await.set_catalog(catalog);
    }

    /// Replaces the accepted model ids with the backend's listing.
    pub async fn refresh_catalog(&self, api: &dyn GenerationApi) -> Result<ModelCatalog, TransportError> {
        let catalog = ModelCatalog::from_descriptors(&api.models().await?);
        info!(models = catalog.ids().len(), "model catalog refreshed");
        self.set_catalog(catalog.clone()).await;
        Ok(catalog)
    }
}

impl std::fmt::Debug for JobManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobManager")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
