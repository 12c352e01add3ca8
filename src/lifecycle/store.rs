use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{RwLock, broadcast};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::schemas::QueueDepth;
use crate::job::{GenerationJob, JobStatus, JobUpdate};
use crate::lifecycle::events::JobEvent;
use crate::lifecycle::gallery::{GalleryQuery, gallery_models};

const EVENT_CAPACITY: usize = 256;
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Result of applying a [`JobUpdate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Applied,
    /// No job with that id; updates for cleared jobs land here.
    UnknownJob,
    /// The job already completed or failed.
    Terminal,
    Rejected(String),
}

impl AdvanceOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

struct StoreState {
    /// Newest first.
    jobs: Vec<GenerationJob>,
    active: Option<String>,
    root: CancellationToken,
    tokens: HashMap<String, CancellationToken>,
}

impl StoreState {
    fn apply(
        &mut self,
        id: &str,
        update: JobUpdate,
        events: &broadcast::Sender<JobEvent>,
    ) -> AdvanceOutcome {
        let Some(job) = self.jobs.iter_mut().find(|job| job.id == id) else {
            debug!(job_id = id, "ignoring update for unknown job");
            return AdvanceOutcome::UnknownJob;
        };
        if job.status.is_terminal() {
            warn!(job_id = id, status = job.status.as_str(), "ignoring update for finished job");
            return AdvanceOutcome::Terminal;
        }

        let current = job.status;
        let next = update.status.unwrap_or(current);
        if next != current && !current.can_transition_to(next) {
            return AdvanceOutcome::Rejected(format!(
                "cannot move job from {} to {}",
                current.as_str(),
                next.as_str()
            ));
        }
        if next == JobStatus::Completed && update.result_url.is_none() && job.result_url.is_none() {
            return AdvanceOutcome::Rejected("completed job needs a result".to_string());
        }

        if let Some(remote_id) = update.remote_id {
            job.remote_id = Some(remote_id);
        }
        let previous_progress = job.progress;
        match next {
            JobStatus::Pending => {}
            JobStatus::Processing | JobStatus::Failed => {
                if let Some(progress) = update.progress {
                    job.progress = job.progress.max(progress.clamp(0.0, 100.0));
                }
            }
            JobStatus::Completed => {
                job.progress = 100.0;
                if update.result_url.is_some() {
                    job.result_url = update.result_url;
                }
            }
        }
        if next == JobStatus::Failed {
            let message = update
                .error_message
                .filter(|message| !message.trim().is_empty())
                .or(job.error_message.take())
                .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
            job.error_message = Some(message);
        }

        let now = Utc::now();
        job.status = next;
        job.updated_at = now;
        if next.is_terminal() {
            job.completed_at = Some(now);
            info!(job_id = id, status = next.as_str(), "job finished");
        }

        let job_id = job.id.clone();
        if next == JobStatus::Processing && current != JobStatus::Processing {
            let _ = events.send(JobEvent::Processing {
                job_id: job_id.clone(),
            });
        }
        if job.progress > previous_progress && next != JobStatus::Completed {
            let _ = events.send(JobEvent::Progress {
                job_id: job_id.clone(),
                progress: job.progress,
            });
        }
        match next {
            JobStatus::Completed => {
                let _ = events.send(JobEvent::Completed {
                    job_id: job_id.clone(),
                    result_url: job.result_url.clone().unwrap_or_default(),
                });
            }
            JobStatus::Failed => {
                let _ = events.send(JobEvent::Failed {
                    job_id: job_id.clone(),
                    error: job.error_message.clone().unwrap_or_default(),
                });
            }
            _ => {}
        }

        if next.is_terminal() {
            self.tokens.remove(&job_id);
            if self.active.as_deref() == Some(job_id.as_str()) {
                self.active = None;
            }
        }
        AdvanceOutcome::Applied
    }
}

/// Shared, ordered job collection plus the cancellation registry of its runners.
#[derive(Clone)]
pub struct JobStore {
    state: Arc<RwLock<StoreState>>,
    events: broadcast::Sender<JobEvent>,
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(StoreState {
                jobs: Vec::new(),
                active: None,
                root: CancellationToken::new(),
                tokens: HashMap::new(),
            })),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    /// Adds `job` at the front, marks it active and returns the token its runner observes.
    pub async fn insert(&self, job: GenerationJob) -> CancellationToken {
        let mut state = self.state.write().await;
        let token = state.root.child_token();
        state.tokens.insert(job.id.clone(), token.clone());
        state.active = Some(job.id.clone());
        state.jobs.insert(0, job.clone());
        let _ = self.events.send(JobEvent::Queued(job));
        token
    }

    pub async fn advance(&self, id: &str, update: JobUpdate) -> AdvanceOutcome {
        let mut state = self.state.write().await;
        state.apply(id, update, &self.events)
    }

    /// Stops the job's runner and fails it with `reason`.
    pub async fn cancel(&self, id: &str, reason: &str) -> AdvanceOutcome {
        let mut state = self.state.write().await;
        if let Some(token) = state.tokens.get(id) {
            token.cancel();
        }
        state.apply(id, JobUpdate::failed(reason), &self.events)
    }

    /// Empties the collection and cancels every outstanding runner.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.root.cancel();
        state.root = CancellationToken::new();
        state.tokens.clear();
        state.jobs.clear();
        state.active = None;
        let _ = self.events.send(JobEvent::Cleared);
    }

    pub async fn jobs(&self) -> Vec<GenerationJob> {
        self.state.read().await.jobs.clone()
    }

    pub async fn job(&self, id: &str) -> Option<GenerationJob> {
        let state = self.state.read().await;
        state.jobs.iter().find(|job| job.id == id).cloned()
    }

    pub async fn active_job(&self) -> Option<GenerationJob> {
        let state = self.state.read().await;
        let active = state.active.as_deref()?;
        state.jobs.iter().find(|job| job.id == active).cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.jobs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn queue_depth(&self) -> QueueDepth {
        let state = self.state.read().await;
        state
            .jobs
            .iter()
            .fold(QueueDepth::default(), |mut depth, job| {
                match job.status {
                    JobStatus::Pending => depth.pending += 1,
                    JobStatus::Processing => depth.processing += 1,
                    _ => {}
                }
                depth
            })
    }

    pub async fn gallery(&self, query: &GalleryQuery) -> Vec<GenerationJob> {
        let state = self.state.read().await;
        state
            .jobs
            .iter()
            .filter(|job| query.matches(job))
            .cloned()
            .collect()
    }

    pub async fn gallery_models(&self) -> Vec<String> {
        gallery_models(&self.state.read().await.jobs)
    }
}

impl std::fmt::Debug for JobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobStore").finish_non_exhaustive()
    }
}
