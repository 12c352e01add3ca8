use crate::job::GenerationJob;

/// Change notifications emitted by the job store, newest state included.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Queued(GenerationJob),
    Processing { job_id: String },
    Progress { job_id: String, progress: f32 },
    Completed { job_id: String, result_url: String },
    Failed { job_id: String, error: String },
    Cleared,
}

impl JobEvent {
    pub fn job_id(&self) -> Option<&str> {
        match self {
            Self::Queued(job) => Some(&job.id),
            Self::Processing { job_id }
            | Self::Progress { job_id, .. }
            | Self::Completed { job_id, .. }
            | Self::Failed { job_id, .. } => Some(job_id),
            Self::Cleared => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}
