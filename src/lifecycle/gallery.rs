use crate::job::{GenerationJob, JobStatus};

/// Filter for browsing finished results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryQuery {
    pub search: Option<String>,
    pub model: Option<String>,
}

impl GalleryQuery {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn matches(&self, job: &GenerationJob) -> bool {
        if job.status != JobStatus::Completed || job.result_url.is_none() {
            return false;
        }
        let matches_search = match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                job.prompt.to_lowercase().contains(&term.to_lowercase())
            }
            _ => true,
        };
        let matches_model = match self.model.as_deref() {
            Some("all") | None => true,
            Some(model) => job.model == model,
        };
        matches_search && matches_model
    }
}

/// Distinct models among completed jobs, in collection order.
pub fn gallery_models(jobs: &[GenerationJob]) -> Vec<String> {
    let mut models: Vec<String> = Vec::new();
    for job in jobs {
        if job.status == JobStatus::Completed
            && job.result_url.is_some()
            && !models.contains(&job.model)
        {
            models.push(job.model.clone());
        }
    }
    models
}
