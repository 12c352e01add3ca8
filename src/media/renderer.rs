use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tracing::debug;

use crate::image_processing::encode_solid_png;
use crate::job::GenerationJob;
use crate::lifecycle::ResultRenderer;
use crate::media::hash::prompt_color;
use crate::media::storage::{LocalFileStorage, generated_key};

/// Writes a solid-colour PNG per job so results resolve to real files.
#[derive(Debug, Clone)]
pub struct PlaceholderRenderer {
    storage: Arc<LocalFileStorage>,
}

impl PlaceholderRenderer {
    pub fn new(storage: Arc<LocalFileStorage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl ResultRenderer for PlaceholderRenderer {
    async fn render(&self, job: &GenerationJob) -> anyhow::Result<String> {
        let key = generated_key(&job.id);
        if self.storage.exists(&key).await? {
            debug!(job_id = %job.id, "placeholder result already stored");
            return Ok(self.storage.public_url(&key));
        }

        let (width, height) = (job.parameters.width, job.parameters.height);
        let color = prompt_color(&job.prompt);
        let png = tokio::task::spawn_blocking(move || encode_solid_png(width, height, color))
            .await
            .context("placeholder encoder panicked")??;

        self.storage
            .put(&key, &png)
            .await
            .with_context(|| format!("failed to store {key}"))?;
        debug!(job_id = %job.id, bytes = png.len(), "stored placeholder result");
        Ok(self.storage.public_url(&key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_processing::get_dimensions;
    use crate::job::{GenerationParameters, GenerationRequest};

    #[tokio::test]
    async fn test_renders_job_sized_png() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(LocalFileStorage::new(
            dir.path().to_path_buf(),
            "http://localhost:8000/media",
        ));
        let request = GenerationRequest::text_to_image("sdxl", "a red fox")
            .with_parameters(GenerationParameters::default().with_size(128, 64));
        let job = GenerationJob::pending("job-1".to_string(), &request);

        let url = PlaceholderRenderer::new(storage.clone()).render(&job).await.unwrap();
        assert_eq!(url, "http://localhost:8000/media/generated/job-1.png");

        let bytes = std::fs::read(dir.path().join("generated/job-1.png")).unwrap();
        assert_eq!(get_dimensions(&bytes, "image/png").unwrap(), (128, 64));
    }

    #[tokio::test]
    async fn test_existing_result_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(LocalFileStorage::new(
            dir.path().to_path_buf(),
            "http://localhost:8000/media",
        ));
        storage.put("generated/job-2.png", b"kept").await.unwrap();
        let request = GenerationRequest::text_to_image("sdxl", "a red fox");
        let job = GenerationJob::pending("job-2".to_string(), &request);

        let url = PlaceholderRenderer::new(storage).render(&job).await.unwrap();
        assert_eq!(url, "http://localhost:8000/media/generated/job-2.png");
        assert_eq!(std::fs::read(dir.path().join("generated/job-2.png")).unwrap(), b"kept");
    }
}
