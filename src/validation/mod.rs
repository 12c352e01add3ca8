pub mod file;
pub mod parameters;
pub mod prompt;
pub mod url_validation;

use std::sync::Arc;

use crate::catalog::ModelCatalog;
use crate::error::{ValidationError, ValidationField};
use crate::job::{GenerationMode, GenerationRequest};

pub use file::{validate_image_dimensions, validate_image_file};
pub use parameters::validate_parameters;
pub use prompt::{
    AllowAllPolicy, ContentPolicy, DenylistPolicy, sanitize_prompt, validate_prompt,
};
pub use url_validation::validate_http_url;

pub fn validate_model(model: &str, catalog: &ModelCatalog) -> Result<(), ValidationError> {
    if catalog.contains(model) {
        return Ok(());
    }
    Err(ValidationError::new(
        ValidationField::Model,
        format!("Invalid model. Must be one of: {}", catalog.ids().join(", ")),
    ))
}

/// Runs every client-side check a request must pass before it becomes a job.
#[derive(Clone)]
pub struct RequestValidator {
    policy: Arc<dyn ContentPolicy>,
    catalog: ModelCatalog,
}

impl RequestValidator {
    pub fn new(policy: Arc<dyn ContentPolicy>, catalog: ModelCatalog) -> Self {
        Self { policy, catalog }
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn set_catalog(&mut self, catalog: ModelCatalog) {
        self.catalog = catalog;
    }

    pub fn policy(&self) -> &dyn ContentPolicy {
        self.policy.as_ref()
    }

    pub async fn validate(&self, request: &GenerationRequest) -> Result<(), ValidationError> {
        validate_model(&request.model, &self.catalog)?;
        validate_prompt(&request.prompt, self.policy.as_ref())?;
        validate_parameters(&request.parameters)?;

        if request.mode == GenerationMode::ImageToImage {
            let image = request.image.as_ref().ok_or_else(|| {
                ValidationError::new(
                    ValidationField::Image,
                    "Image-to-image generation requires a source image",
                )
            })?;
            validate_image_file(image)?;
            validate_image_dimensions(image).await?;
        }

        Ok(())
    }
}

impl Default for RequestValidator {
    fn default() -> Self {
        Self::new(Arc::new(DenylistPolicy::default()), ModelCatalog::default())
    }
}

impl std::fmt::Debug for RequestValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestValidator")
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}
