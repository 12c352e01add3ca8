pub mod client;
pub mod mock;
pub mod schemas;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::job::{GenerationMode, GenerationRequest};

pub use client::HttpApiClient;
pub use mock::MockApiClient;
pub use schemas::{JobDescriptor, ModelDescriptor, SystemStatus};

/// Boundary between the job lifecycle and an external generation service.
#[async_trait]
pub trait GenerationApi: Send + Sync {
    async fn generate_text_to_image(
        &self,
        request: &GenerationRequest,
    ) -> Result<JobDescriptor, TransportError>;

    async fn generate_image_to_image(
        &self,
        request: &GenerationRequest,
    ) -> Result<JobDescriptor, TransportError>;

    async fn generate(&self, request: &GenerationRequest) -> Result<JobDescriptor, TransportError> {
        match request.mode {
            GenerationMode::TextToImage => self.generate_text_to_image(request).await,
            GenerationMode::ImageToImage => self.generate_image_to_image(request).await,
        }
    }

    async fn status(&self) -> Result<SystemStatus, TransportError>;

    async fn models(&self) -> Result<Vec<ModelDescriptor>, TransportError>;

    async fn result(&self, id: &str) -> Result<JobDescriptor, TransportError>;
}
