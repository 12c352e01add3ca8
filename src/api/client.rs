use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::GenerationApi;
use crate::api::schemas::{
    ErrorBody, JobDescriptor, ModelDescriptor, SystemStatus, TextToImagePayload,
};
use crate::config::ClientConfig;
use crate::error::{TransportError, ValidationField};
use crate::job::GenerationRequest;

/// Network-backed [`GenerationApi`] speaking JSON and multipart over HTTP.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: Client,
    config: ClientConfig,
}

impl HttpApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let url = self.config.endpoint_url(path);
        debug!("GET {url}");
        let response = self.client.get(&url).send().await?;
        decode(ensure_success(response).await?).await
    }
}

/// Maps a non-success response onto [`TransportError::Status`], preferring the server's message.
async fn ensure_success(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| {
            format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status")
            )
        });
    Err(TransportError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    let text = response.text().await?;
    serde_json::from_str(&text)
        .map_err(|err| TransportError::Decode(format!("{err}, raw response: {text}")))
}

fn image_to_image_form(request: &GenerationRequest) -> Result<Form, TransportError> {
    let params = &request.parameters;
    let mut form = Form::new()
        .text("model", request.model.clone())
        .text("prompt", request.prompt.clone());
    if let Some(negative) = request.negative_prompt.as_ref().filter(|n| !n.is_empty()) {
        form = form.text("negative_prompt", negative.clone());
    }
    form = form
        .text("steps", params.steps.to_string())
        .text("guidance", params.guidance.to_string())
        .text("width", params.width.to_string())
        .text("height", params.height.to_string())
        .text("strength", params.effective_strength().to_string())
        .text("upscale", params.upscale.unwrap_or(false).to_string());
    if let Some(seed) = params.seed {
        form = form.text("seed", seed.to_string());
    }
    if let Some(factor) = params.upscale_factor {
        form = form.text("upscale_factor", factor.value().to_string());
    }

    let image = request.image.as_ref().ok_or_else(|| {
        TransportError::InvalidRequest(format!(
            "missing {} for image-to-image request",
            ValidationField::Image
        ))
    })?;
    let part = Part::bytes(image.bytes.clone())
        .file_name(image.file_name.clone())
        .mime_str(&image.mime_type)?;
    Ok(form.part("image", part))
}

#[async_trait]
impl GenerationApi for HttpApiClient {
    async fn generate_text_to_image(
        &self,
        request: &GenerationRequest,
    ) -> Result<JobDescriptor, TransportError> {
        let url = self.config.endpoint_url(&self.config.endpoints.generate_txt2img);
        debug!(model = %request.model, "POST {url}");
        let response = self
            .client
            .post(&url)
            .json(&TextToImagePayload::from(request))
            .send()
            .await?;
        decode(ensure_success(response).await?).await
    }

    async fn generate_image_to_image(
        &self,
        request: &GenerationRequest,
    ) -> Result<JobDescriptor, TransportError> {
        let url = self.config.endpoint_url(&self.config.endpoints.generate_img2img);
        debug!(model = %request.model, "POST multipart {url}");
        let form = image_to_image_form(request)?;
        let response = self.client.post(&url).multipart(form).send().await?;
        decode(ensure_success(response).await?).await
    }

    async fn status(&self) -> Result<SystemStatus, TransportError> {
        self.get_json(&self.config.endpoints.status).await
    }

    async fn models(&self) -> Result<Vec<ModelDescriptor>, TransportError> {
        self.get_json(&self.config.endpoints.models).await
    }

    async fn result(&self, id: &str) -> Result<JobDescriptor, TransportError> {
        let path = format!("{}/{}", self.config.endpoints.result.trim_end_matches('/'), id);
        self.get_json(&path).await
    }
}
