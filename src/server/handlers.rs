use std::collections::HashMap;
use std::str::FromStr;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::api::GenerationApi;
use crate::api::schemas::{JobDescriptor, ModelDescriptor, SystemStatus, TextToImagePayload};
use crate::error::{ValidationError, ValidationField};
use crate::image_processing::detect_mime_type;
use crate::job::{GenerationRequest, SourceImage, UpscaleFactor};
use crate::server::AppState;
use crate::server::error::ApiError;

const RECENT_RESULTS: usize = 20;

pub async fn text_to_image(
    State(state): State<AppState>,
    payload: Result<Json<TextToImagePayload>, JsonRejection>,
) -> Result<Json<JobDescriptor>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let request = payload.into_request();
    state.validator.validate(&request).await?;
    let descriptor = state.api.generate_text_to_image(&request).await?;
    info!(job_id = %descriptor.id, model = %request.model, "txt2img accepted");
    Ok(Json(descriptor))
}

pub async fn image_to_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<JobDescriptor>, ApiError> {
    let request = read_image_form(multipart).await?;
    state.validator.validate(&request).await?;
    let descriptor = state.api.generate_image_to_image(&request).await?;
    info!(job_id = %descriptor.id, model = %request.model, "img2img accepted");
    Ok(Json(descriptor))
}

pub async fn status(State(state): State<AppState>) -> Result<Json<SystemStatus>, ApiError> {
    Ok(Json(state.api.status().await?))
}

pub async fn models(State(state): State<AppState>) -> Result<Json<Vec<ModelDescriptor>>, ApiError> {
    Ok(Json(state.api.models().await?))
}

pub async fn result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobDescriptor>, ApiError> {
    match state.api.result(&id).await {
        Ok(descriptor) => Ok(Json(descriptor)),
        Err(err) if err.status_code() == Some(404) => Err(ApiError::not_found("Job not found")),
        Err(err) => Err(err.into()),
    }
}

pub async fn recent_results(State(state): State<AppState>) -> Json<Value> {
    let results = state.api.recent(RECENT_RESULTS).await;
    Json(json!({ "results": results }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

struct FormFields(HashMap<String, String>);

impl FormFields {
    fn take(&mut self, name: &str) -> Option<String> {
        self.0.remove(name).filter(|value| !value.trim().is_empty())
    }

    fn number<T: FromStr>(
        &mut self,
        name: &str,
        field: ValidationField,
    ) -> Result<Option<T>, ValidationError> {
        match self.take(name) {
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ValidationError::new(field, format!("{name} must be a number"))),
            None => Ok(None),
        }
    }
}

async fn read_image_form(mut multipart: Multipart) -> Result<GenerationRequest, ApiError> {
    let mut fields = FormFields(HashMap::new());
    let mut image = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return Err(ApiError::bad_request(format!("Failed to read form: {err}"))),
        };
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|err| ApiError::bad_request(format!("Failed to read image: {err}")))?;
            let mime_type = content_type
                .or_else(|| detect_mime_type(&bytes).map(str::to_string))
                .unwrap_or_else(|| "application/octet-stream".to_string());
            debug!(%file_name, %mime_type, size = bytes.len(), "received source image");
            image = Some(SourceImage::new(file_name, mime_type, bytes.to_vec()));
        } else {
            let value = field
                .text()
                .await
                .map_err(|err| ApiError::bad_request(format!("Failed to read {name}: {err}")))?;
            fields.0.insert(name, value);
        }
    }

    let image = image.ok_or_else(|| {
        ValidationError::new(
            ValidationField::Image,
            "Image-to-image generation requires a source image",
        )
    })?;
    let model = fields.take("model").unwrap_or_default();
    let prompt = fields.take("prompt").unwrap_or_default();
    let mut request = GenerationRequest::image_to_image(model, prompt, image);
    request.negative_prompt = fields.take("negative_prompt");

    let params = &mut request.parameters;
    if let Some(steps) = fields.number("steps", ValidationField::Steps)? {
        params.steps = steps;
    }
    if let Some(guidance) = fields.number("guidance", ValidationField::Guidance)? {
        params.guidance = guidance;
    }
    if let Some(width) = fields.number("width", ValidationField::Dimensions)? {
        params.width = width;
    }
    if let Some(height) = fields.number("height", ValidationField::Dimensions)? {
        params.height = height;
    }
    params.seed = fields.number("seed", ValidationField::Seed)?;
    params.strength = fields.number("strength", ValidationField::Strength)?;
    params.upscale = match fields.take("upscale") {
        Some(raw) => Some(
            raw.trim()
                .parse::<bool>()
                .map_err(|_| ApiError::bad_request("upscale must be true or false"))?,
        ),
        None => None,
    };
    params.upscale_factor = match fields.take("upscale_factor") {
        Some(raw) => {
            let value = raw
                .trim()
                .parse::<u8>()
                .map_err(|_| ApiError::bad_request("upscale_factor must be 2 or 4"))?;
            Some(UpscaleFactor::try_from(value).map_err(ApiError::bad_request)?)
        }
        None => None,
    };
    Ok(request)
}
