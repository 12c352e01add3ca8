use serde::{Deserialize, Serialize};

use crate::job::{GenerationJob, GenerationRequest, JobStatus, JobUpdate, UpscaleFactor};

/// Snapshot of a job as the generation service reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescriptor {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub progress: f32,
    #[serde(default, alias = "result_url", skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    #[serde(default, alias = "error_message", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl JobDescriptor {
    /// The update this descriptor implies; the remote id is carried separately.
    pub fn to_update(&self) -> JobUpdate {
        JobUpdate {
            status: Some(self.status),
            progress: Some(self.progress),
            result_url: self.result_url.clone(),
            error_message: self.error_message.clone(),
            remote_id: None,
        }
    }
}

impl From<&GenerationJob> for JobDescriptor {
    fn from(job: &GenerationJob) -> Self {
        Self {
            id: job.id.clone(),
            status: job.status,
            progress: job.progress,
            result_url: job.result_url.clone(),
            error_message: job.error_message.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    Healthy,
    Degraded,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuMemory {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuStatus {
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<GpuMemory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModelAvailability {
    pub loaded: Vec<String>,
    pub available: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueueDepth {
    pub pending: usize,
    pub processing: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub status: Health,
    pub gpu: GpuStatus,
    pub models: ModelAvailability,
    pub queue: QueueDepth,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "vram_req", skip_serializing_if = "Option::is_none")]
    pub vram_req: Option<String>,
    #[serde(default, alias = "best_for", skip_serializing_if = "Option::is_none")]
    pub best_for: Option<String>,
}

/// Error body returned by the service on non-success responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorBody {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn into_message(self) -> Option<String> {
        self.message
            .or(self.error)
            .filter(|message| !message.trim().is_empty())
    }
}

/// JSON body of a text-to-image call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextToImagePayload {
    pub model: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    pub steps: u32,
    pub guidance: f32,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upscale: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upscale_factor: Option<UpscaleFactor>,
}

impl From<&GenerationRequest> for TextToImagePayload {
    fn from(request: &GenerationRequest) -> Self {
        let params = &request.parameters;
        Self {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            negative_prompt: request.negative_prompt.clone(),
            steps: params.steps,
            guidance: params.guidance,
            width: params.width,
            height: params.height,
            seed: params.seed,
            upscale: params.upscale,
            upscale_factor: params.upscale_factor,
        }
    }
}

impl TextToImagePayload {
    pub fn into_request(self) -> GenerationRequest {
        let mut request = GenerationRequest::text_to_image(self.model, self.prompt);
        request.negative_prompt = self.negative_prompt;
        request.parameters.steps = self.steps;
        request.parameters.guidance = self.guidance;
        request.parameters.width = self.width;
        request.parameters.height = self.height;
        request.parameters.seed = self.seed;
        request.parameters.upscale = self.upscale;
        request.parameters.upscale_factor = self.upscale_factor;
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_accepts_both_casings() {
        let camel: JobDescriptor = serde_json::from_str(
            r#"{"id":"a","status":"completed","progress":100,"resultUrl":"http://x/a.png"}"#,
        )
        .unwrap();
        let snake: JobDescriptor = serde_json::from_str(
            r#"{"id":"a","status":"completed","progress":100,"result_url":"http://x/a.png"}"#,
        )
        .unwrap();
        assert_eq!(camel, snake);
        assert_eq!(camel.result_url.as_deref(), Some("http://x/a.png"));
    }

    #[test]
    fn test_descriptor_serializes_camel_case() {
        let descriptor = JobDescriptor {
            id: "b".into(),
            status: JobStatus::Failed,
            progress: 40.0,
            result_url: None,
            error_message: Some("out of memory".into()),
        };
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["errorMessage"], "out of memory");
        assert_eq!(json["status"], "failed");
        assert!(json.get("resultUrl").is_none());
    }

    #[test]
    fn test_text_to_image_payload_fields() {
        let mut request = GenerationRequest::text_to_image("sdxl", "a red fox")
            .with_negative_prompt("blurry");
        request.parameters.seed = Some(42);
        request.parameters.upscale = Some(true);
        request.parameters.upscale_factor = Some(UpscaleFactor::X4);

        let json = serde_json::to_value(TextToImagePayload::from(&request)).unwrap();
        assert_eq!(json["model"], "sdxl");
        assert_eq!(json["negative_prompt"], "blurry");
        assert_eq!(json["steps"], 20);
        assert_eq!(json["width"], 512);
        assert_eq!(json["seed"], 42);
        assert_eq!(json["upscale_factor"], 4);
        assert!(json.get("strength").is_none());
    }

    #[test]
    fn test_upscale_factor_rejects_three() {
        let raw = r#"{"model":"sdxl","prompt":"p","steps":20,"guidance":7.5,"width":512,"height":512,"upscale_factor":3}"#;
        assert!(serde_json::from_str::<TextToImagePayload>(raw).is_err());
    }

    #[test]
    fn test_error_body_prefers_message() {
        let body: ErrorBody = serde_json::from_str(r#"{"error":"e","message":"m"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("m"));
        let body: ErrorBody = serde_json::from_str(r#"{"error":"unknown model_id"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("unknown model_id"));
    }
}
