use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_STRENGTH: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenerationMode {
    #[serde(rename = "text-to-image", alias = "txt2img")]
    TextToImage,
    #[serde(rename = "image-to-image", alias = "img2img")]
    ImageToImage,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextToImage => "text-to-image",
            Self::ImageToImage => "image-to-image",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Forward edges of the job state machine.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Pending, Self::Failed)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum UpscaleFactor {
    #[default]
    X2,
    X4,
}

impl UpscaleFactor {
    pub fn value(&self) -> u8 {
        match self {
            Self::X2 => 2,
            Self::X4 => 4,
        }
    }
}

impl TryFrom<u8> for UpscaleFactor {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Self::X2),
            4 => Ok(Self::X4),
            other => Err(format!("upscale factor must be 2 or 4, got {other}")),
        }
    }
}

impl From<UpscaleFactor> for u8 {
    fn from(factor: UpscaleFactor) -> Self {
        factor.value()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters {
    pub steps: u32,
    pub guidance: f32,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upscale: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upscale_factor: Option<UpscaleFactor>,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            steps: 20,
            guidance: 7.5,
            width: 512,
            height: 512,
            seed: None,
            strength: None,
            upscale: None,
            upscale_factor: None,
        }
    }
}

impl GenerationParameters {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn effective_strength(&self) -> f32 {
        self.strength.unwrap_or(DEFAULT_STRENGTH)
    }
}

/// Uploaded source picture for image-to-image runs.
#[derive(Clone, PartialEq)]
pub struct SourceImage {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SourceImage {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Builds a source image whose MIME type is sniffed from the leading bytes.
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let mime_type = crate::image_processing::detect_mime_type(&bytes)
            .unwrap_or("application/octet-stream");
        Self::new(file_name, mime_type, bytes)
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl std::fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceImage")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub mode: GenerationMode,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub parameters: GenerationParameters,
    pub image: Option<SourceImage>,
}

impl GenerationRequest {
    pub fn text_to_image(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            mode: GenerationMode::TextToImage,
            prompt: prompt.into(),
            negative_prompt: None,
            parameters: GenerationParameters::default(),
            image: None,
        }
    }

    pub fn image_to_image(
        model: impl Into<String>,
        prompt: impl Into<String>,
        image: SourceImage,
    ) -> Self {
        Self {
            model: model.into(),
            mode: GenerationMode::ImageToImage,
            prompt: prompt.into(),
            negative_prompt: None,
            parameters: GenerationParameters::default(),
            image: Some(image),
        }
    }

    pub fn with_parameters(mut self, parameters: GenerationParameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_negative_prompt(mut self, negative_prompt: impl Into<String>) -> Self {
        self.negative_prompt = Some(negative_prompt.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationJob {
    pub id: String,
    pub model: String,
    pub mode: GenerationMode,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub parameters: GenerationParameters,
    pub status: JobStatus,
    pub progress: f32,
    pub result_url: Option<String>,
    pub error_message: Option<String>,
    /// Id assigned by a remote backend, when one drives this job.
    pub remote_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl GenerationJob {
    pub fn pending(id: String, request: &GenerationRequest) -> Self {
        let now = Utc::now();
        Self {
            id,
            model: request.model.clone(),
            mode: request.mode,
            prompt: request.prompt.clone(),
            negative_prompt: request.negative_prompt.clone(),
            parameters: request.parameters.clone(),
            status: JobStatus::Pending,
            progress: 0.0,
            result_url: None,
            error_message: None,
            remote_id: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }
}

/// Partial update applied through the lifecycle manager.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub progress: Option<f32>,
    pub result_url: Option<String>,
    pub error_message: Option<String>,
    pub remote_id: Option<String>,
}

impl JobUpdate {
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn progress(progress: f32) -> Self {
        Self {
            progress: Some(progress),
            ..Default::default()
        }
    }

    pub fn completed(result_url: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Completed),
            progress: Some(100.0),
            result_url: Some(result_url.into()),
            ..Default::default()
        }
    }

    pub fn failed(error_message: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            error_message: Some(error_message.into()),
            ..Default::default()
        }
    }
}
