use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Input field a [`ValidationError`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationField {
    Prompt,
    Steps,
    Guidance,
    Dimensions,
    Strength,
    Seed,
    File,
    Image,
    Model,
}

impl ValidationField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::Steps => "steps",
            Self::Guidance => "guidance",
            Self::Dimensions => "dimensions",
            Self::Strength => "strength",
            Self::Seed => "seed",
            Self::File => "file",
            Self::Image => "image",
            Self::Model => "model",
        }
    }
}

impl fmt::Display for ValidationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-correctable input problem, raised before any job or network call exists.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ValidationError {
    pub field: ValidationField,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: ValidationField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    /// Non-success HTTP status. `message` is the server's own text when it sent one.
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("Job not found")]
    NotFound(String),
}

impl TransportError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("invalid url in {name}: {reason}")]
    InvalidUrl { name: &'static str, reason: String },
}
