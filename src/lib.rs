pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod image_processing;
pub mod job;
pub mod lifecycle;
pub mod media;
pub mod server;
pub mod validation;

pub use api::{GenerationApi, HttpApiClient, MockApiClient};
pub use error::{ConfigError, TransportError, ValidationError, ValidationField};
pub use job::{GenerationJob, GenerationRequest, JobStatus, JobUpdate};
pub use lifecycle::{AdvanceOutcome, JobEvent, JobManager};
