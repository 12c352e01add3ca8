pub mod error;
pub mod handlers;

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::services::ServeDir;

use crate::api::MockApiClient;
use crate::validation::RequestValidator;

pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared handler state of the development backend.
#[derive(Debug, Clone)]
pub struct AppState {
    pub api: Arc<MockApiClient>,
    pub validator: Arc<RequestValidator>,
}

impl AppState {
    pub fn new(api: Arc<MockApiClient>, validator: RequestValidator) -> Self {
        Self {
            api,
            validator: Arc::new(validator),
        }
    }
}

pub fn router(state: AppState, media_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/api/v1/generate/txt2img", post(handlers::text_to_image))
        .route(
            "/api/v1/generate/img2img",
            post(handlers::image_to_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/v1/status", get(handlers::status))
        .route("/api/v1/models", get(handlers::models))
        .route("/api/v1/result", get(handlers::recent_results))
        .route("/api/v1/result/{id}", get(handlers::result))
        .route("/health", get(handlers::health))
        .nest_service("/media", ServeDir::new(media_dir.as_ref()))
        .with_state(state)
}
