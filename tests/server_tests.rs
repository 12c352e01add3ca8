use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use url::Url;

use image_gen_studio::config::{ClientConfig, SimulationConfig};
use image_gen_studio::image_processing::{encode_solid_png, get_dimensions};
use image_gen_studio::job::{GenerationParameters, SourceImage};
use image_gen_studio::lifecycle::{JobEvent, JobManager};
use image_gen_studio::media::{LocalFileStorage, PlaceholderRenderer};
use image_gen_studio::server::{self, AppState};
use image_gen_studio::validation::RequestValidator;
use image_gen_studio::{
    GenerationApi, GenerationRequest, HttpApiClient, JobStatus, MockApiClient, TransportError,
};

struct TestServer {
    addr: SocketAddr,
    _media: TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let media = tempfile::tempdir().unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let storage = Arc::new(LocalFileStorage::new(
            media.path().to_path_buf(),
            format!("http://{addr}/media"),
        ));
        let simulation = SimulationConfig {
            onset_delay: Duration::from_millis(20),
            tick_interval: Duration::from_millis(10),
            settle_delay: Duration::from_millis(20),
            seed: Some(11),
            ..Default::default()
        };
        let api = Arc::new(MockApiClient::with_renderer(
            simulation,
            Arc::new(PlaceholderRenderer::new(storage)),
        ));
        let router = server::router(
            AppState::new(api, RequestValidator::default()),
            media.path(),
        );
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            addr,
            _media: media,
        }
    }

    fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(Url::parse(&self.url()).unwrap());
        config.poll_interval = Duration::from_millis(25);
        config.job_timeout = Duration::from_secs(10);
        config
    }

    fn client(&self) -> HttpApiClient {
        HttpApiClient::new(self.client_config()).unwrap()
    }
}

async fn wait_for_completion(client: &HttpApiClient, id: &str) -> image_gen_studio::api::JobDescriptor {
    for _ in 0..200 {
        let descriptor = client.result(id).await.unwrap();
        if descriptor.status.is_terminal() {
            return descriptor;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("job {id} did not finish");
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = TestServer::start().await;
    let body: serde_json::Value = reqwest::get(format!("{}/health", server.url()))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_status_and_models() {
    let server = TestServer::start().await;
    let client = server.client();

    let status = client.status().await.unwrap();
    assert!(status.gpu.available);
    assert_eq!(status.gpu.name.as_deref(), Some("NVIDIA RTX 4090"));
    assert_eq!(status.queue.pending, 0);

    let models = client.models().await.unwrap();
    assert_eq!(models.len(), 3);
    assert_eq!(models[2].id, "sdxl");
    assert_eq!(models[2].vram_req.as_deref(), Some("12GB"));
}

#[tokio::test]
async fn test_text_to_image_produces_media_file() {
    let server = TestServer::start().await;
    let client = server.client();
    let request = GenerationRequest::text_to_image("sdxl", "a red fox")
        .with_parameters(GenerationParameters::default().with_size(256, 128));

    let accepted = client.generate(&request).await.unwrap();
    assert_eq!(accepted.status, JobStatus::Pending);

    let finished = wait_for_completion(&client, &accepted.id).await;
    assert_eq!(finished.status, JobStatus::Completed);
    let result_url = finished.result_url.unwrap();
    assert_eq!(
        result_url,
        format!("{}/media/generated/{}.png", server.url(), accepted.id)
    );

    let bytes = reqwest::get(&result_url).await.unwrap().bytes().await.unwrap();
    assert_eq!(get_dimensions(&bytes, "image/png").unwrap(), (256, 128));
}

#[tokio::test]
async fn test_validation_failure_is_reported_with_field() {
    let server = TestServer::start().await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/generate/txt2img", server.url()))
        .json(&serde_json::json!({
            "model": "sdxl",
            "prompt": "a fox",
            "steps": 20,
            "guidance": 7.5,
            "width": 500,
            "height": 512
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["field"], "dimensions");
    assert_eq!(body["message"], "Width and height must be divisible by 8");
}

#[tokio::test]
async fn test_server_message_reaches_client() {
    let server = TestServer::start().await;
    let err = server
        .client()
        .generate(&GenerationRequest::text_to_image("sdxl", "   "))
        .await
        .unwrap_err();
    match err {
        TransportError::Status { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Prompt is required");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_result_is_404() {
    let server = TestServer::start().await;
    let err = server.client().result("nope").await.unwrap_err();
    assert_eq!(err.status_code(), Some(404));
    assert_eq!(err.to_string(), "Job not found");
}

#[tokio::test]
async fn test_status_line_used_without_json_body() {
    let server = TestServer::start().await;
    let mut config = server.client_config();
    config.endpoints.status = "/api/v1/missing".to_string();
    let err = HttpApiClient::new(config).unwrap().status().await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 404: Not Found");
}

#[tokio::test]
async fn test_image_to_image_upload() {
    let server = TestServer::start().await;
    let client = server.client();
    let source = SourceImage::from_bytes("cat.png", encode_solid_png(128, 128, [200, 40, 40]).unwrap());
    let request = GenerationRequest::image_to_image("anything-v5", "a cat in armor", source)
        .with_negative_prompt("blurry")
        .with_parameters(GenerationParameters {
            strength: Some(0.6),
            seed: Some(1234),
            ..Default::default()
        });

    let accepted = client.generate(&request).await.unwrap();
    let finished = wait_for_completion(&client, &accepted.id).await;
    assert_eq!(finished.status, JobStatus::Completed);
    assert!(finished.result_url.unwrap().ends_with(".png"));
}

#[tokio::test]
async fn test_image_to_image_rejects_tiny_source() {
    let server = TestServer::start().await;
    let source = SourceImage::from_bytes("dot.png", encode_solid_png(16, 16, [0, 0, 0]).unwrap());
    let request = GenerationRequest::image_to_image("sdxl", "a dot", source);

    let err = server.client().generate(&request).await.unwrap_err();
    assert_eq!(err.status_code(), Some(400));
    assert_eq!(err.to_string(), "Image dimensions must be at least 64x64");
}

#[tokio::test]
async fn test_recent_results_listing() {
    let server = TestServer::start().await;
    let client = server.client();
    let first = client
        .generate(&GenerationRequest::text_to_image("sdxl", "one"))
        .await
        .unwrap();
    let second = client
        .generate(&GenerationRequest::text_to_image("sdxl", "two"))
        .await
        .unwrap();

    let body: serde_json::Value = reqwest::get(format!("{}/api/v1/result", server.url()))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<&str> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
}

#[tokio::test]
async fn test_remote_manager_end_to_end() {
    let server = TestServer::start().await;
    let config = server.client_config();
    let api = Arc::new(HttpApiClient::new(config.clone()).unwrap());
    let manager = JobManager::remote(api, &config);
    let mut events = manager.subscribe();

    let job = manager
        .submit(GenerationRequest::text_to_image("dreamshaper-v8", "a quiet harbor"))
        .await
        .unwrap();

    let outcome = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match events.recv().await.unwrap() {
                JobEvent::Completed { job_id, result_url } if job_id == job.id => {
                    return result_url;
                }
                JobEvent::Failed { job_id, error } if job_id == job.id => {
                    panic!("job failed: {error}");
                }
                _ => {}
            }
        }
    })
    .await
    .unwrap();

    assert!(outcome.contains("/media/generated/"));
    let finished = manager.job(&job.id).await.unwrap();
    assert_eq!(finished.status, JobStatus::Completed);
    assert!(finished.remote_id.is_some());
}
