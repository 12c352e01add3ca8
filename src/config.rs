use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;
use crate::validation::validate_http_url;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_PORT: u16 = 8000;

/// Endpoint paths of the generation service, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub generate_txt2img: String,
    pub generate_img2img: String,
    pub status: String,
    pub models: String,
    pub result: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            generate_txt2img: "/api/v1/generate/txt2img".to_string(),
            generate_img2img: "/api/v1/generate/img2img".to_string(),
            status: "/api/v1/status".to_string(),
            models: "/api/v1/models".to_string(),
            result: "/api/v1/result".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub endpoints: Endpoints,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub job_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            endpoints: Endpoints::default(),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(1_000),
            job_timeout: Duration::from_secs(300),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = non_empty(lookup("IMAGE_GEN_API_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let mut config = Self::new(validate_http_url("IMAGE_GEN_API_URL", &raw_url)?);
        if let Some(secs) = parse_var::<u64>(&lookup, "IMAGE_GEN_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "IMAGE_GEN_POLL_INTERVAL_MS")? {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "IMAGE_GEN_JOB_TIMEOUT_SECS")? {
            config.job_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Timing of the simulated job progression.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub onset_delay: Duration,
    pub tick_interval: Duration,
    pub settle_delay: Duration,
    pub min_increment: f32,
    pub max_increment: f32,
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            onset_delay: Duration::from_millis(1_000),
            tick_interval: Duration::from_millis(200),
            settle_delay: Duration::from_millis(500),
            min_increment: 5.0,
            max_increment: 20.0,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(ms) = parse_var::<u64>(&lookup, "SIM_ONSET_MS")? {
            config.onset_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "SIM_TICK_MS")? {
            config.tick_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "SIM_SETTLE_MS")? {
            config.settle_delay = Duration::from_millis(ms);
        }
        config.seed = parse_var::<u64>(&lookup, "SIM_SEED")?;
        Ok(config)
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub media_dir: PathBuf,
    pub media_base_url: String,
    pub simulation: SimulationConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = parse_var::<u16>(&lookup, "PORT")?.unwrap_or(DEFAULT_PORT);
        let bind_address = format!("0.0.0.0:{port}");
        let media_dir = non_empty(lookup("MEDIA_DIR"))
            .map(PathBuf::from)
            .unwrap_or_else(default_media_dir);
        let media_base_url = resolve_media_base_url(&lookup, &bind_address);
        Ok(Self {
            port,
            media_dir,
            media_base_url,
            simulation: SimulationConfig::from_lookup(&lookup)?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn default_media_dir() -> PathBuf {
    let mut base = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."));
    base.push("image-gen-studio");
    base
}

fn resolve_media_base_url(lookup: &impl Fn(&str) -> Option<String>, bind_address: &str) -> String {
    if let Some(media_url) = non_empty(lookup("MEDIA_URL")) {
        return media_url.trim().trim_end_matches('/').to_string();
    }
    let domain = non_empty(lookup("DOMAIN")).unwrap_or_else(|| bind_address.to_string());
    let trimmed = domain.trim().trim_end_matches('/');
    let base = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };
    format!("{base}/media")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match non_empty(lookup(name)) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        None => Ok(None),
    }
}
