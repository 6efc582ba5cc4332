// src/core/config_manager.rs
//! Process-wide configuration, read once at startup.
//!
//! Sources, later ones winning: built-in defaults, the section of an optional
//! `config.yaml` matching `ENVIRONMENT` (`local` or `production`), then
//! environment variables.

use crate::extraction::{ExhaustionPolicy, ExtractionProfile, ExtractorConfig};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_API_URL: &str = "https://api.replicate.com/v1";
pub const DEFAULT_MODEL: &str = "meta/meta-llama-3-8b-instruct";
pub const DEFAULT_MAX_BODY_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub environment: String,
    pub inference: InferenceConfig,
    pub extraction: ExtractorConfig,
    pub server: ServerConfig,
}

#[derive(Clone)]
pub struct InferenceConfig {
    pub api_url: String,
    pub model: String,
    pub api_token: Option<String>,
}

impl fmt::Debug for InferenceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceConfig")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_token: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub max_body_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    local: FileSettings,
    #[serde(default)]
    production: FileSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    inference: FileInference,
    extraction: FileExtraction,
    server: FileServer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileInference {
    api_url: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileExtraction {
    profile: Option<String>,
    on_exhaustion: Option<String>,
    max_attempts: Option<u32>,
    backoff_ms: Option<u64>,
    deadline_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileServer {
    max_body_bytes: Option<u64>,
}

impl ConfigManager {
    /// Load configuration from `config.yaml` (if present) and the process environment
    pub fn load() -> Result<Self> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "local".to_string());
        info!("Loading configuration for environment: {}", environment);

        let config_path = PathBuf::from("config.yaml");
        let config_yaml = if config_path.exists() {
            Some(std::fs::read_to_string(&config_path).context("Failed to read config.yaml")?)
        } else {
            None
        };

        Self::from_sources(&environment, config_yaml.as_deref(), |key| {
            std::env::var(key).ok()
        })
    }

    pub fn from_sources(
        environment: &str,
        config_yaml: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let settings = match config_yaml {
            Some(content) => {
                let file: ConfigFile =
                    serde_yaml::from_str(content).context("Failed to parse config.yaml")?;
                match environment {
                    "production" => file.production,
                    _ => file.local,
                }
            }
            None => FileSettings::default(),
        };

        let mut inference = InferenceConfig::default();
        let mut extraction = ExtractorConfig::default();
        let mut server = ServerConfig::default();

        // config.yaml
        if let Some(api_url) = settings.inference.api_url {
            inference.api_url = api_url;
        }
        if let Some(model) = settings.inference.model {
            inference.model = model;
        }
        if let Some(profile) = settings.extraction.profile {
            extraction.profile = parse_profile(&profile)?;
        }
        if let Some(policy) = settings.extraction.on_exhaustion {
            extraction.on_exhaustion = parse_policy(&policy)?;
        }
        if let Some(max_attempts) = settings.extraction.max_attempts {
            extraction.max_attempts = max_attempts;
        }
        if let Some(backoff_ms) = settings.extraction.backoff_ms {
            extraction.backoff_base = Duration::from_millis(backoff_ms);
        }
        if let Some(deadline_secs) = settings.extraction.deadline_secs {
            extraction.deadline = Some(Duration::from_secs(deadline_secs));
        }
        if let Some(max_body_bytes) = settings.server.max_body_bytes {
            server.max_body_bytes = max_body_bytes;
        }

        // environment
        inference.api_token = env("REPLICATE_API_TOKEN").filter(|token| !token.trim().is_empty());
        if let Some(api_url) = env("INFERENCE_API_URL") {
            inference.api_url = api_url;
        }
        if let Some(model) = env("INFERENCE_MODEL") {
            inference.model = model;
        }
        if let Some(profile) = env("EXTRACTION_PROFILE") {
            extraction.profile = parse_profile(&profile)?;
        }
        if let Some(policy) = env("EXTRACTION_ON_EXHAUSTION") {
            extraction.on_exhaustion = parse_policy(&policy)?;
        }
        if let Some(max_attempts) = env("EXTRACTION_MAX_ATTEMPTS") {
            extraction.max_attempts = max_attempts
                .trim()
                .parse()
                .context("EXTRACTION_MAX_ATTEMPTS must be a positive integer")?;
        }
        if let Some(backoff_ms) = env("EXTRACTION_BACKOFF_MS") {
            let backoff_ms: u64 = backoff_ms
                .trim()
                .parse()
                .context("EXTRACTION_BACKOFF_MS must be a number of milliseconds")?;
            extraction.backoff_base = Duration::from_millis(backoff_ms);
        }
        if let Some(deadline_secs) = env("EXTRACTION_DEADLINE_SECS") {
            let deadline_secs: u64 = deadline_secs
                .trim()
                .parse()
                .context("EXTRACTION_DEADLINE_SECS must be a number of seconds")?;
            extraction.deadline = Some(Duration::from_secs(deadline_secs));
        }
        if let Some(max_body_bytes) = env("MAX_BODY_BYTES") {
            server.max_body_bytes = max_body_bytes
                .trim()
                .parse()
                .context("MAX_BODY_BYTES must be a number of bytes")?;
        }

        if extraction.max_attempts == 0 {
            anyhow::bail!("EXTRACTION_MAX_ATTEMPTS must be at least 1");
        }

        Ok(Self {
            environment: environment.to_string(),
            inference,
            extraction,
            server,
        })
    }
}

fn parse_profile(value: &str) -> Result<ExtractionProfile> {
    value.parse().map_err(|e: String| anyhow::anyhow!(e))
}

fn parse_policy(value: &str) -> Result<ExhaustionPolicy> {
    value.parse().map_err(|e: String| anyhow::anyhow!(e))
}
