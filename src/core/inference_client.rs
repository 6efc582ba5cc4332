// src/core/inference_client.rs
//! Client for the hosted text-generation API

use crate::core::config_manager::InferenceConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const SUCCEEDED: &str = "succeeded";

/// Opaque text completion: prompt in, text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn infer(&self, prompt: &str, max_output_tokens: u32) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct PredictionRequest<'a> {
    input: PredictionInput<'a>,
}

#[derive(Debug, Serialize)]
struct PredictionInput<'a> {
    prompt: &'a str,
    max_new_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    output: Option<PredictionOutput>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// Models either return one string or a list of generated chunks.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PredictionOutput {
    Text(String),
    Chunks(Vec<String>),
}

impl PredictionOutput {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Chunks(chunks) => chunks.concat(),
        }
    }
}

impl PredictionResponse {
    fn into_text(self) -> Result<String> {
        let status = self.status.as_deref().unwrap_or(SUCCEEDED);
        if status != SUCCEEDED {
            let detail = match self.error {
                Some(serde_json::Value::String(message)) => message,
                Some(other) if !other.is_null() => other.to_string(),
                _ => "no error detail".to_string(),
            };
            anyhow::bail!("Prediction finished with status '{}': {}", status, detail);
        }

        let output = self
            .output
            .context("Prediction succeeded but returned no output")?;

        Ok(output.into_text().trim().to_string())
    }
}

/// Credential-holding client, built once at startup and shared read-only.
pub struct PredictionClient {
    client: Client,
    api_url: String,
    model: String,
    api_token: String,
}

impl PredictionClient {
    pub fn new(config: &InferenceConfig) -> Result<Self> {
        let api_token = config
            .api_token
            .clone()
            .context("REPLICATE_API_TOKEN environment variable not set")?;

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self::with_client(config, client, api_token))
    }

    fn with_client(config: &InferenceConfig, client: Client, api_token: String) -> Self {
        Self {
            client,
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            api_token,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn predictions_url(&self) -> String {
        format!(
            "{}/models/{}/predictions",
            self.api_url.trim_end_matches('/'),
            self.model.trim_matches('/')
        )
    }
}

#[async_trait]
impl TextGenerator for PredictionClient {
    async fn infer(&self, prompt: &str, max_output_tokens: u32) -> Result<String> {
        let url = self.predictions_url();
        let request = PredictionRequest {
            input: PredictionInput {
                prompt,
                max_new_tokens: max_output_tokens,
            },
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), "Sending prediction request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .header("Prefer", "wait")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to inference API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Inference API error {}: {}", status, error_text);
            anyhow::bail!("Inference API returned error {}: {}", status, error_text);
        }

        let prediction: PredictionResponse = response
            .json()
            .await
            .context("Failed to parse inference API response")?;

        let text = prediction.into_text()?;
        info!(model = %self.model, output_chars = text.len(), "Received prediction");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{ExtractionRequest, Extractor, ExtractorConfig};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn config(token: Option<&str>) -> InferenceConfig {
        InferenceConfig {
            api_url: "https://api.example.test/v1/".to_string(),
            model: "meta/meta-llama-3-8b-instruct".to_string(),
            api_token: token.map(str::to_string),
        }
    }

    #[test]
    fn test_client_requires_token() {
        assert!(PredictionClient::new(&config(None)).is_err());
        assert!(PredictionClient::new(&config(Some("r8_test"))).is_ok());
    }

    #[test]
    fn test_predictions_url() {
        let client = PredictionClient::new(&config(Some("r8_test"))).unwrap();
        assert_eq!(
            client.predictions_url(),
            "https://api.example.test/v1/models/meta/meta-llama-3-8b-instruct/predictions"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(PredictionRequest {
            input: PredictionInput {
                prompt: "hello",
                max_new_tokens: 200,
            },
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"input": {"prompt": "hello", "max_new_tokens": 200}})
        );
    }

    #[test]
    fn test_chunked_output_is_concatenated() {
        let response: PredictionResponse = serde_json::from_str(
            r#"{"status": "succeeded", "output": ["{\"job_title\"", ": \"Nurse\"}", "\n"]}"#,
        )
        .unwrap();
        assert_eq!(response.into_text().unwrap(), r#"{"job_title": "Nurse"}"#);
    }

    #[test]
    fn test_string_output() {
        let response: PredictionResponse =
            serde_json::from_str(r#"{"status": "succeeded", "output": "  plain text "}"#).unwrap();
        assert_eq!(response.into_text().unwrap(), "plain text");
    }

    #[test]
    fn test_failed_prediction_is_an_error() {
        let response: PredictionResponse =
            serde_json::from_str(r#"{"status": "failed", "output": null, "error": "CUDA OOM"}"#)
                .unwrap();
        let err = response.into_text().unwrap_err();
        assert!(err.to_string().contains("CUDA OOM"));

        let response: PredictionResponse =
            serde_json::from_str(r#"{"status": "succeeded", "output": null}"#).unwrap();
        assert!(response.into_text().is_err());
    }

    /// Answers one connection per canned `(status line, body)` pair, in order.
    /// The handle yields the raw requests it received.
    async fn serve(
        responses: Vec<(&'static str, &'static str)>,
    ) -> (String, tokio::task::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/v1", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                requests.push(read_request(&mut socket).await);
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
            requests
        });

        (base_url, handle)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn local_client(base_url: &str) -> PredictionClient {
        let config = InferenceConfig {
            api_url: base_url.to_string(),
            model: "meta/meta-llama-3-8b-instruct".to_string(),
            api_token: Some("r8_test".to_string()),
        };
        let http = Client::builder().no_proxy().build().unwrap();
        PredictionClient::with_client(&config, http, "r8_test".to_string())
    }

    #[tokio::test]
    async fn test_infer_posts_prediction_and_joins_output() {
        let (base_url, server) = serve(vec![(
            "200 OK",
            r#"{"status": "succeeded", "output": ["{\"job_title\"", ": \"Nurse\"}"]}"#,
        )])
        .await;

        let text = local_client(&base_url).infer("hello", 200).await.unwrap();
        assert_eq!(text, r#"{"job_title": "Nurse"}"#);

        let requests = server.await.unwrap();
        let request = requests[0].to_ascii_lowercase();
        assert!(request.starts_with("post /v1/models/meta/meta-llama-3-8b-instruct/predictions "));
        assert!(request.contains("authorization: bearer r8_test"));
        assert!(request.contains("prefer: wait"));
        assert!(request.ends_with(r#"{"input":{"prompt":"hello","max_new_tokens":200}}"#));
    }

    #[tokio::test]
    async fn test_error_status_is_an_error() {
        let (base_url, server) = serve(vec![(
            "503 Service Unavailable",
            r#"{"detail": "model is overloaded"}"#,
        )])
        .await;

        let err = local_client(&base_url).infer("hello", 200).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("503"));
        assert!(message.contains("model is overloaded"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unsucceeded_prediction_is_retried() {
        let (base_url, server) = serve(vec![
            ("200 OK", r#"{"status": "failed", "output": null, "error": "CUDA OOM"}"#),
            ("200 OK", r#"{"status": "succeeded", "output": "{\"job_title\": \"Nurse\"}"}"#),
        ])
        .await;

        let extractor = Extractor::new(
            Arc::new(local_client(&base_url)),
            ExtractorConfig {
                backoff_base: Duration::ZERO,
                ..ExtractorConfig::default()
            },
        );
        let result = extractor
            .extract(&ExtractionRequest::new("Registered Nurse", "Night shifts"))
            .await
            .unwrap();

        assert!(!result.is_degraded());
        assert_eq!(result.job_title, "Nurse");
        assert_eq!(server.await.unwrap().len(), 2);
    }
}
