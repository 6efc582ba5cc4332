// src/extraction/extractor.rs
//! Bounded retry loop around the model call

use super::error::{AttemptError, ExtractError};
use super::prompt::render_prompt;
use super::types::{ExhaustionPolicy, ExtractionProfile, ExtractionRequest, ExtractionResult};
use super::validator::parse_model_output;
use crate::core::TextGenerator;
use crate::utils::preview;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF_MS: u64 = 1000;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 200;

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub max_attempts: u32,
    /// Wait before retry `n` (1-indexed) is `backoff_base * n`.
    pub backoff_base: Duration,
    pub max_output_tokens: u32,
    pub profile: ExtractionProfile,
    pub on_exhaustion: ExhaustionPolicy,
    /// Upper bound for the whole loop, waits included.
    pub deadline: Option<Duration>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: Duration::from_millis(DEFAULT_BACKOFF_MS),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            profile: ExtractionProfile::default(),
            on_exhaustion: ExhaustionPolicy::default(),
            deadline: None,
        }
    }
}

/// Linear backoff: 1x the base after the first failure, 2x after the second, ...
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(attempt)
}

pub struct Extractor {
    generator: Arc<dyn TextGenerator>,
    config: ExtractorConfig,
}

impl Extractor {
    pub fn new(generator: Arc<dyn TextGenerator>, config: ExtractorConfig) -> Self {
        Self { generator, config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Same extractor, different profile. The generator is shared.
    pub fn with_profile(&self, profile: ExtractionProfile) -> Self {
        Self {
            generator: Arc::clone(&self.generator),
            config: ExtractorConfig {
                profile,
                ..self.config.clone()
            },
        }
    }

    pub async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractionResult, ExtractError> {
        let outcome = match self.config.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.run_attempts(request))
                .await
                .map_err(|_| {
                    error!(?deadline, "Extraction aborted by deadline");
                    ExtractError::DeadlineExceeded(deadline)
                })?,
            None => self.run_attempts(request).await,
        };

        match (outcome, self.config.on_exhaustion) {
            (Err(err @ ExtractError::Exhausted { .. }), ExhaustionPolicy::Degrade) => {
                warn!(error = %err, "Returning degraded result");
                Ok(ExtractionResult::degraded(
                    request.title.clone(),
                    self.config.profile,
                    err.to_string(),
                ))
            }
            (outcome, _) => outcome,
        }
    }

    async fn run_attempts(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractionResult, ExtractError> {
        let prompt = render_prompt(self.config.profile, request);
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            let started = Instant::now();
            match self.attempt(&prompt).await {
                Ok(result) => {
                    info!(
                        attempt,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Extraction succeeded"
                    );
                    return Ok(result);
                }
                Err(err) => {
                    warn!(
                        attempt,
                        max_attempts,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        error = %err,
                        "Extraction attempt failed"
                    );
                    if let Some(raw) = err.raw_response() {
                        debug!(attempt, raw = %preview(raw, 300), "Rejected model output");
                    }
                    last_error = Some(err);
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(backoff_delay(self.config.backoff_base, attempt)).await;
            }
        }

        let last_error = last_error.unwrap_or_else(|| {
            AttemptError::CallFailed(anyhow::anyhow!("no attempt was made"))
        });
        error!(attempts = max_attempts, error = %last_error, "Extraction attempts exhausted");

        Err(ExtractError::Exhausted {
            attempts: max_attempts,
            last_error,
        })
    }

    async fn attempt(&self, prompt: &str) -> Result<ExtractionResult, AttemptError> {
        let text = self
            .generator
            .infer(prompt, self.config.max_output_tokens)
            .await
            .map_err(AttemptError::CallFailed)?;

        let text = text.trim();
        parse_model_output(text, self.config.profile).map_err(|reason| AttemptError::Malformed {
            raw: text.to_string(),
            reason,
        })
    }
}
