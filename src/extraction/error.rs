// src/extraction/error.rs
//! Failure modes of a single attempt and of the extraction loop as a whole

use std::time::Duration;
use thiserror::Error;

/// Why a model response was rejected.
#[derive(Debug, Error)]
pub enum SchemaViolation {
    #[error("output is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("output is not a JSON object")]
    NotAnObject,

    #[error("job_title is missing or empty")]
    MissingJobTitle,

    #[error("{field} has invalid value {value}")]
    InvalidField { field: &'static str, value: String },
}

/// Outcome of one failed attempt. Both variants are retried.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("model call failed: {0:#}")]
    CallFailed(anyhow::Error),

    #[error("malformed model output: {reason}")]
    Malformed {
        raw: String,
        #[source]
        reason: SchemaViolation,
    },
}

impl AttemptError {
    /// Raw model text, when the call itself succeeded.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::CallFailed(_) => None,
            Self::Malformed { raw, .. } => Some(raw),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("extraction failed after {attempts} attempts: {last_error}")]
    Exhausted {
        attempts: u32,
        last_error: AttemptError,
    },

    #[error("extraction did not finish within {0:?}")]
    DeadlineExceeded(Duration),
}

impl ExtractError {
    /// Message for the `details` field of an internal error response.
    pub fn details(&self) -> String {
        match self {
            Self::Exhausted { last_error, .. } => match last_error.raw_response() {
                Some(raw) => format!("{}. Last response: {}", self, raw),
                None => self.to_string(),
            },
            Self::DeadlineExceeded(_) => self.to_string(),
        }
    }
}
