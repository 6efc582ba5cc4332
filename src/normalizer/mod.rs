// src/normalizer/mod.rs
//! Turns a raw request body into an [`ExtractionRequest`].
//!
//! Accepted encodings: JSON, URL-encoded form, multipart form, and query
//! string parameters as a last resort. A body without a usable content type
//! is tried as JSON.

pub mod multipart;

use crate::extraction::ExtractionRequest;
use crate::utils::{essence_of, is_blank};
use base64::Engine;
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub const TITLE_FIELD: &str = "job_title";
pub const DESCRIPTION_FIELD: &str = "job_description";

/// Request as seen by the HTTP layer, before any decoding.
#[derive(Debug, Clone, Copy)]
pub struct RawRequest<'a> {
    pub content_type: Option<&'a str>,
    pub body: &'a [u8],
    /// Body was sent base64-encoded by a binary-safe transport.
    pub base64_encoded: bool,
    pub query: &'a [(String, String)],
}

/// Field values found so far, echoed back when validation fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReceivedFields {
    pub job_title: Option<String>,
    pub job_description: Option<String>,
}

impl ReceivedFields {
    /// Fill blank slots from `pairs`. Keys other than the two fields are ignored.
    fn absorb(&mut self, pairs: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in pairs {
            let slot = match key.as_str() {
                TITLE_FIELD => &mut self.job_title,
                DESCRIPTION_FIELD => &mut self.job_description,
                _ => continue,
            };
            if slot.as_deref().map_or(true, is_blank) {
                *slot = Some(value);
            }
        }
    }

    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.job_title.as_deref().map_or(true, is_blank) {
            missing.push(TITLE_FIELD);
        }
        if self.job_description.as_deref().map_or(true, is_blank) {
            missing.push(DESCRIPTION_FIELD);
        }
        missing
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestDiagnostics {
    pub content_type: Option<String>,
    pub body_format: &'static str,
    pub body_bytes: usize,
    pub base64_encoded: bool,
    pub used_query_fallback: bool,
}

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Missing required fields: {}", .missing.join(", "))]
    MissingFields {
        missing: Vec<&'static str>,
        received: ReceivedFields,
        debug: RequestDiagnostics,
    },

    #[error("Invalid request format: {reason}")]
    BadFormat {
        reason: String,
        debug: RequestDiagnostics,
    },

    #[error("Request body exceeds {limit} bytes")]
    BodyTooLarge { limit: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFormat {
    Json,
    UrlEncoded,
    Multipart,
    Unspecified,
}

impl BodyFormat {
    fn detect(content_type: Option<&str>) -> Self {
        match content_type.map(essence_of).as_deref() {
            Some("application/json") => Self::Json,
            Some("application/x-www-form-urlencoded") => Self::UrlEncoded,
            Some("multipart/form-data") => Self::Multipart,
            _ => Self::Unspecified,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::UrlEncoded => "urlencoded",
            Self::Multipart => "multipart",
            Self::Unspecified => "unspecified",
        }
    }
}

pub async fn normalize(raw: RawRequest<'_>) -> Result<ExtractionRequest, NormalizeError> {
    let format = BodyFormat::detect(raw.content_type);
    let mut diagnostics = RequestDiagnostics {
        content_type: raw.content_type.map(str::to_string),
        body_format: format.name(),
        body_bytes: raw.body.len(),
        base64_encoded: raw.base64_encoded,
        used_query_fallback: false,
    };
    debug!(?diagnostics, "Normalizing request body");

    let bad_format = |reason: String, diagnostics: &RequestDiagnostics| -> NormalizeError {
        warn!(%reason, "Rejecting request body");
        NormalizeError::BadFormat {
            reason,
            debug: diagnostics.clone(),
        }
    };

    let decoded;
    let body: &[u8] = if raw.base64_encoded {
        decoded = decode_base64(raw.body)
            .map_err(|e| bad_format(format!("body is not valid base64: {}", e), &diagnostics))?;
        &decoded
    } else {
        raw.body
    };

    let mut received = ReceivedFields::default();
    if !body.iter().all(u8::is_ascii_whitespace) {
        match format {
            BodyFormat::Json | BodyFormat::Unspecified => {
                let fields = json_fields(body).map_err(|reason| bad_format(reason, &diagnostics))?;
                received.absorb(fields);
            }
            BodyFormat::UrlEncoded => {
                received.absorb(url::form_urlencoded::parse(body).into_owned());
            }
            BodyFormat::Multipart => {
                let boundary = raw
                    .content_type
                    .and_then(multipart::boundary_of)
                    .ok_or_else(|| {
                        bad_format(
                            "multipart content type has no boundary".to_string(),
                            &diagnostics,
                        )
                    })?;
                let fields = multipart::decode_text_fields(Bytes::copy_from_slice(body), &boundary)
                    .await
                    .map_err(|e| {
                        bad_format(format!("malformed multipart body: {}", e), &diagnostics)
                    })?;
                received.absorb(fields);
            }
        }
    }

    if !received.missing().is_empty() && !raw.query.is_empty() {
        let before = received.clone();
        received.absorb(raw.query.iter().cloned());
        diagnostics.used_query_fallback = received != before;
    }

    match received {
        ReceivedFields {
            job_title: Some(title),
            job_description: Some(description),
        } if !is_blank(&title) && !is_blank(&description) => {
            debug!(
                title_chars = title.len(),
                description_chars = description.len(),
                used_query_fallback = diagnostics.used_query_fallback,
                "Request normalized"
            );
            Ok(ExtractionRequest::new(title, description))
        }
        received => {
            let missing = received.missing();
            warn!(?missing, ?diagnostics, "Request is missing required fields");
            Err(NormalizeError::MissingFields {
                missing,
                received,
                debug: diagnostics,
            })
        }
    }
}

fn decode_base64(body: &[u8]) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: Vec<u8> = body
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    base64::engine::general_purpose::STANDARD.decode(compact)
}

/// String-valued `job_title` / `job_description` members of a JSON object.
fn json_fields(body: &[u8]) -> Result<Vec<(String, String)>, String> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| format!("body is not valid JSON: {}", e))?;
    let object = value
        .as_object()
        .ok_or_else(|| "JSON body must be an object".to_string())?;

    Ok([TITLE_FIELD, DESCRIPTION_FIELD]
        .into_iter()
        .filter_map(|key| {
            object
                .get(key)
                .and_then(Value::as_str)
                .map(|value| (key.to_string(), value.to_string()))
        })
        .collect())
}
