// src/web/types.rs - Response bodies, the API error responder and the request metadata guard

use crate::extraction::ExtractError;
use crate::normalizer::{NormalizeError, ReceivedFields, RequestDiagnostics};
use rocket::http::Status;
use rocket::request::{self, FromRequest};
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::serde::Serialize;
use rocket::Request;
use tracing::error;

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<ReceivedFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<RequestDiagnostics>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            received: None,
            debug: None,
        }
    }
}

impl From<NormalizeError> for ErrorResponse {
    fn from(err: NormalizeError) -> Self {
        let error = err.to_string();
        match err {
            NormalizeError::MissingFields {
                received, debug, ..
            } => Self {
                error,
                received: Some(received),
                debug: Some(debug),
            },
            NormalizeError::BadFormat { debug, .. } => Self {
                error,
                received: None,
                debug: Some(debug),
            },
            NormalizeError::BodyTooLarge { .. } => Self::new(error),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct InternalErrorResponse {
    pub error: String,
    pub details: String,
}

impl InternalErrorResponse {
    pub fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

/// Every non-success outcome of the endpoint.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(ErrorResponse),
    Internal(InternalErrorResponse),
}

impl From<NormalizeError> for ApiError {
    fn from(err: NormalizeError) -> Self {
        Self::BadRequest(err.into())
    }
}

impl From<ExtractError> for ApiError {
    fn from(err: ExtractError) -> Self {
        error!("Extraction failed: {}", err);
        Self::Internal(InternalErrorResponse::new(
            "Failed to extract job details",
            err.details(),
        ))
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        match self {
            Self::BadRequest(body) => (Status::BadRequest, Json(body)).respond_to(request),
            Self::Internal(body) => (Status::InternalServerError, Json(body)).respond_to(request),
        }
    }
}

/// Header and query data the normalizer needs, captured before the body is read.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub request_id: String,
    pub content_type: Option<String>,
    pub base64_encoded: bool,
    pub query: Vec<(String, String)>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RequestMeta {
    type Error = std::convert::Infallible;

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let headers = request.headers();

        let content_type = headers
            .get_one("Content-Type")
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        let base64_encoded = headers
            .get_one("Content-Transfer-Encoding")
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("base64"));

        let query = request
            .uri()
            .query()
            .map(|query| {
                url::form_urlencoded::parse(query.as_str().as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();

        request::Outcome::Success(Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            content_type,
            base64_encoded,
            query,
        })
    }
}
