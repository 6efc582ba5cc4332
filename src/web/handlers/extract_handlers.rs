// src/web/handlers/extract_handlers.rs
//! POST handler: read body, normalize, run the extraction loop

use crate::core::ServerConfig;
use crate::extraction::{ExtractionResult, Extractor};
use crate::normalizer::{normalize, NormalizeError, RawRequest};
use crate::web::types::{ApiError, InternalErrorResponse, RequestMeta};

use rocket::data::{Data, ToByteUnit};
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info, info_span, Instrument};

pub async fn extract_handler(
    meta: RequestMeta,
    data: Data<'_>,
    extractor: &State<Extractor>,
    server_config: &State<ServerConfig>,
) -> Result<Json<ExtractionResult>, ApiError> {
    let span = info_span!("extract_request", request_id = %meta.request_id);

    async move {
        let body = read_body(data, server_config.max_body_bytes).await?;

        let request = normalize(RawRequest {
            content_type: meta.content_type.as_deref(),
            body: &body,
            base64_encoded: meta.base64_encoded,
            query: &meta.query,
        })
        .await?;

        info!(
            title = %request.title,
            profile = %extractor.config().profile,
            "Extracting job details"
        );

        let result = extractor.extract(&request).await?;

        if result.is_degraded() {
            info!(title = %result.job_title, "Responding with degraded result");
        } else {
            info!(title = %result.job_title, "Extraction completed");
        }

        Ok::<_, ApiError>(Json(result))
    }
    .instrument(span)
    .await
}

async fn read_body(data: Data<'_>, limit: u64) -> Result<Vec<u8>, ApiError> {
    let capped = data.open(limit.bytes()).into_bytes().await.map_err(|e| {
        error!("Failed to read request body: {}", e);
        ApiError::Internal(InternalErrorResponse::new(
            "Failed to read request body",
            e.to_string(),
        ))
    })?;

    if !capped.is_complete() {
        return Err(NormalizeError::BodyTooLarge { limit }.into());
    }

    Ok(capped.into_inner())
}
