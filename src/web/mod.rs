// src/web/mod.rs - HTTP surface: one POST endpoint on any path, CORS preflight, 405 for the rest

pub mod cors_utils;
pub mod handlers;
pub mod types;

pub use cors_utils::Cors;
pub use types::*;

use crate::core::{ConfigManager, PredictionClient, ServerConfig};
use crate::extraction::{ExtractionResult, Extractor};
use anyhow::{Context, Result};
use rocket::data::Data;
use rocket::http::{Method, Status};
use rocket::serde::json::Json;
use rocket::{catchers, post, routes, Build, Request, Rocket, State};
use std::sync::Arc;
use tracing::info;

const METHOD_NOT_ALLOWED: &str = "Method not allowed";

#[post("/<_..>", data = "<body>")]
pub async fn extract(
    meta: RequestMeta,
    body: Data<'_>,
    extractor: &State<Extractor>,
    server_config: &State<ServerConfig>,
) -> Result<Json<ExtractionResult>, ApiError> {
    handlers::extract_handler(meta, body, extractor, server_config).await
}

// Error catchers
#[rocket::catch(500)]
pub fn internal_error() -> (Status, Json<InternalErrorResponse>) {
    (
        Status::InternalServerError,
        Json(InternalErrorResponse::new(
            "Internal server error",
            "The request could not be completed",
        )),
    )
}

/// Any path matches POST and OPTIONS, so a 404 here means the method itself is unsupported.
#[rocket::catch(default)]
pub fn default_catcher(status: Status, request: &Request<'_>) -> (Status, Json<ErrorResponse>) {
    if status == Status::NotFound && !matches!(request.method(), Method::Post | Method::Options) {
        return (Status::MethodNotAllowed, Json(ErrorResponse::new(METHOD_NOT_ALLOWED)));
    }

    (
        status,
        Json(ErrorResponse::new(status.reason().unwrap_or("Request failed"))),
    )
}

/// Assemble the server around an already-built extractor.
pub fn build_rocket(extractor: Extractor, server_config: ServerConfig) -> Rocket<Build> {
    rocket::build()
        .attach(Cors)
        .manage(extractor)
        .manage(server_config)
        .register("/", catchers![internal_error, default_catcher])
        .mount("/", routes![extract, cors_utils::universal_options_handler])
}

// Main server start function
pub async fn start_web_server(config: ConfigManager) -> Result<()> {
    let client = PredictionClient::new(&config.inference)
        .context("Failed to initialize inference client")?;

    info!("Starting job extraction API server");
    info!("Environment: {}", config.environment);
    info!("Model: {}", client.model());
    info!(
        "Profile: {}, on exhaustion: {}, max attempts: {}",
        config.extraction.profile, config.extraction.on_exhaustion, config.extraction.max_attempts
    );

    let extractor = Extractor::new(Arc::new(client), config.extraction.clone());

    let _rocket = build_rocket(extractor, config.server.clone())
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Server failed: {}", e))?;

    Ok(())
}
