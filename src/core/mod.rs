// src/core/mod.rs
//! Configuration and the external inference service

pub mod config_manager;
pub mod inference_client;

pub use config_manager::{ConfigManager, InferenceConfig, ServerConfig};
pub use inference_client::{PredictionClient, TextGenerator};
