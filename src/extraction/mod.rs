// src/extraction/mod.rs
//! Prompt, call, validate, retry: turns a title and description into structured fields

pub mod error;
pub mod extractor;
pub mod prompt;
pub mod types;
pub mod validator;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{AttemptError, ExtractError, SchemaViolation};
pub use extractor::{backoff_delay, Extractor, ExtractorConfig};
pub use types::{
    ExhaustionPolicy, ExperienceLevel, ExtractionProfile, ExtractionRequest, ExtractionResult,
    WorkArrangement,
};
