// src/extraction/validator.rs
//! Parse and schema-check the text returned by the model

use super::error::SchemaViolation;
use super::types::{ExperienceLevel, ExtractionProfile, ExtractionResult, WorkArrangement};
use crate::utils::{is_blank, strip_code_fence};
use serde_json::{Map, Value};

/// Turn raw model text into a validated result.
///
/// Absent optional fields are read as null. `company` is only checked and
/// kept under [`ExtractionProfile::Company`].
pub fn parse_model_output(
    text: &str,
    profile: ExtractionProfile,
) -> Result<ExtractionResult, SchemaViolation> {
    let cleaned = strip_code_fence(text);
    let value: Value = serde_json::from_str(cleaned)?;
    let object = value.as_object().ok_or(SchemaViolation::NotAnObject)?;

    let job_title = match object.get("job_title") {
        Some(Value::String(title)) if !is_blank(title) => title.clone(),
        _ => return Err(SchemaViolation::MissingJobTitle),
    };

    let city = optional_string(object, "city")?;

    let work_arrangement = match optional_string(object, "work_arrangement")? {
        Some(value) => Some(
            WorkArrangement::from_literal(&value).ok_or(SchemaViolation::InvalidField {
                field: "work_arrangement",
                value: Value::String(value).to_string(),
            })?,
        ),
        None => None,
    };

    let experience = match optional_string(object, "experience")? {
        Some(value) => Some(ExperienceLevel::from_label(&value).ok_or(
            SchemaViolation::InvalidField {
                field: "experience",
                value: Value::String(value).to_string(),
            },
        )?),
        None => None,
    };

    let company = if profile.includes_company() {
        optional_string(object, "company")?
    } else {
        None
    };

    Ok(ExtractionResult {
        job_title,
        city,
        work_arrangement,
        experience,
        company,
        error: None,
        profile,
    })
}

fn optional_string(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, SchemaViolation> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(SchemaViolation::InvalidField {
            field,
            value: other.to_string(),
        }),
    }
}
