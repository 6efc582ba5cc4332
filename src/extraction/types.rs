// src/extraction/types.rs
//! Value objects passed between the normalizer, the extraction loop and the web layer

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Title and description pulled out of an incoming request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub title: String,
    pub description: String,
}

impl ExtractionRequest {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkArrangement {
    #[serde(rename = "remote")]
    Remote,
    #[serde(rename = "hybrid")]
    Hybrid,
    #[serde(rename = "on-site")]
    OnSite,
}

impl WorkArrangement {
    pub const ALL: [WorkArrangement; 3] = [Self::Remote, Self::Hybrid, Self::OnSite];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Hybrid => "hybrid",
            Self::OnSite => "on-site",
        }
    }

    /// Exact, case-sensitive match against the lowercase literals.
    pub fn from_literal(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|w| w.as_str() == value)
    }
}

/// Seniority bracket keyed to explicit years-of-experience language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperienceLevel {
    #[serde(rename = "Entry (0-2 Years)")]
    Entry,
    #[serde(rename = "Mid (3-5 Years)")]
    Mid,
    #[serde(rename = "Senior (6-8 Years)")]
    Senior,
    #[serde(rename = "Lead (9+ Years)")]
    Lead,
}

impl ExperienceLevel {
    pub const ALL: [ExperienceLevel; 4] = [Self::Entry, Self::Mid, Self::Senior, Self::Lead];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Entry => "Entry (0-2 Years)",
            Self::Mid => "Mid (3-5 Years)",
            Self::Senior => "Senior (6-8 Years)",
            Self::Lead => "Lead (9+ Years)",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.label() == value)
    }
}

/// Which prompt and output schema the extraction loop uses.
///
/// `Standard` reduces the title to role, specialization and seniority.
/// `Company` keeps department and company in the title and adds a `company`
/// field to the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractionProfile {
    #[default]
    Standard,
    Company,
}

impl ExtractionProfile {
    pub fn includes_company(&self) -> bool {
        matches!(self, Self::Company)
    }
}

impl FromStr for ExtractionProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "role" => Ok(Self::Standard),
            "company" | "detailed" => Ok(Self::Company),
            other => Err(format!(
                "unknown extraction profile '{}', expected 'standard' or 'company'",
                other
            )),
        }
    }
}

impl fmt::Display for ExtractionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Company => write!(f, "company"),
        }
    }
}

/// What to do once every attempt has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExhaustionPolicy {
    /// Return the input title with every other field null and an `error` message.
    #[default]
    Degrade,
    /// Surface a terminal error carrying the last model response.
    Fail,
}

impl FromStr for ExhaustionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "degrade" => Ok(Self::Degrade),
            "fail" | "error" => Ok(Self::Fail),
            other => Err(format!(
                "unknown exhaustion policy '{}', expected 'degrade' or 'fail'",
                other
            )),
        }
    }
}

impl fmt::Display for ExhaustionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Degrade => write!(f, "degrade"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub job_title: String,
    pub city: Option<String>,
    pub work_arrangement: Option<WorkArrangement>,
    pub experience: Option<ExperienceLevel>,
    pub company: Option<String>,
    pub error: Option<String>,
    pub profile: ExtractionProfile,
}

impl ExtractionResult {
    /// Best-effort record returned when the model never produced valid output.
    pub fn degraded(job_title: String, profile: ExtractionProfile, error: String) -> Self {
        Self {
            job_title,
            city: None,
            work_arrangement: None,
            experience: None,
            company: None,
            error: Some(error),
            profile,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

// `company` only exists in the company profile and `error` only on degraded
// records, so the field set is decided at serialization time.
impl Serialize for ExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let include_company = self.profile.includes_company();
        let len = 4 + usize::from(include_company) + usize::from(self.error.is_some());

        let mut state = serializer.serialize_struct("ExtractionResult", len)?;
        state.serialize_field("job_title", &self.job_title)?;
        state.serialize_field("city", &self.city)?;
        state.serialize_field("work_arrangement", &self.work_arrangement)?;
        state.serialize_field("experience", &self.experience)?;
        if include_company {
            state.serialize_field("company", &self.company)?;
        } else {
            state.skip_field("company")?;
        }
        match &self.error {
            Some(error) => state.serialize_field("error", error)?,
            None => state.skip_field("error")?,
        }
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(profile: ExtractionProfile) -> ExtractionResult {
        ExtractionResult {
            job_title: "Senior Data Engineer".to_string(),
            city: Some("Richmond, VA".to_string()),
            work_arrangement: Some(WorkArrangement::Remote),
            experience: Some(ExperienceLevel::Senior),
            company: Some("Acme Corp".to_string()),
            error: None,
            profile,
        }
    }

    #[test]
    fn test_standard_profile_omits_company() {
        let value = serde_json::to_value(sample(ExtractionProfile::Standard)).unwrap();
        assert_eq!(
            value,
            json!({
                "job_title": "Senior Data Engineer",
                "city": "Richmond, VA",
                "work_arrangement": "remote",
                "experience": "Senior (6-8 Years)"
            })
        );
    }

    #[test]
    fn test_company_profile_serializes_company() {
        let value = serde_json::to_value(sample(ExtractionProfile::Company)).unwrap();
        assert_eq!(value["company"], json!("Acme Corp"));

        let mut without_company = sample(ExtractionProfile::Company);
        without_company.company = None;
        let value = serde_json::to_value(without_company).unwrap();
        assert!(value.as_object().unwrap().contains_key("company"));
        assert!(value["company"].is_null());
    }

    #[test]
    fn test_degraded_result_shape() {
        let result = ExtractionResult::degraded(
            "Backend Engineer".to_string(),
            ExtractionProfile::Standard,
            "model unavailable".to_string(),
        );
        assert!(result.is_degraded());
        assert_eq!(
            serde_json::to_value(result).unwrap(),
            json!({
                "job_title": "Backend Engineer",
                "city": null,
                "work_arrangement": null,
                "experience": null,
                "error": "model unavailable"
            })
        );
    }

    #[test]
    fn test_work_arrangement_literals_are_case_sensitive() {
        assert_eq!(
            WorkArrangement::from_literal("hybrid"),
            Some(WorkArrangement::Hybrid)
        );
        assert_eq!(
            WorkArrangement::from_literal("on-site"),
            Some(WorkArrangement::OnSite)
        );
        assert_eq!(WorkArrangement::from_literal("Hybrid"), None);
        assert_eq!(WorkArrangement::from_literal("onsite"), None);
    }

    #[test]
    fn test_experience_labels_round_trip_through_lookup() {
        for level in ExperienceLevel::ALL {
            assert_eq!(ExperienceLevel::from_label(level.label()), Some(level));
        }
        assert_eq!(ExperienceLevel::from_label("senior (6-8 years)"), None);
        assert_eq!(ExperienceLevel::from_label("Senior"), None);
    }

    #[test]
    fn test_profile_and_policy_parsing() {
        assert_eq!(
            "Company".parse::<ExtractionProfile>(),
            Ok(ExtractionProfile::Company)
        );
        assert_eq!(
            "standard".parse::<ExtractionProfile>(),
            Ok(ExtractionProfile::Standard)
        );
        assert!("verbose".parse::<ExtractionProfile>().is_err());

        assert_eq!("fail".parse::<ExhaustionPolicy>(), Ok(ExhaustionPolicy::Fail));
        assert_eq!(
            " DEGRADE ".parse::<ExhaustionPolicy>(),
            Ok(ExhaustionPolicy::Degrade)
        );
        assert!("retry".parse::<ExhaustionPolicy>().is_err());
    }
}
