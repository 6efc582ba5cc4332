// src/extraction/prompt.rs
//! Instruction templates sent to the model.
//!
//! The wording is part of the extraction behavior: the model follows these rules
//! and nothing else, so edits here change results.

use super::types::{ExtractionProfile, ExtractionRequest};

pub fn render_prompt(profile: ExtractionProfile, request: &ExtractionRequest) -> String {
    match profile {
        ExtractionProfile::Standard => standard_prompt(&request.title, &request.description),
        ExtractionProfile::Company => company_prompt(&request.title, &request.description),
    }
}

fn standard_prompt(title: &str, description: &str) -> String {
    format!(
        r#"You are a job posting parser. Extract structured information from the job title and job description below.

Job Title: {}

Job Description: {}

Return ONLY a valid JSON object with exactly these fields:
{{
  "job_title": string,
  "city": string or null,
  "work_arrangement": "remote" | "hybrid" | "on-site" | null,
  "experience": "Entry (0-2 Years)" | "Mid (3-5 Years)" | "Senior (6-8 Years)" | "Lead (9+ Years)" | null
}}

Rules:
1. job_title: Clean up the title. Remove company names, department names, timelines and duplicated words. Keep only the role, its specialization and the seniority level if the title states one.
2. city: Return the city and the state abbreviation only, for example "Richmond, VA". Drop the country. If several cities are listed, use the first one. Use null if no city is mentioned.
3. work_arrangement: Return exactly one of "remote", "hybrid" or "on-site", always in lowercase. Use null if it is not mentioned.
4. experience: Map explicit years of experience to one of these labels:
   - "1+ years" -> "Entry (0-2 Years)"
   - "2+ years" -> "Mid (3-5 Years)"
   - "5+ years" -> "Senior (6-8 Years)"
   - "8+ years" -> "Lead (9+ Years)"
   Do not infer experience from the job title alone unless the title itself states the seniority. Use null if the requirement is missing or ambiguous.

Respond with the JSON object only. Do not add explanations or any other text."#,
        title, description
    )
}

fn company_prompt(title: &str, description: &str) -> String {
    format!(
        r#"You are a job posting parser. Extract structured information from the job title and job description below.

Job Title: {}

Job Description: {}

Return ONLY a valid JSON object with exactly these fields:
{{
  "job_title": string,
  "city": string or null,
  "work_arrangement": "remote" | "hybrid" | "on-site" | null,
  "experience": "Entry (0-2 Years)" | "Mid (3-5 Years)" | "Senior (6-8 Years)" | "Lead (9+ Years)" | null,
  "company": string or null
}}

Rules:
1. job_title: Keep the role, department, company and seniority level. Only remove locations and job or requisition IDs.
2. city: Return the city and the state abbreviation only, for example "Richmond, VA". Drop the country. If several cities are listed, use the first one. Use null if no city is mentioned.
3. work_arrangement: Return exactly one of "remote", "hybrid" or "on-site", always in lowercase. Use null if it is not mentioned.
4. experience: Map explicit years of experience to one of these labels:
   - "1+ years" -> "Entry (0-2 Years)"
   - "2+ years" -> "Mid (3-5 Years)"
   - "5+ years" -> "Senior (6-8 Years)"
   - "8+ years" -> "Lead (9+ Years)"
   Do not infer experience from the job title alone unless the title itself states the seniority. Use null if the requirement is missing or ambiguous.
5. company: Return the company name exactly as written if it is present. Use null otherwise.
6. If the job description is missing, empty or reads "No Job Description", still return the cleaned job_title and set every other field to null.

Respond with the JSON object only. Do not add explanations or any other text."#,
        title, description
    )
}
