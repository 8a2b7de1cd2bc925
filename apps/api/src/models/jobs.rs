//! Wire models for the job-search surface.
//!
//! TheirStack's response shape drifts between endpoints (salary fields,
//! company as string vs object), so `JobResult::from_raw` maps defensively
//! instead of deserializing the upstream payload directly.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Query parameters accepted by `GET /api/v1/jobs/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobQuery {
    pub q: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub min_salary_usd: u32,
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_max_age_days() -> u32 {
    14
}

fn default_limit() -> u32 {
    20
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: i64,
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    pub apply_url: Option<String>,
    pub description: String,
    pub date_posted: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobSearchResponse {
    pub query: String,
    pub results: Vec<JobResult>,
}

impl JobResult {
    /// Maps a raw TheirStack job record to our shape, tolerating the
    /// field-name variants the API is known to emit.
    pub fn from_raw(raw: &Value) -> Self {
        JobResult {
            job_id: raw.get("id").and_then(Value::as_i64).unwrap_or(-1),
            job_title: str_field(raw, &["job_title", "title"]),
            company: company_name(raw),
            location: str_field(raw, &["location", "short_location", "long_location"]),
            salary: salary_string(raw),
            apply_url: ["url", "final_url", "source_url"]
                .iter()
                .find_map(|k| raw.get(*k).and_then(Value::as_str))
                .map(str::to_string),
            description: str_field(raw, &["description", "job_description"]),
            date_posted: raw
                .get("date_posted")
                .and_then(Value::as_str)
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()),
        }
    }
}

fn str_field(raw: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| raw.get(*k).and_then(Value::as_str))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_default()
}

/// Company arrives as `company_name: "Acme"`, `company: "Acme"`, or
/// `company: {"name": "Acme"}` depending on the endpoint.
fn company_name(raw: &Value) -> String {
    if let Some(name) = raw.get("company_name").and_then(Value::as_str) {
        if !name.trim().is_empty() {
            return name.trim().to_string();
        }
    }
    match raw.get("company") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Object(obj)) => obj
            .get("name")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Prefers the upstream `salary_string`; otherwise composes one from the
/// min/max annual salary fields.
fn salary_string(raw: &Value) -> String {
    if let Some(s) = raw.get("salary_string").and_then(Value::as_str) {
        if !s.trim().is_empty() {
            return s.trim().to_string();
        }
    }
    let lo = raw.get("min_annual_salary_usd").and_then(Value::as_f64);
    let hi = raw.get("max_annual_salary_usd").and_then(Value::as_f64);
    match (lo, hi) {
        (Some(lo), Some(hi)) => format!("${} - ${} USD", group_thousands(lo), group_thousands(hi)),
        (Some(lo), None) => format!("${}+ USD", group_thousands(lo)),
        (None, Some(hi)) => format!("Up to ${} USD", group_thousands(hi)),
        (None, None) => "Not listed".to_string(),
    }
}

fn group_thousands(n: f64) -> String {
    let digits = (n as i64).to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
