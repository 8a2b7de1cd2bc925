//! Job search collaborator — TheirStack behind a pluggable trait.
//!
//! Used only to enrich suggestions; nothing in the editing core depends on
//! it. `AppState` holds an `Arc<dyn JobSearchClient>` so tests and
//! deployments without an API key can swap the backend.

pub mod handlers;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::errors::AppError;
use crate::models::jobs::{JobQuery, JobResult};

const THEIRSTACK_BASE: &str = "https://api.theirstack.com/v1";

#[async_trait]
pub trait JobSearchClient: Send + Sync {
    async fn search(&self, query: &JobQuery) -> Result<Vec<JobResult>, AppError>;
}

pub struct TheirStackClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TheirStackClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, THEIRSTACK_BASE.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            base_url,
        }
    }

    fn build_body(query: &JobQuery) -> Value {
        let mut body = json!({
            "offset": query.offset,
            "limit": query.limit,
            "posted_at_max_age_days": query.max_age_days,
            "job_title_or": [query.q.as_str()],
        });
        if !query.location.is_empty() {
            body["job_location_or"] = json!([query.location.as_str()]);
        }
        if query.min_salary_usd > 0 {
            body["min_annual_salary_usd_gte"] = json!(query.min_salary_usd as f64);
        }
        body
    }
}

#[async_trait]
impl JobSearchClient for TheirStackClient {
    async fn search(&self, query: &JobQuery) -> Result<Vec<JobResult>, AppError> {
        let body = Self::build_body(query);
        debug!("Job search: {}", query.q);

        let response = self
            .client
            .post(format!("{}/jobs/search", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Job search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Internal(anyhow::anyhow!(
                "Job search returned {status}: {text}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Job search response invalid: {e}")))?;

        // The record list key drifts between endpoints; stay defensive.
        let records = payload
            .get("data")
            .or_else(|| payload.get("jobs"))
            .or_else(|| payload.get("results"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(records.iter().map(JobResult::from_raw).collect())
    }
}

/// Stand-in used when no API key is configured: every search fails with a
/// clear message instead of an opaque upstream 401.
pub struct DisabledJobSearch;

#[async_trait]
impl JobSearchClient for DisabledJobSearch {
    async fn search(&self, _query: &JobQuery) -> Result<Vec<JobResult>, AppError> {
        Err(AppError::Validation(
            "Job search is not configured (THEIRSTACK_API_KEY is unset)".to_string(),
        ))
    }
}
