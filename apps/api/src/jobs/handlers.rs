use axum::{
    extract::{Query, State},
    Json,
};

use crate::errors::AppError;
use crate::models::jobs::{JobQuery, JobSearchResponse};
use crate::state::AppState;

/// GET /api/v1/jobs/search
pub async fn handle_job_search(
    State(state): State<AppState>,
    Query(query): Query<JobQuery>,
) -> Result<Json<JobSearchResponse>, AppError> {
    if query.q.trim().is_empty() {
        return Err(AppError::Validation("q is required".to_string()));
    }

    let results = state.jobs.search(&query).await?;
    Ok(Json(JobSearchResponse {
        query: query.q,
        results,
    }))
}
