use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::editing::proposal::tailor_document;
use crate::editing::schema::EditProposal;
use crate::editing::session::{apply_pending, handle_chat_turn, reject_pending};
use crate::errors::AppError;
use crate::models::resume::Resume;
use crate::state::AppState;
use crate::storage::{self, keys};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct TailorRequest {
    pub job_description: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub company: String,
}

/// POST /api/v1/resumes/:doc_id/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<EditProposal>, AppError> {
    let response = handle_chat_turn(
        &state.s3,
        &state.config.s3_bucket,
        &state.llm,
        state.classifier.as_ref(),
        &doc_id,
        &req.message,
    )
    .await?;
    Ok(Json(response))
}

/// POST /api/v1/resumes/:doc_id/chat/apply
pub async fn handle_apply(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Result<Json<Resume>, AppError> {
    let committed = apply_pending(&state.s3, &state.config.s3_bucket, &doc_id).await?;
    Ok(Json(committed))
}

/// POST /api/v1/resumes/:doc_id/chat/reject
pub async fn handle_reject(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    reject_pending(&state.s3, &state.config.s3_bucket, &doc_id).await?;
    Ok(Json(serde_json::json!({ "rejected": true })))
}

/// POST /api/v1/resumes/:doc_id/tailor
pub async fn handle_tailor(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
    Json(req): Json<TailorRequest>,
) -> Result<Json<Resume>, AppError> {
    let job_description = req.job_description.trim();
    if job_description.is_empty() {
        return Err(AppError::Validation("job_description is required".to_string()));
    }

    let bucket = &state.config.s3_bucket;
    let current = storage::load_latest_resume(&state.s3, bucket, &doc_id).await?;
    let tailored = tailor_document(
        &state.llm,
        &current,
        job_description,
        &req.job_title,
        &req.company,
    )
    .await?;

    // The tailored snapshot becomes the new working draft as well.
    storage::store_resume(&state.s3, bucket, &keys::tailored(&doc_id), &tailored).await?;
    storage::store_resume(&state.s3, bucket, &keys::draft(&doc_id), &tailored).await?;

    Ok(Json(tailored))
}
