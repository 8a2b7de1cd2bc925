use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::editing::proposal::structure_document;
use crate::errors::AppError;
use crate::intake::{bootstrap_resume, extract_text};
use crate::models::resume::Resume;
use crate::state::AppState;
use crate::storage::{self, keys};

const PREVIEW_CHARS: usize = 1200;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub doc_id: String,
    pub filename: String,
    pub text_preview: String,
    pub text_chars: usize,
}

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub doc_id: String,
    pub resume: Resume,
}

#[derive(Debug, Deserialize)]
pub struct StructureRequest {
    #[serde(default)]
    pub extra_experience: String,
}

/// POST /api/v1/resumes — multipart upload, extract text, store both.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("resume").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
            upload = Some((filename, content_type, data.to_vec()));
        }
    }

    let (filename, content_type, data) =
        upload.ok_or_else(|| AppError::Validation("Missing 'file' field".to_string()))?;

    let text = extract_text(&filename, &data)?;
    let doc_id = Uuid::new_v4().to_string();
    let bucket = &state.config.s3_bucket;

    storage::put_object(
        &state.s3,
        bucket,
        &keys::upload(&doc_id, &filename),
        data,
        &content_type,
    )
    .await?;
    storage::put_object(
        &state.s3,
        bucket,
        &keys::extracted_text(&doc_id),
        text.clone().into_bytes(),
        "text/plain",
    )
    .await?;

    info!("Uploaded document {doc_id} ({filename}, {} chars)", text.len());

    Ok(Json(UploadResponse {
        doc_id,
        filename,
        text_preview: text.chars().take(PREVIEW_CHARS).collect(),
        text_chars: text.chars().count(),
    }))
}

/// POST /api/v1/resumes/:doc_id/parse — heuristic bootstrap structure.
pub async fn handle_parse(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Result<Json<ParseResponse>, AppError> {
    let bucket = &state.config.s3_bucket;
    let bytes = storage::get_object(&state.s3, bucket, &keys::extracted_text(&doc_id)).await?;
    let raw_text = String::from_utf8_lossy(&bytes).into_owned();

    let resume = bootstrap_resume(&raw_text);
    storage::store_resume(&state.s3, bucket, &keys::parsed(&doc_id), &resume).await?;

    Ok(Json(ParseResponse { doc_id, resume }))
}

/// POST /api/v1/resumes/:doc_id/structure — LLM structuring of the extracted
/// text, optionally enriched with extra experience supplied by the user.
pub async fn handle_structure(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
    Json(req): Json<StructureRequest>,
) -> Result<Json<Resume>, AppError> {
    let bucket = &state.config.s3_bucket;
    let bytes = storage::get_object(&state.s3, bucket, &keys::extracted_text(&doc_id)).await?;
    let raw_text = String::from_utf8_lossy(&bytes).into_owned();

    let resume = structure_document(&state.llm, &raw_text, &req.extra_experience).await?;
    storage::store_resume(&state.s3, bucket, &keys::structured(&doc_id), &resume).await?;

    Ok(Json(resume))
}
