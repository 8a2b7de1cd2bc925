use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::render::{render_resume, template::load_template};
use crate::state::AppState;
use crate::storage::{self, keys};

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub doc_id: String,
    pub latex: String,
}

/// POST /api/v1/resumes/:doc_id/render
pub async fn handle_render(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Result<Json<RenderResponse>, AppError> {
    let bucket = &state.config.s3_bucket;
    let resume = storage::load_latest_resume(&state.s3, bucket, &doc_id).await?;

    let template = load_template(&state.config.template_path)?;
    let latex = render_resume(&resume, &template)?;

    storage::put_object(
        &state.s3,
        bucket,
        &keys::rendered(&doc_id),
        latex.clone().into_bytes(),
        "application/x-tex",
    )
    .await?;

    Ok(Json(RenderResponse { doc_id, latex }))
}
