pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::editing::handlers as editing_handlers;
use crate::intake::handlers as intake_handlers;
use crate::jobs::handlers as jobs_handlers;
use crate::render::handlers as render_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Intake
        .route("/api/v1/resumes", post(intake_handlers::handle_upload))
        .route(
            "/api/v1/resumes/:doc_id/parse",
            post(intake_handlers::handle_parse),
        )
        .route(
            "/api/v1/resumes/:doc_id/structure",
            post(intake_handlers::handle_structure),
        )
        // Chat editing
        .route(
            "/api/v1/resumes/:doc_id/chat",
            post(editing_handlers::handle_chat),
        )
        .route(
            "/api/v1/resumes/:doc_id/chat/apply",
            post(editing_handlers::handle_apply),
        )
        .route(
            "/api/v1/resumes/:doc_id/chat/reject",
            post(editing_handlers::handle_reject),
        )
        .route(
            "/api/v1/resumes/:doc_id/tailor",
            post(editing_handlers::handle_tailor),
        )
        // Rendering
        .route(
            "/api/v1/resumes/:doc_id/render",
            post(render_handlers::handle_render),
        )
        // Job search
        .route("/api/v1/jobs/search", get(jobs_handlers::handle_job_search))
        .with_state(state)
}
