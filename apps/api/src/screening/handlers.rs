use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::screening::{screen_resume, ScreeningReport};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScreeningRequest {
    pub resume_text: String,
    pub job_description: String,
}

/// POST /api/v1/screenings
pub async fn handle_screening(
    State(state): State<AppState>,
    Json(req): Json<ScreeningRequest>,
) -> Result<Json<ScreeningReport>, AppError> {
    if req.resume_text.trim().is_empty() {
        return Err(AppError::Validation("resume_text must not be empty".to_string()));
    }
    if req.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description must not be empty".to_string(),
        ));
    }

    let report = screen_resume(
        state.generator.as_ref(),
        state.config.llm_timeout,
        &req.resume_text,
        &req.job_description,
    )
    .await;
    Ok(Json(report))
}
