use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::controller::SessionStatus;
use crate::interview::normalize::{Evaluation, Summary};
use crate::interview::session::{Control, InterviewPayload, Phase, SessionRecord, Turn};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StartInterviewRequest {
    #[serde(default)]
    pub resume_text: Option<String>,
    #[serde(default)]
    pub transcript: Vec<Turn>,
}

#[derive(Debug, Serialize)]
pub struct StartInterviewResponse {
    pub session_id: Uuid,
    pub message: Option<String>,
    pub control: Control,
}

#[derive(Debug, Default, Deserialize)]
pub struct TurnRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub session_id: Uuid,
    /// Latest interviewer line; what the caller shows or speaks next.
    pub message: Option<String>,
    pub control: Control,
    pub status: SessionStatus,
    pub turn_count: u32,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReportResponse {
    InProgress {
        control: Control,
    },
    Completed {
        interview_data: InterviewPayload,
        evaluation: Evaluation,
        summary: Summary,
    },
}

impl From<SessionRecord> for ReportResponse {
    fn from(record: SessionRecord) -> Self {
        match record.phase {
            Phase::Done {
                interview_data,
                evaluation,
                summary,
            } => ReportResponse::Completed {
                interview_data,
                evaluation,
                summary,
            },
            phase => ReportResponse::InProgress {
                control: phase.control(),
            },
        }
    }
}

/// POST /api/v1/interviews
pub async fn handle_start_interview(
    State(state): State<AppState>,
    Json(req): Json<StartInterviewRequest>,
) -> Result<(StatusCode, Json<StartInterviewResponse>), AppError> {
    let record = state
        .controller
        .start(req.resume_text, req.transcript)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(StartInterviewResponse {
            session_id: record.session_id,
            message: record.last_interviewer_line().map(str::to_string),
            control: record.control(),
        }),
    ))
}

/// POST /api/v1/interviews/:id/turns
pub async fn handle_take_turn(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TurnRequest>,
) -> Result<Json<TurnResponse>, AppError> {
    let outcome = state.controller.take_turn(id, req.text).await?;
    let record = outcome.record;
    Ok(Json(TurnResponse {
        session_id: record.session_id,
        message: record.last_interviewer_line().map(str::to_string),
        control: record.control(),
        status: outcome.status,
        turn_count: record.turn_count,
    }))
}

/// GET /api/v1/interviews/:id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionRecord>, AppError> {
    Ok(Json(state.controller.get(id).await?))
}

/// GET /api/v1/interviews/:id/report
pub async fn handle_get_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReportResponse>, AppError> {
    let record = state.controller.get(id).await?;
    Ok(Json(record.into()))
}
