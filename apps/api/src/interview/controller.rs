//! Turn Controller — one invocation reads a session, runs exactly one stage and writes
//! the advanced record back with compare-and-swap.
//!
//! Invariants:
//!   - `done` is terminal; a done session is rejected before any generation call.
//!   - Candidate utterances are only recorded while interviewing.
//!   - Every successful write bumps `revision` by one.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::interview::session::{Control, Phase, SessionRecord, Turn};
use crate::interview::stages::Pipeline;
use crate::interview::store::{CasOutcome, SessionStore, StoreError};

#[derive(Debug, Error)]
pub enum TurnError {
    #[error("Session {0} not found")]
    SessionNotFound(Uuid),

    #[error("Session {0} is already complete")]
    SessionCompleted(Uuid),

    #[error("Session {0} was modified by a concurrent turn")]
    RevisionConflict(Uuid),

    #[error("No stage registered for {0}")]
    NoStage(Control),

    #[error("The {stage} stage cannot run a session in {found}")]
    StageMismatch { stage: Control, found: Control },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub record: SessionRecord,
    pub status: SessionStatus,
}

pub struct TurnController {
    pipeline: Pipeline,
    store: Arc<dyn SessionStore>,
    greeting: String,
}

impl TurnController {
    pub fn new(pipeline: Pipeline, store: Arc<dyn SessionStore>, greeting: String) -> Self {
        Self {
            pipeline,
            store,
            greeting,
        }
    }

    /// Creates a session in `interviewing` at turn 0. Without a prior transcript the
    /// configured greeting becomes the first interviewer turn.
    pub async fn start(
        &self,
        resume_text: Option<String>,
        prior_transcript: Vec<Turn>,
    ) -> Result<SessionRecord, TurnError> {
        let transcript = if prior_transcript.is_empty() {
            vec![Turn::interviewer(self.greeting.clone())]
        } else {
            prior_transcript
        };
        let record = SessionRecord::new(resume_text, transcript);
        self.store.put(&record).await?;
        info!(
            "Session {} started (resume={}, transcript={} turns)",
            record.session_id,
            record.resume_text.is_some(),
            record.transcript.len()
        );
        Ok(record)
    }

    pub async fn get(&self, session_id: Uuid) -> Result<SessionRecord, TurnError> {
        self.store
            .get(session_id)
            .await?
            .ok_or(TurnError::SessionNotFound(session_id))
    }

    /// Loads, advances by one stage, and stores. A concurrent writer that got there
    /// first turns this call into `RevisionConflict`; nothing is overwritten.
    pub async fn take_turn(
        &self,
        session_id: Uuid,
        utterance: Option<String>,
    ) -> Result<TurnOutcome, TurnError> {
        let record = self.get(session_id).await?;
        let expected_revision = record.revision;

        let next = self.advance(record, utterance).await?;

        match self.store.compare_and_swap(expected_revision, &next).await? {
            CasOutcome::Swapped => {}
            CasOutcome::Conflict => {
                warn!("Session {session_id}: revision {expected_revision} is stale, turn dropped");
                return Err(TurnError::RevisionConflict(session_id));
            }
            CasOutcome::Missing => return Err(TurnError::SessionNotFound(session_id)),
        }

        let status = if next.is_done() {
            SessionStatus::Completed
        } else {
            SessionStatus::Active
        };
        Ok(TurnOutcome {
            record: next,
            status,
        })
    }

    /// The pure part of a turn: no store access.
    pub async fn advance(
        &self,
        mut record: SessionRecord,
        utterance: Option<String>,
    ) -> Result<SessionRecord, TurnError> {
        if record.is_done() {
            return Err(TurnError::SessionCompleted(record.session_id));
        }

        let utterance = utterance
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        if let Some(text) = utterance {
            if record.phase == Phase::Interviewing {
                record.transcript.push(Turn::candidate(text));
            } else {
                debug!(
                    "Session {}: ignoring utterance while {}",
                    record.session_id,
                    record.control()
                );
            }
        }

        let revision = record.revision;
        let mut next = self.pipeline.run_stage(record).await?;
        next.revision = revision + 1;
        next.updated_at = Utc::now();
        Ok(next)
    }
}
