//! Session record — the one entity the turn controller reads, advances and writes back.
//!
//! `Phase` is tagged by `control`, and each variant carries only the stage data that is
//! valid in that state. `control == done` therefore cannot exist without a summary.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::interview::extract::Payload;
use crate::interview::normalize::{Evaluation, Summary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    #[serde(alias = "assistant")]
    Interviewer,
    #[serde(alias = "user")]
    Candidate,
}

impl Speaker {
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::Interviewer => "INTERVIEWER",
            Speaker::Candidate => "CANDIDATE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    #[serde(alias = "role")]
    pub speaker: Speaker,
    #[serde(alias = "content")]
    pub text: String,
}

impl Turn {
    pub fn interviewer(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Interviewer,
            text: text.into(),
        }
    }

    pub fn candidate(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Candidate,
            text: text.into(),
        }
    }
}

/// The dispatch field. Derived from `Phase`, never set by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    Interviewing,
    Evaluating,
    Summarizing,
    Done,
}

impl Control {
    pub fn as_str(&self) -> &'static str {
        match self {
            Control::Interviewing => "interviewing",
            Control::Evaluating => "evaluating",
            Control::Summarizing => "summarizing",
            Control::Done => "done",
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured payload the interviewer emitted when it closed the interview, or a
/// marked placeholder when it never did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterviewPayload(pub Payload);

impl InterviewPayload {
    pub fn placeholder(reason: &str) -> Self {
        let mut map = Payload::new();
        map.insert("is_fallback".to_string(), true.into());
        map.insert("fallback_reason".to_string(), reason.into());
        Self(map)
    }

    pub fn is_placeholder(&self) -> bool {
        self.0
            .get("is_fallback")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Empty or placeholder payloads carry nothing the evaluator can use.
    pub fn is_usable(&self) -> bool {
        !self.0.is_empty() && !self.is_placeholder()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum Phase {
    Interviewing,
    Evaluating {
        interview_data: InterviewPayload,
    },
    Summarizing {
        interview_data: InterviewPayload,
        evaluation: Evaluation,
    },
    Done {
        interview_data: InterviewPayload,
        evaluation: Evaluation,
        summary: Summary,
    },
}

impl Phase {
    pub fn control(&self) -> Control {
        match self {
            Phase::Interviewing => Control::Interviewing,
            Phase::Evaluating { .. } => Control::Evaluating,
            Phase::Summarizing { .. } => Control::Summarizing,
            Phase::Done { .. } => Control::Done,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: Uuid,
    /// Bumped on every successful write; the compare-and-swap token.
    pub revision: u64,
    pub transcript: Vec<Turn>,
    pub resume_text: Option<String>,
    pub turn_count: u32,
    #[serde(flatten)]
    pub phase: Phase,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(resume_text: Option<String>, transcript: Vec<Turn>) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            revision: 0,
            transcript,
            resume_text: resume_text.filter(|t| !t.trim().is_empty()),
            turn_count: 0,
            phase: Phase::Interviewing,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn control(&self) -> Control {
        self.phase.control()
    }

    pub fn is_done(&self) -> bool {
        matches!(self.phase, Phase::Done { .. })
    }

    pub fn interview_data(&self) -> Option<&InterviewPayload> {
        match &self.phase {
            Phase::Interviewing => None,
            Phase::Evaluating { interview_data }
            | Phase::Summarizing { interview_data, .. }
            | Phase::Done { interview_data, .. } => Some(interview_data),
        }
    }

    pub fn evaluation(&self) -> Option<&Evaluation> {
        match &self.phase {
            Phase::Summarizing { evaluation, .. } | Phase::Done { evaluation, .. } => {
                Some(evaluation)
            }
            _ => None,
        }
    }

    pub fn summary(&self) -> Option<&Summary> {
        match &self.phase {
            Phase::Done { summary, .. } => Some(summary),
            _ => None,
        }
    }

    /// Most recent interviewer line; what the caller shows or speaks next.
    pub fn last_interviewer_line(&self) -> Option<&str> {
        self.transcript
            .iter()
            .rev()
            .find(|t| t.speaker == Speaker::Interviewer)
            .map(|t| t.text.as_str())
    }

    /// `INTERVIEWER: ...` / `CANDIDATE: ...`, one turn per line.
    pub fn render_transcript(&self) -> String {
        self.transcript
            .iter()
            .map(|t| format!("{}: {}", t.speaker.label(), t.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
