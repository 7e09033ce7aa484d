//! Pipeline stages — interview → evaluation → summary.
//!
//! Each stage handles exactly one `Control` value and runs at most one generation call.
//! The `Pipeline` only dispatches; adding a stage means implementing `Stage` and
//! registering it, without touching the turn controller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::interview::composer::{
    compose_evaluation, compose_interview, compose_summary, Directive,
};
use crate::interview::controller::TurnError;
use crate::interview::extract::{extract, extract_with_strategy, Payload, Strategy};
use crate::interview::normalize::{
    fallback_evaluation, fallback_summary, normalize_evaluation, normalize_summary,
};
use crate::interview::prompts::{CLOSING_LINE, INTERVIEWER_UNAVAILABLE_LINE};
use crate::interview::session::{Control, InterviewPayload, Phase, SessionRecord, Turn};
use crate::llm_client::{invoke, Generation, TextGenerator};

const TURN_LIMIT_WITHOUT_PAYLOAD: &str = "turn limit reached without a structured payload";

#[derive(Debug, Clone)]
pub struct InterviewSettings {
    /// Questions asked before the next interview run closes the interview.
    pub max_turns: u32,
    pub generation_timeout: Duration,
}

pub struct StageContext<'a> {
    pub generator: &'a dyn TextGenerator,
    pub settings: &'a InterviewSettings,
}

impl StageContext<'_> {
    async fn generate(&self, system: &str, user: &str) -> Generation {
        invoke(
            self.generator,
            self.settings.generation_timeout,
            system,
            user,
        )
        .await
    }
}

#[async_trait]
pub trait Stage: Send + Sync {
    /// The control value this stage runs in.
    fn handles(&self) -> Control;

    async fn run(
        &self,
        record: SessionRecord,
        ctx: &StageContext<'_>,
    ) -> Result<SessionRecord, TurnError>;
}

fn mismatch(stage: Control, record: &SessionRecord) -> TurnError {
    TurnError::StageMismatch {
        stage,
        found: record.control(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Interview
// ────────────────────────────────────────────────────────────────────────────

/// The only looping stage: asks the next question, or closes the interview when the
/// interviewer emits a payload or the turn ceiling is reached.
pub struct InterviewStage;

#[async_trait]
impl Stage for InterviewStage {
    fn handles(&self) -> Control {
        Control::Interviewing
    }

    async fn run(
        &self,
        mut record: SessionRecord,
        ctx: &StageContext<'_>,
    ) -> Result<SessionRecord, TurnError> {
        if record.phase != Phase::Interviewing {
            return Err(mismatch(self.handles(), &record));
        }

        let max_turns = ctx.settings.max_turns;
        let directive = Directive::for_turn(record.turn_count, max_turns);
        let prompt = compose_interview(&record, max_turns);
        let generation = ctx.generate(prompt.system, &prompt.user).await;
        let payload = generation
            .text()
            .and_then(|text| closing_payload(text, directive));

        let interview_data = match (payload, directive) {
            (Some(payload), _) => {
                info!(
                    "Session {}: interviewer emitted its payload at turn {}",
                    record.session_id, record.turn_count
                );
                InterviewPayload(payload)
            }
            (None, Directive::ForceClose) => {
                let reason = match &generation {
                    Generation::Failed { reason } => format!("generation failed: {reason}"),
                    Generation::Text(_) => TURN_LIMIT_WITHOUT_PAYLOAD.to_string(),
                };
                warn!(
                    "Session {}: closing interview with placeholder payload ({reason})",
                    record.session_id
                );
                InterviewPayload::placeholder(&reason)
            }
            (None, _) => {
                let line = match &generation {
                    Generation::Text(text) => text.trim().to_string(),
                    Generation::Failed { .. } => {
                        warn!(
                            "Session {}: interviewer unavailable, recording stand-in line",
                            record.session_id
                        );
                        INTERVIEWER_UNAVAILABLE_LINE.to_string()
                    }
                };
                record.transcript.push(Turn::interviewer(line));
                record.turn_count = record.turn_count.saturating_add(1);
                return Ok(record);
            }
        };

        record.transcript.push(Turn::interviewer(CLOSING_LINE));
        record.phase = Phase::Evaluating { interview_data };
        Ok(record)
    }
}

/// On a regular turn only a non-empty ```json fenced object ends the interview, so a
/// question quoting code such as `println!("{}", x)` is never read as a payload. The
/// closing run also accepts a bare object.
fn closing_payload(text: &str, directive: Directive) -> Option<Payload> {
    let (strategy, payload) = extract_with_strategy(text)?;
    let accepted = match directive {
        Directive::ForceClose => true,
        Directive::FirstQuestion | Directive::NextQuestion => strategy == Strategy::FencedBlock,
    };
    (accepted && !payload.is_empty()).then_some(payload)
}

// ────────────────────────────────────────────────────────────────────────────
// Evaluation
// ────────────────────────────────────────────────────────────────────────────

pub struct EvaluationStage;

#[async_trait]
impl Stage for EvaluationStage {
    fn handles(&self) -> Control {
        Control::Evaluating
    }

    async fn run(
        &self,
        mut record: SessionRecord,
        ctx: &StageContext<'_>,
    ) -> Result<SessionRecord, TurnError> {
        let Phase::Evaluating { interview_data } = &record.phase else {
            return Err(mismatch(self.handles(), &record));
        };
        let interview_data = interview_data.clone();

        let prompt = compose_evaluation(&interview_data, &record.render_transcript());
        let evaluation = match ctx.generate(prompt.system, &prompt.user).await {
            Generation::Text(text) => normalize_evaluation(extract(&text).as_ref()),
            Generation::Failed { reason } => {
                fallback_evaluation(&format!("generation failed: {reason}"))
            }
        };

        info!(
            "Session {}: evaluation verdict={} overall={} fallback={}",
            record.session_id,
            evaluation.verdict.as_str(),
            evaluation.overall_score,
            evaluation.is_fallback
        );

        record.phase = Phase::Summarizing {
            interview_data,
            evaluation,
        };
        Ok(record)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Summary
// ────────────────────────────────────────────────────────────────────────────

pub struct SummaryStage;

#[async_trait]
impl Stage for SummaryStage {
    fn handles(&self) -> Control {
        Control::Summarizing
    }

    async fn run(
        &self,
        mut record: SessionRecord,
        ctx: &StageContext<'_>,
    ) -> Result<SessionRecord, TurnError> {
        let Phase::Summarizing {
            interview_data,
            evaluation,
        } = &record.phase
        else {
            return Err(mismatch(self.handles(), &record));
        };
        let (interview_data, evaluation) = (interview_data.clone(), evaluation.clone());

        let prompt = compose_summary(&evaluation);
        let summary = match ctx.generate(prompt.system, &prompt.user).await {
            Generation::Text(text) => normalize_summary(extract(&text).as_ref(), &evaluation),
            Generation::Failed { reason } => {
                fallback_summary(&format!("generation failed: {reason}"), &evaluation)
            }
        };

        record.phase = Phase::Done {
            interview_data,
            evaluation,
            summary,
        };
        Ok(record)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    generator: Arc<dyn TextGenerator>,
    settings: InterviewSettings,
}

impl Pipeline {
    pub fn new(
        stages: Vec<Box<dyn Stage>>,
        generator: Arc<dyn TextGenerator>,
        settings: InterviewSettings,
    ) -> Self {
        Self {
            stages,
            generator,
            settings,
        }
    }

    /// Interview → Evaluation → Summary.
    pub fn standard(generator: Arc<dyn TextGenerator>, settings: InterviewSettings) -> Self {
        Self::new(
            vec![
                Box::new(InterviewStage),
                Box::new(EvaluationStage),
                Box::new(SummaryStage),
            ],
            generator,
            settings,
        )
    }

    /// Runs the one stage registered for the record's current control value.
    pub async fn run_stage(&self, record: SessionRecord) -> Result<SessionRecord, TurnError> {
        let from = record.control();
        if from == Control::Done {
            return Err(TurnError::SessionCompleted(record.session_id));
        }
        let stage = self
            .stages
            .iter()
            .find(|s| s.handles() == from)
            .ok_or(TurnError::NoStage(from))?;

        let ctx = StageContext {
            generator: self.generator.as_ref(),
            settings: &self.settings,
        };
        info!(
            "Session {}: running {from} stage (turn {})",
            record.session_id, record.turn_count
        );
        let next = stage.run(record, &ctx).await?;
        if next.control() != from {
            info!(
                "Session {}: {from} -> {}",
                next.session_id,
                next.control()
            );
        }
        Ok(next)
    }
}
