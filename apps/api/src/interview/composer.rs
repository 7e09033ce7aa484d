//! Prompt Composer — builds the (system, user) pair for each stage.
//!
//! Pure: the same record and limits always produce the same prompt text. The composer
//! reads its own inputs only; it never looks at generation output.

use serde_json::Value;

use crate::interview::normalize::Evaluation;
use crate::interview::prompts::{
    EVALUATOR_SYSTEM, FIRST_QUESTION_DIRECTIVE, FORCE_CLOSE_DIRECTIVE, INTERVIEWER_SYSTEM,
    NEXT_QUESTION_DIRECTIVE, SUMMARIZER_SYSTEM, TRANSCRIPT_ONLY_NOTE,
};
use crate::interview::session::{InterviewPayload, SessionRecord};
use crate::llm_client::prompts::{EVIDENCE_INSTRUCTION, FENCED_JSON_INSTRUCTION};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePrompt {
    pub system: &'static str,
    pub user: String,
}

/// Turn-count-derived instruction for the interviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    FirstQuestion,
    NextQuestion,
    ForceClose,
}

impl Directive {
    /// Once `max_turns` questions have been asked, the next run closes the interview.
    pub fn for_turn(turn_count: u32, max_turns: u32) -> Self {
        if turn_count >= max_turns {
            Directive::ForceClose
        } else if turn_count == 0 {
            Directive::FirstQuestion
        } else {
            Directive::NextQuestion
        }
    }

    fn text(&self) -> &'static str {
        match self {
            Directive::FirstQuestion => FIRST_QUESTION_DIRECTIVE,
            Directive::NextQuestion => NEXT_QUESTION_DIRECTIVE,
            Directive::ForceClose => FORCE_CLOSE_DIRECTIVE,
        }
    }
}

pub fn compose_interview(record: &SessionRecord, max_turns: u32) -> StagePrompt {
    let directive = Directive::for_turn(record.turn_count, max_turns);
    let mut user = String::new();

    if let Some(resume) = &record.resume_text {
        user.push_str("RESUME CONTEXT:\n");
        user.push_str(resume);
        user.push_str("\n\n");
    }

    user.push_str("CONVERSATION HISTORY:\n");
    user.push_str(&record.render_transcript());
    user.push_str(&format!(
        "\n\nStatus: You have asked {} of at most {} questions.\nInstruction: {}",
        record.turn_count,
        max_turns,
        directive.text()
    ));
    if directive == Directive::ForceClose {
        user.push('\n');
        user.push_str(FENCED_JSON_INSTRUCTION);
    }

    StagePrompt {
        system: INTERVIEWER_SYSTEM,
        user,
    }
}

/// Embeds the interviewer's payload verbatim, or the transcript when the payload is
/// empty or a placeholder.
pub fn compose_evaluation(interview_data: &InterviewPayload, transcript: &str) -> StagePrompt {
    let material = if interview_data.is_usable() {
        format!(
            "INTERVIEW DATA:\n{:#}",
            Value::Object(interview_data.0.clone())
        )
    } else {
        format!("{TRANSCRIPT_ONLY_NOTE}\n\nFULL TRANSCRIPT:\n{transcript}")
    };

    StagePrompt {
        system: EVALUATOR_SYSTEM,
        user: format!("{EVIDENCE_INSTRUCTION}\n\n{material}\n\n{FENCED_JSON_INSTRUCTION}"),
    }
}

/// Embeds the normalized evaluation verbatim.
pub fn compose_summary(evaluation: &Evaluation) -> StagePrompt {
    let evaluation = serde_json::to_value(evaluation).unwrap_or(Value::Null);
    StagePrompt {
        system: SUMMARIZER_SYSTEM,
        user: format!(
            "{EVIDENCE_INSTRUCTION}\n\nEVALUATION DATA:\n{evaluation:#}\n\n{FENCED_JSON_INSTRUCTION}"
        ),
    }
}
