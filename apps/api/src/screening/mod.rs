//! Resume screening — scores a resume against a job description, ATS style.
//!
//! Uses the same generation boundary and extractor as the interview pipeline. The
//! qualification status is derived from the percentage here; the model's own `status`
//! field is never trusted.

pub mod handlers;
pub mod prompts;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::interview::extract::extract;
use crate::interview::normalize::{score, string_list, text};
use crate::llm_client::prompts::FENCED_JSON_INSTRUCTION;
use crate::llm_client::{invoke, Generation, TextGenerator};
use crate::screening::prompts::{SCREENING_PROMPT_TEMPLATE, SCREENING_SYSTEM};

pub const QUALIFYING_PERCENTAGE: u32 = 75;

const FALLBACK_ANALYSIS: &str = "Automated screening failed. Please review the resume manually.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreeningStatus {
    Qualified,
    #[serde(rename = "Not Qualified")]
    NotQualified,
}

impl ScreeningStatus {
    pub fn for_percentage(match_percentage: u32) -> Self {
        if match_percentage >= QUALIFYING_PERCENTAGE {
            ScreeningStatus::Qualified
        } else {
            ScreeningStatus::NotQualified
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningReport {
    /// 0 – 100
    pub match_percentage: u32,
    pub status: ScreeningStatus,
    pub missing_keywords: Vec<String>,
    pub analysis_summary: String,
    pub recommendation: String,
    #[serde(default)]
    pub is_fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

impl ScreeningReport {
    pub fn fallback(reason: &str) -> Self {
        warn!("Substituting fallback screening report: {reason}");
        Self {
            match_percentage: 0,
            status: ScreeningStatus::NotQualified,
            missing_keywords: vec![],
            analysis_summary: FALLBACK_ANALYSIS.to_string(),
            recommendation: String::new(),
            is_fallback: true,
            fallback_reason: Some(reason.to_string()),
        }
    }

    /// `None` when the payload carries no usable match percentage.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let percentage = payload
            .get("match_percentage")
            .and_then(score(100.0))?
            .round() as u32;
        Some(Self {
            match_percentage: percentage,
            status: ScreeningStatus::for_percentage(percentage),
            missing_keywords: payload
                .get("missing_keywords")
                .and_then(string_list)
                .unwrap_or_default(),
            analysis_summary: payload
                .get("analysis_summary")
                .and_then(text)
                .unwrap_or_default(),
            recommendation: payload
                .get("recommendation")
                .and_then(text)
                .unwrap_or_default(),
            is_fallback: false,
            fallback_reason: None,
        })
    }
}

pub fn compose_screening(resume_text: &str, job_description: &str) -> String {
    let prompt = SCREENING_PROMPT_TEMPLATE
        .replace("{job_description}", job_description)
        .replace("{resume_text}", resume_text);
    format!("{prompt}\n\n{FENCED_JSON_INSTRUCTION}")
}

/// One bounded generation call. Never fails; unusable output becomes a fallback report.
pub async fn screen_resume(
    generator: &dyn TextGenerator,
    timeout: Duration,
    resume_text: &str,
    job_description: &str,
) -> ScreeningReport {
    let prompt = compose_screening(resume_text, job_description);
    let report = match invoke(generator, timeout, SCREENING_SYSTEM, &prompt).await {
        Generation::Text(reply) => extract(&reply)
            .and_then(|payload| ScreeningReport::from_payload(&Value::Object(payload)))
            .unwrap_or_else(|| ScreeningReport::fallback("no usable screening payload")),
        Generation::Failed { reason } => {
            ScreeningReport::fallback(&format!("generation failed: {reason}"))
        }
    };
    info!(
        "Screening finished: match={}% status={:?} fallback={}",
        report.match_percentage, report.status, report.is_fallback
    );
    report
}
