//! Schema Normalizer — maps whatever the evaluation and summary stages produced onto one
//! stable contract for the presentation layer.
//!
//! Schema drift is absorbed in exactly one place: the alias tables below. Each canonical
//! field lists the dotted source paths it may be read from, in precedence order. Adding a
//! new upstream schema variant means adding paths to a table, never a new conditional.
//!
//! # Contract rules
//! - Every normalized value is complete: missing fields get a default and are listed in
//!   `defaulted_fields`.
//! - A payload with no recognised content field (or no payload at all) becomes a fallback
//!   object with `is_fallback: true` and a `fallback_reason`.
//! - Normalizing an already-normalized value is the identity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::interview::extract::Payload;

/// Weakness entry carried by every fallback evaluation.
pub const ANALYSIS_FAILED: &str = "analysis failed";
/// Red flag carried by every fallback evaluation.
pub const EVALUATION_FAILED_FLAG: &str = "Evaluation generation failed";

pub const FALLBACK_SHORT_SUMMARY: &str = "We encountered an issue generating the summary.";
pub const FALLBACK_DETAILED_SUMMARY: &str =
    "Please review the raw interview data as the automated summary generation failed.";

const NO_EVALUATION_PAYLOAD: &str = "no structured payload in evaluation output";
const UNRECOGNISED_EVALUATION: &str = "evaluation payload had no recognised fields";
const NO_SUMMARY_PAYLOAD: &str = "no structured payload in summary output";
const UNRECOGNISED_SUMMARY: &str = "summary payload had no recognised fields";

const MAX_CATEGORY_SCORE: f64 = 10.0;
const MAX_OVERALL_SCORE: f64 = 100.0;

// ────────────────────────────────────────────────────────────────────────────
// Verdict
// ────────────────────────────────────────────────────────────────────────────

/// Closed set of hiring recommendations carried from evaluation into the summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Strong Hire")]
    StrongHire,
    Hire,
    #[default]
    Consider,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
    #[serde(rename = "Not Suitable")]
    NotSuitable,
}

/// Spellings seen in model output, matched after lowercasing and collapsing punctuation.
const VERDICT_ALIASES: &[(&str, Verdict)] = &[
    ("strong hire", Verdict::StrongHire),
    ("strong yes", Verdict::StrongHire),
    ("hire", Verdict::Hire),
    ("yes", Verdict::Hire),
    ("lean hire", Verdict::Hire),
    ("consider", Verdict::Consider),
    ("maybe", Verdict::Consider),
    ("borderline", Verdict::Consider),
    ("needs improvement", Verdict::NeedsImprovement),
    ("lean no hire", Verdict::NeedsImprovement),
    ("not suitable", Verdict::NotSuitable),
    ("no hire", Verdict::NotSuitable),
    ("do not hire", Verdict::NotSuitable),
    ("not recommended", Verdict::NotSuitable),
    ("reject", Verdict::NotSuitable),
];

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::StrongHire => "Strong Hire",
            Verdict::Hire => "Hire",
            Verdict::Consider => "Consider",
            Verdict::NeedsImprovement => "Needs Improvement",
            Verdict::NotSuitable => "Not Suitable",
        }
    }

    /// Lenient parse. Template echoes such as "Strong Hire / Hire / Consider" are rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let key = raw
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ");
        VERDICT_ALIASES
            .iter()
            .find(|(alias, _)| *alias == key)
            .map(|(_, verdict)| *verdict)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stable output contracts
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub technical: f64,
    pub communication: f64,
    pub soft_skills: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerAssessment {
    pub question: String,
    pub answer_summary: String,
    pub category: String,
    /// 0 – 10
    pub rating: f64,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub per_answer: Vec<AnswerAssessment>,
    pub category_scores: CategoryScores,
    /// 0 – 100
    pub overall_score: f64,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub red_flags: Vec<String>,
    pub verdict: Verdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defaulted_fields: Vec<String>,
}

impl Evaluation {
    /// The verdict, unless it was substituted rather than produced by the model.
    pub fn trusted_verdict(&self) -> Option<Verdict> {
        let defaulted = self.defaulted_fields.iter().any(|f| f == "verdict");
        (!self.is_fallback && !defaulted).then_some(self.verdict)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub short_summary: String,
    pub detailed_summary: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sections: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub highlights: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_name: Option<String>,
    pub verdict: Verdict,
    // Merged from the normalized evaluation, never generated by the summary stage.
    pub technical_rating: f64,
    pub communication_rating: f64,
    pub confidence_score: f64,
    pub overall_score: f64,
    pub evaluation_per_answer: Vec<AnswerAssessment>,
    #[serde(default)]
    pub evaluation_is_fallback: bool,
    #[serde(default)]
    pub is_fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defaulted_fields: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Alias tables
// ────────────────────────────────────────────────────────────────────────────

/// One canonical field and the dotted paths it may be read from, first match wins.
#[derive(Debug, Clone, Copy)]
pub struct FieldAlias {
    pub canonical: &'static str,
    pub sources: &'static [&'static str],
}

const fn alias(canonical: &'static str, sources: &'static [&'static str]) -> FieldAlias {
    FieldAlias { canonical, sources }
}

/// Evaluation payloads are read from the extracted object root.
pub const EVALUATION_FIELDS: &[FieldAlias] = &[
    alias(
        "per_answer",
        &["per_answer", "detailed_analysis", "evaluation_per_answer"],
    ),
    alias(
        "category_scores.technical",
        &[
            "category_scores.technical",
            "category_scores.technical_score",
            "section_scores.technical_score",
        ],
    ),
    alias(
        "category_scores.communication",
        &[
            "category_scores.communication",
            "category_scores.communication_score",
            "section_scores.communication_score",
        ],
    ),
    alias(
        "category_scores.soft_skills",
        &[
            "category_scores.soft_skills",
            "category_scores.soft_skills_score",
            "section_scores.soft_skills_score",
            "section_scores.confidence_score",
            "section_scores.hr_score",
        ],
    ),
    alias(
        "overall_score",
        &[
            "overall_score",
            "overall_weighted_score",
            "section_scores.overall_score",
        ],
    ),
    alias("strengths", &["strengths"]),
    alias("weaknesses", &["weaknesses"]),
    alias("red_flags", &["red_flags"]),
    alias("verdict", &["verdict", "final_verdict", "recommendation"]),
    alias("notes", &["notes", "notes_for_summarizer"]),
    alias("is_fallback", &["is_fallback"]),
    alias("fallback_reason", &["fallback_reason"]),
    alias("defaulted_fields", &["defaulted_fields"]),
];

/// Per-answer items inside the evaluation's breakdown list.
pub const ANSWER_FIELDS: &[FieldAlias] = &[
    alias("question", &["question"]),
    alias("answer_summary", &["answer_summary", "answer"]),
    alias("category", &["category"]),
    alias("rating", &["rating", "score"]),
    alias("reasoning", &["reasoning", "rationale"]),
];

/// Summary fields are read from `{"summary": <extracted>, "evaluation": <normalized>}`.
/// `evaluation.verdict` is only present there when the evaluation verdict is trusted.
pub const SUMMARY_FIELDS: &[FieldAlias] = &[
    alias(
        "short_summary",
        &[
            "summary.short_summary",
            "summary.executive_summary",
            "summary.summary",
        ],
    ),
    alias(
        "detailed_summary",
        &["summary.detailed_summary", "summary.detailed_analysis"],
    ),
    alias("sections", &["summary.sections", "summary.key_findings"]),
    alias(
        "highlights",
        &["summary.highlights", "summary.interview_highlights"],
    ),
    alias(
        "candidate_name",
        &["summary.candidate_name", "summary.candidate_profile.name"],
    ),
    alias(
        "verdict",
        &[
            "evaluation.verdict",
            "summary.verdict",
            "summary.recommendation",
            "summary.candidate_profile.recommendation",
        ],
    ),
    alias(
        "technical_rating",
        &["evaluation.category_scores.technical"],
    ),
    alias(
        "communication_rating",
        &["evaluation.category_scores.communication"],
    ),
    alias(
        "confidence_score",
        &["evaluation.category_scores.soft_skills"],
    ),
    alias("overall_score", &["evaluation.overall_score"]),
    alias("evaluation_per_answer", &["evaluation.per_answer"]),
    alias("evaluation_is_fallback", &["evaluation.is_fallback"]),
    alias("is_fallback", &["summary.is_fallback"]),
    alias("fallback_reason", &["summary.fallback_reason"]),
    alias("defaulted_fields", &["summary.defaulted_fields"]),
];

// ────────────────────────────────────────────────────────────────────────────
// Resolution
// ────────────────────────────────────────────────────────────────────────────

fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(root, |value, key| value.get(key))
        .filter(|value| !value.is_null())
}

/// Walks one alias table over one source value.
struct Resolver<'a> {
    root: &'a Value,
    table: &'static [FieldAlias],
    /// Content fields that resolved; markers do not count.
    hits: usize,
    defaulted: Vec<String>,
}

impl<'a> Resolver<'a> {
    fn new(root: &'a Value, table: &'static [FieldAlias]) -> Self {
        Self {
            root,
            table,
            hits: 0,
            defaulted: Vec::new(),
        }
    }

    /// First source path whose value coerces, without counting it as content.
    fn peek<T>(&self, canonical: &str, coerce: impl Fn(&Value) -> Option<T>) -> Option<T> {
        self.table
            .iter()
            .find(|a| a.canonical == canonical)
            .into_iter()
            .flat_map(|a| a.sources.iter())
            .filter_map(|path| lookup(self.root, path))
            .find_map(coerce)
    }

    fn field<T>(&mut self, canonical: &str, coerce: impl Fn(&Value) -> Option<T>) -> Option<T> {
        let found = self.peek(canonical, coerce);
        if found.is_some() {
            self.hits += 1;
        }
        found
    }

    fn or_default<T>(
        &mut self,
        canonical: &str,
        coerce: impl Fn(&Value) -> Option<T>,
        default: T,
    ) -> T {
        self.field(canonical, coerce).unwrap_or_else(|| {
            self.defaulted.push(canonical.to_string());
            default
        })
    }

    /// Previously recorded defaults first, then the ones found in this pass.
    fn defaulted_fields(&self) -> Vec<String> {
        let mut fields = self.peek("defaulted_fields", string_list).unwrap_or_default();
        for field in &self.defaulted {
            if !fields.contains(field) {
                fields.push(field.clone());
            }
        }
        fields
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Coercions
// ────────────────────────────────────────────────────────────────────────────

pub(crate) fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(items.iter().filter_map(text).collect()),
        Value::String(_) => text(value).map(|s| vec![s]),
        _ => None,
    }
}

fn flag(value: &Value) -> Option<bool> {
    value.as_bool()
}

fn verdict(value: &Value) -> Option<Verdict> {
    value.as_str().and_then(Verdict::parse)
}

/// Accepts `7`, `7.5`, `"7"`, `"7/10"`, `"85%"`; clamps into `0..=max`.
pub(crate) fn score(max: f64) -> impl Fn(&Value) -> Option<f64> {
    move |value| {
        let raw = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => {
                let head = s.split('/').next().unwrap_or_default();
                head.trim().trim_end_matches('%').trim().parse::<f64>().ok()
            }
            _ => None,
        }?;
        raw.is_finite().then(|| raw.clamp(0.0, max))
    }
}

fn sections(value: &Value) -> Option<BTreeMap<String, String>> {
    value.as_object().map(|map| {
        map.iter()
            .filter_map(|(key, v)| text(v).map(|t| (key.clone(), t)))
            .collect()
    })
}

fn answers(value: &Value) -> Option<Vec<AnswerAssessment>> {
    value
        .as_array()
        .map(|items| items.iter().filter(|i| i.is_object()).map(answer).collect())
}

fn answer(item: &Value) -> AnswerAssessment {
    let r = Resolver::new(item, ANSWER_FIELDS);
    AnswerAssessment {
        question: r.peek("question", text).unwrap_or_default(),
        answer_summary: r.peek("answer_summary", text).unwrap_or_default(),
        category: r.peek("category", text).unwrap_or_default(),
        rating: r
            .peek("rating", score(MAX_CATEGORY_SCORE))
            .unwrap_or_default(),
        reasoning: r.peek("reasoning", text).unwrap_or_default(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Evaluation
// ────────────────────────────────────────────────────────────────────────────

/// The fixed, clearly-marked evaluation used when nothing trustworthy was produced.
pub fn fallback_evaluation(reason: &str) -> Evaluation {
    warn!("Substituting fallback evaluation: {reason}");
    Evaluation {
        per_answer: vec![],
        category_scores: CategoryScores::default(),
        overall_score: 0.0,
        strengths: vec![],
        weaknesses: vec![ANALYSIS_FAILED.to_string()],
        red_flags: vec![EVALUATION_FAILED_FLAG.to_string()],
        verdict: Verdict::Consider,
        notes: Some(
            "The evaluator failed to produce a structured output. Please review the transcript."
                .to_string(),
        ),
        is_fallback: true,
        fallback_reason: Some(reason.to_string()),
        defaulted_fields: vec![],
    }
}

pub fn normalize_evaluation(extracted: Option<&Payload>) -> Evaluation {
    let Some(payload) = extracted else {
        return fallback_evaluation(NO_EVALUATION_PAYLOAD);
    };
    let root = Value::Object(payload.clone());
    let mut r = Resolver::new(&root, EVALUATION_FIELDS);
    let category = score(MAX_CATEGORY_SCORE);

    let per_answer = r.or_default("per_answer", answers, vec![]);
    let category_scores = CategoryScores {
        technical: r.or_default("category_scores.technical", &category, 0.0),
        communication: r.or_default("category_scores.communication", &category, 0.0),
        soft_skills: r.or_default("category_scores.soft_skills", &category, 0.0),
    };
    let overall_score = r.or_default("overall_score", score(MAX_OVERALL_SCORE), 0.0);
    let strengths = r.or_default("strengths", string_list, vec![]);
    let weaknesses = r.or_default("weaknesses", string_list, vec![]);
    let red_flags = r.or_default("red_flags", string_list, vec![]);
    let verdict = r.or_default("verdict", verdict, Verdict::Consider);
    let notes = r.field("notes", text);

    if r.hits == 0 {
        return fallback_evaluation(UNRECOGNISED_EVALUATION);
    }

    let defaulted_fields = r.defaulted_fields();
    Evaluation {
        per_answer,
        category_scores,
        overall_score,
        strengths,
        weaknesses,
        red_flags,
        verdict,
        notes,
        is_fallback: r.peek("is_fallback", flag).unwrap_or(false),
        fallback_reason: r.peek("fallback_reason", text),
        defaulted_fields,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Summary
// ────────────────────────────────────────────────────────────────────────────

/// Summary used when the summary stage produced nothing usable. Evaluation scores are
/// still merged so the report keeps whatever the evaluation established.
pub fn fallback_summary(reason: &str, evaluation: &Evaluation) -> Summary {
    summarize(None, evaluation, reason)
}

pub fn normalize_summary(extracted: Option<&Payload>, evaluation: &Evaluation) -> Summary {
    summarize(extracted, evaluation, NO_SUMMARY_PAYLOAD)
}

fn summarize(extracted: Option<&Payload>, evaluation: &Evaluation, reason: &str) -> Summary {
    let root = summary_source(extracted, evaluation);
    let mut r = Resolver::new(&root, SUMMARY_FIELDS);

    // Content generated by the summary stage.
    let short_summary = r.field("short_summary", text);
    let detailed_summary = r.field("detailed_summary", text);
    let sections = r.field("sections", sections).unwrap_or_default();
    let highlights = r.field("highlights", string_list).unwrap_or_default();
    let candidate_name = r.field("candidate_name", text);
    let content_hits = r.hits;

    // Verdict precedence and evaluation merge; these never decide fallback.
    let verdict = r.peek("verdict", verdict).unwrap_or_default();
    let category = score(MAX_CATEGORY_SCORE);
    let technical_rating = r.peek("technical_rating", &category).unwrap_or_default();
    let communication_rating = r.peek("communication_rating", &category).unwrap_or_default();
    let confidence_score = r.peek("confidence_score", &category).unwrap_or_default();
    let overall_score = r
        .peek("overall_score", score(MAX_OVERALL_SCORE))
        .unwrap_or_default();
    let evaluation_per_answer = r.peek("evaluation_per_answer", answers).unwrap_or_default();
    let evaluation_is_fallback = r.peek("evaluation_is_fallback", flag).unwrap_or(false);

    let unrecognised = extracted.is_some() && content_hits == 0;
    if extracted.is_none() || unrecognised {
        let reason = if unrecognised { UNRECOGNISED_SUMMARY } else { reason };
        warn!("Substituting fallback summary: {reason}");
        return Summary {
            short_summary: FALLBACK_SHORT_SUMMARY.to_string(),
            detailed_summary: FALLBACK_DETAILED_SUMMARY.to_string(),
            sections: BTreeMap::new(),
            highlights: vec![],
            candidate_name: None,
            verdict,
            technical_rating,
            communication_rating,
            confidence_score,
            overall_score,
            evaluation_per_answer,
            evaluation_is_fallback,
            is_fallback: true,
            fallback_reason: Some(reason.to_string()),
            defaulted_fields: vec![],
        };
    }

    let short_summary = short_summary.unwrap_or_else(|| {
        r.defaulted.push("short_summary".to_string());
        String::new()
    });
    let detailed_summary = detailed_summary
        .or_else(|| render_sections(&sections))
        .unwrap_or_else(|| {
            r.defaulted.push("detailed_summary".to_string());
            String::new()
        });

    Summary {
        short_summary,
        detailed_summary,
        sections,
        highlights,
        candidate_name,
        verdict,
        technical_rating,
        communication_rating,
        confidence_score,
        overall_score,
        evaluation_per_answer,
        evaluation_is_fallback,
        is_fallback: r.peek("is_fallback", flag).unwrap_or(false),
        fallback_reason: r.peek("fallback_reason", text),
        defaulted_fields: r.defaulted_fields(),
    }
}

/// `{"summary": <extracted or {}>, "evaluation": <normalized, verdict only if trusted>}`
fn summary_source(extracted: Option<&Payload>, evaluation: &Evaluation) -> Value {
    let mut evaluation_view = match serde_json::to_value(evaluation) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    if evaluation.trusted_verdict().is_none() {
        evaluation_view.remove("verdict");
    }

    let mut root = Map::new();
    root.insert(
        "summary".to_string(),
        Value::Object(extracted.cloned().unwrap_or_default()),
    );
    root.insert("evaluation".to_string(), Value::Object(evaluation_view));
    Value::Object(root)
}

/// `{"technical_competence": "..."}` → `"Technical competence: ..."` paragraphs.
fn render_sections(sections: &BTreeMap<String, String>) -> Option<String> {
    if sections.is_empty() {
        return None;
    }
    let rendered = sections
        .iter()
        .map(|(key, body)| {
            let title = key.replace('_', " ");
            let mut chars = title.chars();
            let title = match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => title,
            };
            format!("{title}: {body}")
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    Some(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn renormalize_evaluation(evaluation: &Evaluation) -> Evaluation {
        let value = serde_json::to_value(evaluation).unwrap();
        normalize_evaluation(Some(&payload(value)))
    }

    fn current_schema_evaluation() -> Payload {
        payload(json!({
            "detailed_analysis": [{
                "question": "Tell me about your last project",
                "answer_summary": "Built a caching layer",
                "category": "Technical",
                "rating": 8,
                "reasoning": "Concrete, measured outcome"
            }],
            "category_scores": {
                "technical_score": 8,
                "communication_score": "7/10",
                "soft_skills_score": 7
            },
            "overall_weighted_score": 76,
            "strengths": ["Systems thinking"],
            "weaknesses": ["Testing depth"],
            "red_flags": [],
            "final_verdict": "Hire"
        }))
    }

    #[test]
    fn test_verdict_parse_aliases() {
        assert_eq!(Verdict::parse("Strong Hire"), Some(Verdict::StrongHire));
        assert_eq!(Verdict::parse("HIRE"), Some(Verdict::Hire));
        assert_eq!(Verdict::parse("  consider. "), Some(Verdict::Consider));
        assert_eq!(Verdict::parse("NO HIRE"), Some(Verdict::NotSuitable));
        assert_eq!(
            Verdict::parse("needs-improvement"),
            Some(Verdict::NeedsImprovement)
        );
        assert_eq!(Verdict::parse("Strong Hire / Hire / Consider / Not Suitable"), None);
        assert_eq!(Verdict::parse(""), None);
    }

    #[test]
    fn test_verdict_serializes_with_display_names() {
        assert_eq!(
            serde_json::to_value(Verdict::NotSuitable).unwrap(),
            json!("Not Suitable")
        );
        let parsed: Verdict = serde_json::from_value(json!("Strong Hire")).unwrap();
        assert_eq!(parsed, Verdict::StrongHire);
        assert_eq!(Verdict::NeedsImprovement.as_str(), "Needs Improvement");
    }

    #[test]
    fn test_evaluation_table_canonicals_read_themselves_first() {
        for alias in EVALUATION_FIELDS.iter().chain(ANSWER_FIELDS) {
            assert_eq!(
                alias.sources.first(),
                Some(&alias.canonical),
                "{} must list itself first so re-normalizing is the identity",
                alias.canonical
            );
        }
    }

    #[test]
    fn test_summary_table_sources_are_scoped() {
        for alias in SUMMARY_FIELDS {
            for source in alias.sources {
                assert!(
                    source.starts_with("summary.") || source.starts_with("evaluation."),
                    "{source} must be scoped to summary or evaluation"
                );
            }
        }
    }

    #[test]
    fn test_current_schema_maps_onto_contract() {
        let evaluation = normalize_evaluation(Some(&current_schema_evaluation()));
        assert!(!evaluation.is_fallback);
        assert_eq!(evaluation.per_answer.len(), 1);
        assert_eq!(evaluation.per_answer[0].rating, 8.0);
        assert_eq!(
            evaluation.category_scores,
            CategoryScores {
                technical: 8.0,
                communication: 7.0,
                soft_skills: 7.0
            }
        );
        assert_eq!(evaluation.overall_score, 76.0);
        assert_eq!(evaluation.verdict, Verdict::Hire);
        assert_eq!(evaluation.trusted_verdict(), Some(Verdict::Hire));
        assert!(evaluation.defaulted_fields.is_empty());
    }

    #[test]
    fn test_legacy_section_scores_schema() {
        let legacy = payload(json!({
            "evaluation_per_answer": [{"question": "Intro", "answer": "Hi", "score": 6}],
            "section_scores": {
                "hr_score": 5,
                "technical_score": 6,
                "communication_score": 7,
                "confidence_score": 8,
                "overall_score": 64
            },
            "red_flags": ["Vague on ownership"],
            "final_verdict": "Consider",
            "notes_for_summarizer": "Nervous start"
        }));
        let evaluation = normalize_evaluation(Some(&legacy));
        assert_eq!(evaluation.per_answer[0].answer_summary, "Hi");
        assert_eq!(evaluation.per_answer[0].rating, 6.0);
        assert_eq!(evaluation.category_scores.technical, 6.0);
        // confidence_score outranks hr_score for the soft-skills slot
        assert_eq!(evaluation.category_scores.soft_skills, 8.0);
        assert_eq!(evaluation.overall_score, 64.0);
        assert_eq!(evaluation.notes.as_deref(), Some("Nervous start"));
        assert_eq!(
            evaluation.defaulted_fields,
            vec!["strengths".to_string(), "weaknesses".to_string()]
        );
    }

    #[test]
    fn test_scores_are_clamped_and_coerced() {
        let evaluation = normalize_evaluation(Some(&payload(json!({
            "category_scores": {"technical": 42, "communication": "-3", "soft_skills": "85%"},
            "overall_score": "250/100",
            "verdict": "Hire"
        }))));
        assert_eq!(evaluation.category_scores.technical, 10.0);
        assert_eq!(evaluation.category_scores.communication, 0.0);
        assert_eq!(evaluation.category_scores.soft_skills, 10.0);
        assert_eq!(evaluation.overall_score, 100.0);
    }

    #[test]
    fn test_absent_payload_yields_marked_fallback() {
        let evaluation = normalize_evaluation(None);
        assert!(evaluation.is_fallback);
        assert!(evaluation.weaknesses.contains(&ANALYSIS_FAILED.to_string()));
        assert!(evaluation.red_flags.contains(&EVALUATION_FAILED_FLAG.to_string()));
        assert_eq!(evaluation.verdict, Verdict::Consider);
        assert_eq!(evaluation.trusted_verdict(), None);
    }

    #[test]
    fn test_malformed_shape_yields_marked_fallback() {
        let evaluation =
            normalize_evaluation(Some(&payload(json!({"candidate": "Ana", "mood": 3}))));
        assert!(evaluation.is_fallback);
        assert_eq!(
            evaluation.fallback_reason.as_deref(),
            Some(UNRECOGNISED_EVALUATION)
        );
    }

    #[test]
    fn test_totality_every_output_has_numeric_score_keys() {
        let inputs = [
            None,
            Some(payload(json!({}))),
            Some(payload(json!({"category_scores": "high"}))),
            Some(payload(json!({"category_scores": {"technical": null}, "verdict": 12}))),
            Some(current_schema_evaluation()),
        ];
        for input in inputs {
            let value = serde_json::to_value(normalize_evaluation(input.as_ref())).unwrap();
            for key in ["technical", "communication", "soft_skills"] {
                assert!(value["category_scores"][key].is_number(), "{key} in {value}");
            }
            assert!(value["overall_score"].is_number());
            assert!(value["verdict"].is_string());
        }
    }

    #[test]
    fn test_partial_payload_records_defaults() {
        let evaluation = normalize_evaluation(Some(&payload(json!({"final_verdict": "maybe"}))));
        assert!(!evaluation.is_fallback);
        assert_eq!(evaluation.verdict, Verdict::Consider);
        assert!(evaluation
            .defaulted_fields
            .contains(&"category_scores.technical".to_string()));
        assert!(!evaluation.defaulted_fields.contains(&"verdict".to_string()));
    }

    #[test]
    fn test_unparseable_verdict_is_defaulted_and_untrusted() {
        let evaluation = normalize_evaluation(Some(&payload(json!({
            "overall_score": 50,
            "final_verdict": "Strong Hire / Hire / Consider / Not Suitable"
        }))));
        assert_eq!(evaluation.verdict, Verdict::Consider);
        assert_eq!(evaluation.trusted_verdict(), None);
    }

    #[test]
    fn test_evaluation_normalization_is_idempotent() {
        let cases = [
            normalize_evaluation(Some(&current_schema_evaluation())),
            normalize_evaluation(Some(&payload(json!({"final_verdict": "Hire"})))),
            normalize_evaluation(None),
        ];
        for once in cases {
            assert_eq!(renormalize_evaluation(&once), once);
        }
    }

    #[test]
    fn test_summary_remaps_legacy_fields_and_merges_scores() {
        let evaluation = normalize_evaluation(Some(&current_schema_evaluation()));
        let summary_payload = payload(json!({
            "candidate_profile": {"name": "Ana", "overall_rating": "76/100", "recommendation": "NO HIRE"},
            "executive_summary": "Solid engineer with clear communication.",
            "key_findings": {
                "technical_competence": "Strong on caching.",
                "communication_style": "Structured."
            },
            "interview_highlights": ["Explained cache invalidation well"]
        }));
        let summary = normalize_summary(Some(&summary_payload), &evaluation);

        assert!(!summary.is_fallback);
        assert_eq!(summary.short_summary, "Solid engineer with clear communication.");
        assert_eq!(summary.candidate_name.as_deref(), Some("Ana"));
        assert_eq!(
            summary.detailed_summary,
            "Communication style: Structured.\n\nTechnical competence: Strong on caching."
        );
        assert_eq!(summary.highlights.len(), 1);
        // Evaluation verdict outranks the summary's own recommendation.
        assert_eq!(summary.verdict, Verdict::Hire);
        assert_eq!(summary.technical_rating, 8.0);
        assert_eq!(summary.communication_rating, 7.0);
        assert_eq!(summary.confidence_score, 7.0);
        assert_eq!(summary.overall_score, 76.0);
        assert_eq!(summary.evaluation_per_answer, evaluation.per_answer);
    }

    #[test]
    fn test_summary_verdict_falls_back_to_own_recommendation() {
        let evaluation = normalize_evaluation(None);
        let summary = normalize_summary(
            Some(&payload(json!({
                "executive_summary": "Promising.",
                "candidate_profile": {"recommendation": "HIRE"}
            }))),
            &evaluation,
        );
        assert_eq!(summary.verdict, Verdict::Hire);
        assert!(summary.evaluation_is_fallback);
    }

    #[test]
    fn test_summary_verdict_defaults_to_consider() {
        let evaluation = normalize_evaluation(None);
        let summary = normalize_summary(
            Some(&payload(json!({"short_summary": "Ok."}))),
            &evaluation,
        );
        assert_eq!(summary.verdict, Verdict::Consider);
    }

    #[test]
    fn test_confidence_score_comes_from_soft_skills() {
        let evaluation = normalize_evaluation(Some(&payload(json!({
            "category_scores": {"technical": 4, "communication": 5, "soft_skills": 7},
            "final_verdict": "Consider"
        }))));
        let summary = normalize_summary(
            Some(&payload(json!({"short_summary": "Mixed.", "confidence_score": 2}))),
            &evaluation,
        );
        assert_eq!(summary.confidence_score, 7.0);
    }

    #[test]
    fn test_summary_fallback_keeps_evaluation_merge() {
        let evaluation = normalize_evaluation(Some(&current_schema_evaluation()));
        let summary = normalize_summary(None, &evaluation);
        assert!(summary.is_fallback);
        assert_eq!(summary.short_summary, FALLBACK_SHORT_SUMMARY);
        assert_eq!(summary.verdict, Verdict::Hire);
        assert_eq!(summary.overall_score, 76.0);

        let unrecognised = normalize_summary(Some(&payload(json!({"foo": "bar"}))), &evaluation);
        assert!(unrecognised.is_fallback);
        assert_eq!(
            unrecognised.fallback_reason.as_deref(),
            Some(UNRECOGNISED_SUMMARY)
        );
    }

    #[test]
    fn test_summary_normalization_is_idempotent() {
        let evaluation = normalize_evaluation(Some(&current_schema_evaluation()));
        let cases = [
            normalize_summary(
                Some(&payload(json!({
                    "executive_summary": "Good.",
                    "key_findings": {"cultural_fit": "Team player"}
                }))),
                &evaluation,
            ),
            normalize_summary(Some(&payload(json!({"verdict": "Hire"}))), &evaluation),
            fallback_summary("generation failed: timeout", &evaluation),
        ];
        for once in cases {
            let value = serde_json::to_value(&once).unwrap();
            let twice = normalize_summary(Some(&payload(value)), &evaluation);
            assert_eq!(twice, once);
        }
    }
}
