// Shared prompt fragments.
// Each feature module that calls the generator defines its own prompts.rs alongside it.
// This file contains cross-cutting fragments only.

/// Appended to every prompt that expects a structured payload back.
/// The extractor tries a ```json fence first, so asking for one keeps parsing on the fast path.
pub const FENCED_JSON_INSTRUCTION: &str = "\
    Return the JSON object inside a single ```json fenced code block. \
    Do NOT emit more than one JSON object. \
    Do NOT add comments inside the JSON.";

/// Reminder used where the model must not invent content the transcript does not support.
pub const EVIDENCE_INSTRUCTION: &str = "\
    Base every statement on the material provided below. \
    If the material does not support a claim, leave it out.";
