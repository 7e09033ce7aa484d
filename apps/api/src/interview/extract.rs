//! Structured Output Extractor — recovers a JSON object embedded in free-form model output.
//!
//! Strategies, tried in order, first success wins:
//! 1. `FencedBlock`: a ```json fenced code block (tag is case-insensitive); every such
//!    block is tried in document order.
//! 2. `BraceSpan`: the substring from the first `{` to the last `}`.
//!
//! Only JSON *objects* count as a payload. Whether the object has the right shape is
//! the normalizer's business, not ours. `extract` never panics and never errors.

use serde_json::{Map, Value};
use tracing::debug;

/// A recovered structured payload.
pub type Payload = Map<String, Value>;

const FENCE: &str = "```";
const JSON_TAG: &str = "json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    FencedBlock,
    BraceSpan,
}

/// Returns the first JSON object found in `text`, or `None`.
pub fn extract(text: &str) -> Option<Payload> {
    extract_with_strategy(text).map(|(_, payload)| payload)
}

/// Like `extract`, but also reports which strategy produced the payload.
pub fn extract_with_strategy(text: &str) -> Option<(Strategy, Payload)> {
    let found = json_fenced_blocks(text)
        .find_map(parse_object)
        .map(|payload| (Strategy::FencedBlock, payload))
        .or_else(|| {
            brace_span(text)
                .and_then(parse_object)
                .map(|payload| (Strategy::BraceSpan, payload))
        });

    match &found {
        Some((strategy, payload)) => {
            debug!("Extracted payload via {strategy:?} ({} keys)", payload.len())
        }
        None => debug!("No structured payload found in {} chars", text.len()),
    }
    found
}

/// Yields the bodies of every fenced block whose info string is `json`.
fn json_fenced_blocks(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || loop {
        let open = rest.find(FENCE)?;
        let after_open = &rest[open + FENCE.len()..];
        let close = after_open.find(FENCE)?;
        let block = &after_open[..close];
        rest = &after_open[close + FENCE.len()..];

        if let Some(body) = strip_json_tag(block) {
            return Some(body);
        }
    })
}

/// `json\n{...}` or `JSON {...}` → `{...}`. Anything else (`jsonl`, `rust`, untagged) → None.
fn strip_json_tag(block: &str) -> Option<&str> {
    let tag = block.get(..JSON_TAG.len())?;
    if !tag.eq_ignore_ascii_case(JSON_TAG) {
        return None;
    }
    let body = &block[JSON_TAG.len()..];
    match body.chars().next() {
        None => Some(body),
        Some(c) if c.is_whitespace() || c == '{' => Some(body),
        Some(_) => None,
    }
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

fn parse_object(candidate: &str) -> Option<Payload> {
    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
