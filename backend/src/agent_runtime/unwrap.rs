//! Extraction of the answer text from agent runtime payloads
//!
//! The runtime does not commit to one reply shape. Structured JSON is tried
//! first; a Python `repr()` embedded in the payload is only scanned as a
//! fallback, and every time that happens it is logged.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

/// Opening of the text field in a `repr()` of the agent result
const REPR_TEXT_MARKER: &str = "'text': '";

/// Fields that carry the answer in flat payloads, in priority order
const FLAT_TEXT_FIELDS: [&str; 3] = ["content", "message", "text"];

static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid newline regex"));

/// Which path produced the text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    /// A recognised JSON shape
    Json,
    /// Scanned out of a Python `repr()` string
    PythonRepr,
    /// Nothing recognised, the payload itself
    Raw,
}

/// Answer text extracted from an agent payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnwrappedContent {
    /// Cleaned answer text, possibly empty
    pub text: String,
    /// How the text was found
    pub format: PayloadFormat,
}

/// Extracts the answer text from a decoded agent payload
#[must_use]
pub fn unwrap_agent_payload(payload: &str) -> UnwrappedContent {
    let (text, format) = extract(payload.trim());
    UnwrappedContent {
        text: cleanup(&text),
        format,
    }
}

fn extract(payload: &str) -> (String, PayloadFormat) {
    if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(payload) {
        if let Some(found) = from_json_object(&object) {
            return found;
        }
    }

    if let Some(text) = scan_repr(payload) {
        warn!("Agent payload is not structured JSON, falling back to repr scan");
        return (text, PayloadFormat::PythonRepr);
    }

    (payload.to_string(), PayloadFormat::Raw)
}

fn from_json_object(object: &Map<String, Value>) -> Option<(String, PayloadFormat)> {
    match object.get("response") {
        Some(Value::String(response)) if !response.is_empty() => {
            if let Some(text) = scan_repr(response) {
                warn!("Agent response field holds a repr string, falling back to repr scan");
                return Some((text, PayloadFormat::PythonRepr));
            }
            return Some((response.clone(), PayloadFormat::Json));
        }
        Some(Value::Object(result)) => {
            return Some((from_agent_result(result), PayloadFormat::Json));
        }
        _ => {}
    }

    flat_text(object).map(|text| (text, PayloadFormat::Json))
}

/// `{"message": {"content": [{"text": ...}, ...]}}` or a flat object
fn from_agent_result(result: &Map<String, Value>) -> String {
    if let Some(Value::Array(parts)) = result.get("message").and_then(|m| m.get("content")) {
        let first_text = parts
            .first()
            .and_then(|part| part.get("text"))
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty());
        if let Some(text) = first_text {
            return text.to_string();
        }

        return parts
            .iter()
            .map(|part| {
                part.get("text")
                    .and_then(Value::as_str)
                    .map_or_else(|| part.to_string(), str::to_string)
            })
            .collect::<Vec<_>>()
            .join("\n");
    }

    flat_text(result).unwrap_or_else(|| Value::Object(result.clone()).to_string())
}

fn flat_text(object: &Map<String, Value>) -> Option<String> {
    FLAT_TEXT_FIELDS.iter().find_map(|field| {
        object
            .get(*field)
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    })
}

/// Finds `'text': '` and reads up to the next unescaped single quote
fn scan_repr(source: &str) -> Option<String> {
    let start = source.find(REPR_TEXT_MARKER)? + REPR_TEXT_MARKER.len();
    let body = &source[start..];

    let mut escaped = false;
    for (i, c) in body.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '\'' => return (i > 0).then(|| unescape_repr(&body[..i])),
            _ => {}
        }
    }

    None
}

fn unescape_repr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(quote @ ('\'' | '"')) => out.push(quote),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

/// Removes the escape artifacts that survive extraction
fn cleanup(text: &str) -> String {
    let text = strip_matching_quotes(text.trim()).replace("\\n", "\n");
    let text = EXCESS_NEWLINES.replace_all(&text, "\n\n");
    drop_escapes(&text).trim().to_string()
}

fn strip_matching_quotes(text: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    text
}

fn drop_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}
