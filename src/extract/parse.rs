//! Defensive parsing of generation responses.
//!
//! Model output is untrusted: it may wrap JSON in prose or code fences,
//! return several objects, or return nothing usable. Parsing yields a
//! [`ParseOutcome`] so callers branch exhaustively instead of probing for
//! sentinel values.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use super::{ExtractionSource, PartialExtraction};

/// Array entries shorter than this (after trimming) are discarded.
pub const MIN_ENTRY_CHARS: usize = 4;

static FENCED_JSON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[ \t]*json[ \t]*\r?\n?(.*?)```").expect("Failed to compile fenced json regex")
});

static FENCED_ANY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[^\n`]*\r?\n?(.*?)```").expect("Failed to compile fenced block regex")
});

/// Result of parsing one response.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<T> {
    /// A JSON object was found and mapped.
    Parsed(T),
    /// Text was present but no candidate parsed as a JSON object.
    Malformed(String),
    /// The response was blank.
    Empty,
}

impl<T> ParseOutcome<T> {
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ParseOutcome<U> {
        match self {
            ParseOutcome::Parsed(v) => ParseOutcome::Parsed(f(v)),
            ParseOutcome::Malformed(reason) => ParseOutcome::Malformed(reason),
            ParseOutcome::Empty => ParseOutcome::Empty,
        }
    }
}

/// Candidate JSON texts in the order they are tried.
fn candidates(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if end > start {
            out.push(&text[start..=end]);
        }
    }
    for re in [&*FENCED_JSON, &*FENCED_ANY] {
        for caps in re.captures_iter(text) {
            if let Some(body) = caps.get(1) {
                out.push(body.as_str().trim());
            }
        }
    }
    out
}

/// Find the first candidate that parses as a JSON object.
pub fn extract_json_object(text: &str) -> ParseOutcome<Map<String, Value>> {
    if text.trim().is_empty() {
        return ParseOutcome::Empty;
    }

    let mut last_error = String::from("no JSON object found");
    for candidate in candidates(text) {
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(map)) => return ParseOutcome::Parsed(map),
            Ok(other) => last_error = format!("expected an object, got {}", json_kind(&other)),
            Err(e) => last_error = e.to_string(),
        }
    }
    ParseOutcome::Malformed(last_error)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Keep string entries of an array field that are long enough.
///
/// A missing or non-array field yields an empty list.
pub fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| s.chars().count() >= MIN_ENTRY_CHARS)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Placeholder overview for a chunk whose response carried none.
pub fn placeholder_overview(position: usize, total: usize) -> String {
    format!("Chunk {}/{}: no overview provided", position, total)
}

/// Parse an extraction response for the chunk at `position` of `total`.
pub fn parse_response(text: &str, position: usize, total: usize) -> ParseOutcome<PartialExtraction> {
    extract_json_object(text).map(|obj| {
        let overview = obj
            .get("overview")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| placeholder_overview(position, total));

        PartialExtraction {
            features: string_list(obj.get("features")),
            objectives: string_list(obj.get("objectives")),
            user_stories: string_list(obj.get("userStories")),
            overview,
            source: ExtractionSource::Generated,
            fallback_reason: None,
        }
    })
}
