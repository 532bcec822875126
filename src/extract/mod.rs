//! Per-chunk structured extraction.
//!
//! Each chunk gets one generation call. Failures of any kind (engine error,
//! timeout, unparseable or low-confidence output) degrade to the keyword
//! fallback, so a single chunk can never abort a run.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, warn};

use crate::chunk::Chunk;
use crate::corpus::is_structural_line;
use crate::engine::{Engine, GenerationRequest};
use crate::prompt::{self, PromptError};

pub mod fallback;
pub mod parse;

pub use parse::{parse_response, ParseOutcome};

/// Where a partial extraction's arrays came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtractionSource {
    /// Validated generation response.
    Generated,
    /// Keyword fallback over the chunk text.
    Fallback,
    /// Chunk had too little content to send.
    MinimalContent,
}

/// Why the keyword fallback ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FallbackReason {
    /// The engine call failed.
    EngineFailure,
    /// The engine call exceeded its timeout.
    Timeout,
    /// Response text held no parseable JSON object.
    Malformed,
    /// Response was blank.
    Empty,
    /// Response parsed but every array was empty.
    LowConfidence,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EngineFailure => "engine failure",
            Self::Timeout => "timeout",
            Self::Malformed => "malformed response",
            Self::Empty => "empty response",
            Self::LowConfidence => "low confidence",
        }
    }

    /// Whether the engine itself failed, as opposed to its output.
    pub fn is_engine_failure(&self) -> bool {
        matches!(self, Self::EngineFailure | Self::Timeout)
    }
}

/// Unreconciled facts extracted from one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialExtraction {
    pub features: Vec<String>,
    pub objectives: Vec<String>,
    pub user_stories: Vec<String>,
    pub overview: String,
    pub source: ExtractionSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
}

impl PartialExtraction {
    /// An extraction with no content, tagged as minimal.
    pub fn minimal(position: usize, total: usize) -> Self {
        Self {
            features: Vec::new(),
            objectives: Vec::new(),
            user_stories: Vec::new(),
            overview: format!("Chunk {}/{}: minimal content", position, total),
            source: ExtractionSource::MinimalContent,
            fallback_reason: None,
        }
    }

    /// Whether at least one array field is non-empty.
    pub fn has_content(&self) -> bool {
        !self.features.is_empty() || !self.objectives.is_empty() || !self.user_stories.is_empty()
    }
}

/// Drop banner and separator lines, returning the trimmed remainder.
pub fn clean_chunk_text(text: &str) -> String {
    text.lines()
        .filter(|line| !is_structural_line(line))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Settings for a [`ChunkExtractor`].
#[derive(Debug, Clone)]
pub struct ExtractorSettings {
    /// Cleaned chunks shorter than this skip the engine call.
    pub min_content_chars: usize,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Optional prompt override directory.
    pub prompts_dir: Option<PathBuf>,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            min_content_chars: 50,
            temperature: 0.3,
            max_tokens: 2000,
            prompts_dir: None,
        }
    }
}

/// Runs one chunk through the engine with fallback.
pub struct ChunkExtractor<'a> {
    engine: &'a dyn Engine,
    settings: ExtractorSettings,
    system_prompt: String,
    user_template: String,
}

impl<'a> ChunkExtractor<'a> {
    /// Create an extractor, loading both prompt templates up front.
    pub fn new(engine: &'a dyn Engine, settings: ExtractorSettings) -> Result<Self, PromptError> {
        let dir = settings.prompts_dir.as_deref();
        let system_prompt = prompt::load_prompt("extract_system", dir)?;
        let user_template = prompt::load_prompt("extract_user", dir)?;
        Ok(Self {
            engine,
            settings,
            system_prompt,
            user_template,
        })
    }

    /// Whether `chunk` would be short-circuited as minimal content.
    pub fn is_minimal(&self, chunk: &Chunk) -> bool {
        clean_chunk_text(&chunk.text).chars().count() < self.settings.min_content_chars
    }

    /// Extract facts from `chunk`, reported as `position` of `total` (1-based).
    pub fn extract(
        &self,
        chunk: &Chunk,
        position: usize,
        total: usize,
        context_label: &str,
    ) -> PartialExtraction {
        let cleaned = clean_chunk_text(&chunk.text);
        if cleaned.chars().count() < self.settings.min_content_chars {
            debug!(position, total, chars = cleaned.chars().count(), "minimal content, skipping call");
            return PartialExtraction::minimal(position, total);
        }

        let mut vars = HashMap::new();
        vars.insert("context_label", context_label.to_string());
        vars.insert("position", position.to_string());
        vars.insert("total", total.to_string());
        vars.insert("content", cleaned.clone());

        let request = GenerationRequest::new(
            self.system_prompt.clone(),
            prompt::render(&self.user_template, &vars),
        )
        .with_sampling(self.settings.temperature, self.settings.max_tokens)
        .with_label(format!("chunk {}/{}", position, total));

        let result = self.engine.generate(&request);
        if !result.success {
            let reason = if result.timed_out() {
                FallbackReason::Timeout
            } else {
                FallbackReason::EngineFailure
            };
            warn!(
                position,
                total,
                error = result.error.as_deref().unwrap_or("unknown"),
                "generation failed, using keyword fallback"
            );
            return fallback::keyword_extract(&cleaned, position, total, reason);
        }

        let reason = match parse_response(&result.output, position, total) {
            ParseOutcome::Parsed(partial) if partial.has_content() => return partial,
            ParseOutcome::Parsed(_) => FallbackReason::LowConfidence,
            ParseOutcome::Malformed(detail) => {
                debug!(position, total, detail = %detail, "response did not parse");
                FallbackReason::Malformed
            }
            ParseOutcome::Empty => FallbackReason::Empty,
        };
        warn!(position, total, reason = reason.as_str(), "using keyword fallback");
        fallback::keyword_extract(&cleaned, position, total, reason)
    }
}
