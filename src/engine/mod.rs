//! Generation engine abstraction.
//!
//! Supports multiple backends:
//! - `claude`: Claude CLI (`--print`, prompt on stdin)
//! - `codex`: Codex CLI (`exec -`, prompt on stdin)
//! - `stub`: Deterministic stub for tests and offline runs (no network)

use std::sync::Arc;

use thiserror::Error;

use crate::config::EngineType;

mod cli;
pub mod process;
mod recording;
mod stub;

pub use cli::CliEngine;
pub use recording::RecordingEngine;
pub use stub::StubEngine;

/// One request to the generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Instruction framing the response format.
    pub system_prompt: String,
    /// The material and task for this call.
    pub user_prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Response token budget.
    pub max_tokens: u32,
    /// Short label for logs (e.g. "chunk 2/5").
    pub label: String,
}

impl GenerationRequest {
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            temperature: 0.3,
            max_tokens: 2000,
            label: String::new(),
        }
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Result of one generation call.
#[derive(Debug, Clone)]
pub struct EngineResult {
    /// Whether the call succeeded.
    pub success: bool,
    /// Raw response text.
    pub output: String,
    /// Error message if failed.
    pub error: Option<String>,
    /// Exit code (124 timeout, 130 shutdown).
    pub exit_code: i32,
}

impl EngineResult {
    /// Create a successful result.
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
            exit_code: 0,
        }
    }

    /// Create a failed result.
    pub fn failure(error: impl Into<String>, exit_code: i32) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
            exit_code,
        }
    }

    /// Whether the call was cut short by the timeout.
    pub fn timed_out(&self) -> bool {
        !self.success && self.exit_code == EXIT_TIMEOUT
    }
}

/// Exit code reported when a call exceeds its timeout.
pub const EXIT_TIMEOUT: i32 = 124;

/// Exit code reported when a call is interrupted by shutdown.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Engine-level errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The backing service cannot be reached at all.
    #[error("generation service unavailable: {0}")]
    Unavailable(String),
}

/// Generation backend.
pub trait Engine: Send + Sync {
    /// Send one request and wait for the raw response text.
    fn generate(&self, request: &GenerationRequest) -> EngineResult;

    /// Cheap reachability check run before a pipeline starts.
    fn probe(&self) -> Result<(), EngineError> {
        Ok(())
    }

    /// Get the engine type.
    fn engine_type(&self) -> EngineType;
}

impl<E: Engine + ?Sized> Engine for Arc<E> {
    fn generate(&self, request: &GenerationRequest) -> EngineResult {
        (**self).generate(request)
    }

    fn probe(&self) -> Result<(), EngineError> {
        (**self).probe()
    }

    fn engine_type(&self) -> EngineType {
        (**self).engine_type()
    }
}

/// Create an engine from config.
pub fn create_engine(engine_type: EngineType, timeout_secs: u64) -> Arc<dyn Engine> {
    match engine_type {
        EngineType::Claude => Arc::new(CliEngine::claude().with_timeout(timeout_secs)),
        EngineType::Codex => Arc::new(CliEngine::codex().with_timeout(timeout_secs)),
        EngineType::Stub => Arc::new(StubEngine::new()),
    }
}
