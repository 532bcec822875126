use std::sync::Arc;

use tracing::warn;

use crate::config::EngineType;
use crate::log::ExchangeLogger;

use super::{Engine, EngineError, EngineResult, GenerationRequest};

/// Wraps an engine and appends every exchange to the generation log.
pub struct RecordingEngine<E: Engine> {
    inner: E,
    logger: Arc<ExchangeLogger>,
}

impl<E: Engine> RecordingEngine<E> {
    pub fn new(inner: E, logger: Arc<ExchangeLogger>) -> Self {
        Self { inner, logger }
    }

    fn record(&self, label: &str, message: &str) {
        if let Err(e) = self.logger.log(label, message) {
            warn!(path = %self.logger.path.display(), error = %e, "failed to write generation log");
        }
    }
}

impl<E: Engine> Engine for RecordingEngine<E> {
    fn generate(&self, request: &GenerationRequest) -> EngineResult {
        let label = if request.label.is_empty() {
            "generation"
        } else {
            request.label.as_str()
        };

        self.record(
            &format!("{} request", label),
            &format!(
                "engine={} temperature={} max_tokens={} system_chars={} user_chars={}\n{}",
                self.inner.engine_type().as_str(),
                request.temperature,
                request.max_tokens,
                request.system_prompt.chars().count(),
                request.user_prompt.chars().count(),
                request.user_prompt
            ),
        );

        let result = self.inner.generate(request);

        if result.success {
            self.record(&format!("{} response", label), &result.output);
        } else {
            self.record(
                &format!("{} failure", label),
                &format!(
                    "exit_code={} {}",
                    result.exit_code,
                    result.error.as_deref().unwrap_or("unknown error")
                ),
            );
        }
        result
    }

    fn probe(&self) -> Result<(), EngineError> {
        let outcome = self.inner.probe();
        if let Err(ref e) = outcome {
            self.record("probe", &e.to_string());
        }
        outcome
    }

    fn engine_type(&self) -> EngineType {
        self.inner.engine_type()
    }
}
