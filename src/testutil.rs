//! Test utilities for reqforge.
//!
//! `ScriptedEngine` is public so integration tests can drive the pipelines
//! with canned responses. The working-directory helpers serialise tests that
//! change the process-wide current directory.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::config::EngineType;
use crate::engine::{Engine, EngineError, EngineResult, GenerationRequest};

/// Engine that replays queued results and records every request.
///
/// When the queue runs dry, further calls fail with exit code 1.
#[derive(Default)]
pub struct ScriptedEngine {
    queue: Mutex<VecDeque<EngineResult>>,
    requests: Mutex<Vec<GenerationRequest>>,
    unavailable: Option<String>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response.
    pub fn respond(self, output: impl Into<String>) -> Self {
        self.push(EngineResult::success(output))
    }

    /// Queue a failed call.
    pub fn fail(self, error: impl Into<String>) -> Self {
        self.push(EngineResult::failure(error, 1))
    }

    /// Queue an arbitrary result.
    pub fn push(self, result: EngineResult) -> Self {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(result);
        self
    }

    /// Make `probe()` fail.
    pub fn unavailable(mut self, reason: impl Into<String>) -> Self {
        self.unavailable = Some(reason.into());
        self
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of generate calls received.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Engine for ScriptedEngine {
    fn generate(&self, request: &GenerationRequest) -> EngineResult {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| EngineResult::failure("no scripted response left", 1))
    }

    fn probe(&self) -> Result<(), EngineError> {
        match &self.unavailable {
            Some(reason) => Err(EngineError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }

    fn engine_type(&self) -> EngineType {
        EngineType::Stub
    }
}

/// Global mutex for tests that change the current working directory.
#[cfg(test)]
pub static CWD_LOCK: Mutex<()> = Mutex::new(());

/// Run `f` inside a fresh temporary directory, restoring the original
/// working directory afterwards.
#[cfg(test)]
pub fn with_temp_cwd<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    use tempfile::TempDir;

    let _guard = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let original = std::env::current_dir().expect("failed to get current directory");
    let temp = TempDir::new().expect("failed to create temp directory");
    std::env::set_current_dir(temp.path()).expect("failed to change to temp directory");

    let result = f();

    std::env::set_current_dir(&original).expect("failed to restore original directory");
    result
}
