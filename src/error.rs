//! Pipeline-level errors.

use thiserror::Error;

use crate::prompt::PromptError;
use crate::render::RenderError;
use crate::roster::RosterError;

/// Errors that stop a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No documents were supplied.
    #[error("no documents supplied")]
    NoDocuments,

    /// Every supplied document was blank.
    #[error("all {0} documents are empty")]
    EmptyDocuments(usize),

    /// The roster had no usable personnel.
    #[error("roster has no personnel")]
    EmptyRoster,

    /// The engine probe failed before any chunk was attempted.
    #[error("generation service unavailable: {0}")]
    GenerationUnavailable(String),

    /// Shutdown was requested mid-run.
    #[error("aborted after {completed} of {total} steps")]
    Aborted { completed: usize, total: usize },

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Roster(#[from] RosterError),
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
