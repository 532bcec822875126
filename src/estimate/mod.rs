//! Role task generation, distribution and estimate validation.
//!
//! One generation call per role asks for five task drafts. Drafts are dealt
//! round-robin to the role's personnel and every estimate is clamped into
//! the role/complexity bounds table. When the call or its output fails, the
//! static fallback table for the role is used instead.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::consolidate::ConsolidatedPrd;
use crate::engine::{Engine, GenerationRequest};
use crate::extract::parse::extract_json_object;
use crate::extract::ParseOutcome;
use crate::prompt::{self, PromptError};

pub mod bounds;
pub mod fallback;
mod roles;

pub use bounds::{validate_hours, Complexity};
pub use roles::Role;

/// Number of drafts requested (and kept) per role.
pub const TASKS_PER_ROLE: usize = 5;

const NO_CONTEXT: &str =
    "No consolidated specification is available. Base the tasks on the requirements source name.";

/// A finished, assigned and estimated work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleTask {
    pub title: String,
    pub description: String,
    pub assigned_to: String,
    pub role: Role,
    pub estimated_hours: u32,
    pub complexity: String,
    pub activity: String,
}

/// Unvalidated task as produced by the engine or the fallback table.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub complexity: Option<String>,
    pub estimated_hours: Option<f64>,
}

fn hours_value(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn draft_from_value(value: &Value) -> Option<TaskDraft> {
    let obj = value.as_object()?;
    let title = obj.get("title")?.as_str()?.trim();
    if title.is_empty() {
        return None;
    }
    Some(TaskDraft {
        title: title.to_string(),
        description: obj
            .get("description")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
        complexity: obj
            .get("complexity")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string()),
        estimated_hours: hours_value(obj.get("estimatedHours")),
    })
}

/// Parse a task response into drafts.
///
/// Entries that are not objects or have no title are skipped. A missing or
/// non-array `tasks` field parses as an empty list.
pub fn parse_tasks(text: &str) -> ParseOutcome<Vec<TaskDraft>> {
    extract_json_object(text).map(|obj| match obj.get("tasks") {
        Some(Value::Array(items)) => items.iter().filter_map(draft_from_value).collect(),
        _ => Vec::new(),
    })
}

/// Summarise a consolidated PRD as prompt context.
pub fn prd_context(prd: &ConsolidatedPrd) -> String {
    let mut out = format!("Product: {}\nOverview: {}\n\nObjectives:\n", prd.project_name, prd.overview);
    for objective in &prd.objectives {
        out.push_str(&format!("- {}\n", objective));
    }
    out.push_str("\nKey features:\n");
    for feature in &prd.key_features {
        out.push_str(&format!("- {}: {}\n", feature.title, feature.description));
    }
    out.push_str("\nUser stories:\n");
    for story in &prd.user_stories {
        out.push_str(&format!("- As {}, I want {} so that {}.\n", story.as_a, story.want, story.so));
    }
    out.trim_end().to_string()
}

/// Turn one draft into an assigned, validated task.
pub fn finalize_draft(draft: TaskDraft, role: Role, assigned_to: &str) -> RoleTask {
    let parsed = draft.complexity.as_deref().and_then(Complexity::parse);
    let complexity = match (parsed, draft.complexity.as_deref()) {
        (Some(c), _) => c.as_str().to_string(),
        (None, Some(raw)) if !raw.is_empty() => raw.to_lowercase(),
        _ => "unspecified".to_string(),
    };
    RoleTask {
        estimated_hours: validate_hours(role, parsed, draft.estimated_hours),
        title: draft.title,
        description: draft.description,
        assigned_to: assigned_to.to_string(),
        role,
        complexity,
        activity: role.activity().to_string(),
    }
}

/// Deal drafts round-robin: draft `i` goes to `personnel[i % k]`.
///
/// At most [`TASKS_PER_ROLE`] drafts are kept. An empty roster yields no tasks.
pub fn distribute(drafts: Vec<TaskDraft>, role: Role, personnel: &[String]) -> Vec<RoleTask> {
    if personnel.is_empty() {
        return Vec::new();
    }
    drafts
        .into_iter()
        .take(TASKS_PER_ROLE)
        .enumerate()
        .map(|(i, draft)| finalize_draft(draft, role, &personnel[i % personnel.len()]))
        .collect()
}

/// Settings for an [`EstimationEngine`].
#[derive(Debug, Clone)]
pub struct EstimatorSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    pub prompts_dir: Option<PathBuf>,
    /// Specification summary shown to the engine, if one exists.
    pub context: Option<String>,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 2000,
            prompts_dir: None,
            context: None,
        }
    }
}

/// Generates tasks for one role at a time.
pub struct EstimationEngine<'a> {
    engine: &'a dyn Engine,
    settings: EstimatorSettings,
    system_template: String,
    user_template: String,
}

impl<'a> EstimationEngine<'a> {
    pub fn new(engine: &'a dyn Engine, settings: EstimatorSettings) -> Result<Self, PromptError> {
        let dir = settings.prompts_dir.as_deref();
        let system_template = prompt::load_prompt("estimate_system", dir)?;
        let user_template = prompt::load_prompt("estimate_user", dir)?;
        Ok(Self {
            engine,
            settings,
            system_template,
            user_template,
        })
    }

    fn request_for(&self, role: Role, corpus_label: &str) -> GenerationRequest {
        let mut vars = HashMap::new();
        vars.insert("role", role.as_str().to_string());
        vars.insert("task_count", TASKS_PER_ROLE.to_string());
        vars.insert("corpus_label", corpus_label.to_string());
        vars.insert(
            "context",
            self.settings
                .context
                .clone()
                .unwrap_or_else(|| NO_CONTEXT.to_string()),
        );
        vars.insert("guidance", role.guidance_block());

        GenerationRequest::new(
            prompt::render(&self.system_template, &vars),
            prompt::render(&self.user_template, &vars),
        )
        .with_sampling(self.settings.temperature, self.settings.max_tokens)
        .with_label(format!("tasks {}", role))
    }

    /// Ask the engine for drafts, falling back to the static table.
    pub fn drafts_for(&self, role: Role, corpus_label: &str) -> Vec<TaskDraft> {
        let result = self.engine.generate(&self.request_for(role, corpus_label));
        if !result.success {
            warn!(
                role = %role,
                error = result.error.as_deref().unwrap_or("unknown"),
                "task generation failed, using fallback tasks"
            );
            return fallback::fallback_tasks(role);
        }

        match parse_tasks(&result.output) {
            ParseOutcome::Parsed(drafts) if !drafts.is_empty() => {
                if drafts.len() > TASKS_PER_ROLE {
                    debug!(role = %role, count = drafts.len(), "truncating task drafts");
                }
                drafts
            }
            ParseOutcome::Parsed(_) => {
                warn!(role = %role, "no tasks in response, using fallback tasks");
                fallback::fallback_tasks(role)
            }
            ParseOutcome::Malformed(detail) => {
                warn!(role = %role, detail = %detail, "task response did not parse, using fallback tasks");
                fallback::fallback_tasks(role)
            }
            ParseOutcome::Empty => {
                warn!(role = %role, "empty task response, using fallback tasks");
                fallback::fallback_tasks(role)
            }
        }
    }

    /// Generate, distribute and validate the tasks for `role`.
    pub fn generate_role_tasks(&self, role: Role, personnel: &[String], corpus_label: &str) -> Vec<RoleTask> {
        if personnel.is_empty() {
            debug!(role = %role, "no personnel, skipping");
            return Vec::new();
        }
        distribute(self.drafts_for(role, corpus_label), role, personnel)
    }
}
