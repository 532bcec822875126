use serde_json::json;

use crate::config::EngineType;

use super::{Engine, EngineResult, GenerationRequest};

const MATERIAL_START: &str = "--- BEGIN MATERIAL ---";
const MATERIAL_END: &str = "--- END MATERIAL ---";
const STUB_LIST_CAP: usize = 5;

const STUB_TASKS: &[(&str, &str, u32)] = &[
    ("Plan {role} work breakdown", "simple", 4),
    ("Build core {role} deliverables", "medium", 10),
    ("Integrate {role} deliverables end to end", "complex", 20),
    ("Harden {role} edge cases", "medium", 8),
    ("Document {role} handover notes", "simple", 3),
];

/// Stub engine for tests and offline runs.
///
/// Answers deterministically without network calls. Extraction requests get
/// a JSON object built from the material lines; task requests get five
/// role-labelled drafts.
#[derive(Debug, Default)]
pub struct StubEngine;

impl StubEngine {
    /// Create a new stub engine.
    pub fn new() -> Self {
        Self
    }

    fn extraction_response(user_prompt: &str) -> String {
        let material = match (user_prompt.find(MATERIAL_START), user_prompt.rfind(MATERIAL_END)) {
            (Some(start), Some(end)) if end > start => &user_prompt[start + MATERIAL_START.len()..end],
            _ => user_prompt,
        };

        let mut features = Vec::new();
        let mut objectives = Vec::new();
        let mut stories = Vec::new();
        let mut overview = String::new();

        for raw in material.lines() {
            let line = raw
                .trim()
                .trim_start_matches(|c: char| c == '-' || c == '*' || c == '#')
                .trim();
            if line.chars().count() < 10 {
                continue;
            }
            if overview.is_empty() && line.chars().count() > 20 {
                overview = format!("This material describes {}", line.trim_end_matches('.'));
            }
            let lower = line.to_lowercase();
            let bucket = if lower.starts_with("as a ") || lower.starts_with("as an ") {
                &mut stories
            } else if ["goal", "objective", "aim", "should"].iter().any(|k| lower.contains(k)) {
                &mut objectives
            } else {
                &mut features
            };
            if bucket.len() < STUB_LIST_CAP {
                bucket.push(line.to_string());
            }
        }

        json!({
            "features": features,
            "objectives": objectives,
            "userStories": stories,
            "overview": overview,
        })
        .to_string()
    }

    fn tasks_response(user_prompt: &str) -> String {
        let role = user_prompt
            .lines()
            .find_map(|l| l.trim().strip_prefix("Role:"))
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "team".to_string());

        let tasks: Vec<_> = STUB_TASKS
            .iter()
            .map(|(title, complexity, hours)| {
                let title = title.replace("{role}", &role);
                json!({
                    "title": title,
                    "description": format!("{} for the {} role.", title, role),
                    "complexity": complexity,
                    "estimatedHours": hours,
                })
            })
            .collect();

        json!({ "tasks": tasks }).to_string()
    }
}

impl Engine for StubEngine {
    fn generate(&self, request: &GenerationRequest) -> EngineResult {
        if request.system_prompt.contains("\"tasks\"") {
            EngineResult::success(Self::tasks_response(&request.user_prompt))
        } else {
            EngineResult::success(Self::extraction_response(&request.user_prompt))
        }
    }

    fn engine_type(&self) -> EngineType {
        EngineType::Stub
    }
}
