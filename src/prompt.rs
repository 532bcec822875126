//! Prompt template loading and rendering.
//!
//! Templates are embedded in the binary and can be overridden per name by
//! placing `<name>.md` in a prompts directory. Variables are written as
//! `{{variable_name}}`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("Failed to compile placeholder regex")
});

/// Embedded prompt templates as (name, content) pairs.
const EMBEDDED_PROMPTS: &[(&str, &str)] = &[
    ("extract_system", include_str!("../prompts/extract_system.md")),
    ("extract_user", include_str!("../prompts/extract_user.md")),
    ("estimate_system", include_str!("../prompts/estimate_system.md")),
    ("estimate_user", include_str!("../prompts/estimate_user.md")),
];

/// Errors from prompt loading.
#[derive(Debug, Error)]
pub enum PromptError {
    /// No embedded or override template exists with this name.
    #[error("unknown prompt '{0}'")]
    Unknown(String),
    /// An override file exists but could not be read.
    #[error("failed to read prompt '{name}' from {path}: {source}")]
    Read {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Writing a prompt file failed.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Get the embedded template for a prompt name.
pub fn embedded(name: &str) -> Option<&'static str> {
    EMBEDDED_PROMPTS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, content)| *content)
}

/// Names of all embedded prompts.
pub fn embedded_names() -> impl Iterator<Item = &'static str> {
    EMBEDDED_PROMPTS.iter().map(|(n, _)| *n)
}

/// Load a prompt, preferring `<override_dir>/<name>.md` over the embedded copy.
pub fn load_prompt(name: &str, override_dir: Option<&Path>) -> Result<String, PromptError> {
    if let Some(dir) = override_dir {
        let path = dir.join(format!("{}.md", name));
        if path.is_file() {
            return fs::read_to_string(&path).map_err(|source| PromptError::Read {
                name: name.to_string(),
                path,
                source,
            });
        }
    }
    embedded(name)
        .map(str::to_string)
        .ok_or_else(|| PromptError::Unknown(name.to_string()))
}

/// Render a prompt template with variable substitution.
///
/// The template is scanned once, so placeholders appearing inside a
/// substituted value are kept verbatim. Unknown placeholders are left in place.
pub fn render(template: &str, vars: &HashMap<&str, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Copy every embedded prompt into `dir`, returning the created paths.
///
/// Existing files are left untouched.
pub fn copy_prompts_to(dir: &Path) -> Result<Vec<PathBuf>, PromptError> {
    fs::create_dir_all(dir).map_err(|source| PromptError::Write {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut created = Vec::new();
    for (name, content) in EMBEDDED_PROMPTS {
        let path = dir.join(format!("{}.md", name));
        if path.exists() {
            continue;
        }
        fs::write(&path, content).map_err(|source| PromptError::Write {
            path: path.clone(),
            source,
        })?;
        created.push(path);
    }
    Ok(created)
}
