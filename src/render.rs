//! PRD document rendering.
//!
//! Templates use `{{key}}` for scalars and `{{#list}}...{{/list}}` for
//! repeated sections. Inside a section, item fields shadow top-level
//! scalars. Unknown keys render as `[missing: key]`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::consolidate::ConsolidatedPrd;

const DEFAULT_TEMPLATE: &str = include_str!("../templates/prd_document.md");

/// Rendering errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),
    #[error("template does not match document data: {0}")]
    TemplateMismatch(String),
}

type Item = BTreeMap<String, String>;

/// Flattened document data: scalars plus lists of flat objects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderData {
    pub scalars: BTreeMap<String, String>,
    pub lists: BTreeMap<String, Vec<Item>>,
}

fn item<const N: usize>(pairs: [(&str, &str); N]) -> Item {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl RenderData {
    /// Flatten a PRD. String lists become objects with a single `text` field.
    pub fn from_prd(prd: &ConsolidatedPrd) -> Self {
        let mut data = Self::default();
        data.scalars.insert("projectName".into(), prd.project_name.clone());
        data.scalars.insert("generatedFrom".into(), prd.generated_from.clone());
        data.scalars.insert("date".into(), prd.date.clone());
        data.scalars.insert("overview".into(), prd.overview.clone());

        data.lists.insert(
            "objectives".into(),
            prd.objectives.iter().map(|o| item([("text", o.as_str())])).collect(),
        );
        data.lists.insert(
            "keyFeatures".into(),
            prd.key_features
                .iter()
                .map(|f| item([("title", f.title.as_str()), ("description", f.description.as_str())]))
                .collect(),
        );
        data.lists.insert(
            "userStories".into(),
            prd.user_stories
                .iter()
                .map(|s| item([("as", s.as_a.as_str()), ("want", s.want.as_str()), ("so", s.so.as_str())]))
                .collect(),
        );
        data
    }
}

/// Produces document bytes from render data.
pub trait DocumentRenderer {
    fn render(&self, data: &RenderData) -> Result<Vec<u8>, RenderError>;

    /// File extension of the produced document.
    fn extension(&self) -> &'static str;
}

/// Markdown renderer over a `{{...}}` template.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    template: String,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    /// Renderer using the embedded template.
    pub fn new() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }

    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Load a template file.
    pub fn from_path(path: &Path) -> Result<Self, RenderError> {
        fs::read_to_string(path)
            .map(Self::with_template)
            .map_err(|_| RenderError::TemplateNotFound(path.to_path_buf()))
    }

    /// Template override if given, embedded template otherwise.
    pub fn from_optional_path(path: Option<&Path>) -> Result<Self, RenderError> {
        match path {
            Some(p) => Self::from_path(p),
            None => Ok(Self::new()),
        }
    }

    /// Render straight to a string.
    pub fn render_string(&self, data: &RenderData) -> Result<String, RenderError> {
        render_scope(&self.template, None, data)
    }
}

impl DocumentRenderer for MarkdownRenderer {
    fn render(&self, data: &RenderData) -> Result<Vec<u8>, RenderError> {
        self.render_string(data).map(String::into_bytes)
    }

    fn extension(&self) -> &'static str {
        "md"
    }
}

fn strip_leading_newline(s: &str) -> &str {
    s.strip_prefix("\r\n")
        .or_else(|| s.strip_prefix('\n'))
        .unwrap_or(s)
}

fn lookup(key: &str, item: Option<&Item>, data: &RenderData) -> Result<String, RenderError> {
    if let Some(value) = item.and_then(|i| i.get(key)).or_else(|| data.scalars.get(key)) {
        return Ok(value.clone());
    }
    if data.lists.contains_key(key) {
        return Err(RenderError::TemplateMismatch(format!(
            "'{}' is a list and must be used as a section",
            key
        )));
    }
    Ok(format!("[missing: {}]", key))
}

fn render_scope(text: &str, item: Option<&Item>, data: &RenderData) -> Result<String, RenderError> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| RenderError::TemplateMismatch("unterminated tag".into()))?;
        let tag = after[..end].trim();
        rest = &after[end + 2..];

        if let Some(name) = tag.strip_prefix('#') {
            if item.is_some() {
                return Err(RenderError::TemplateMismatch(format!(
                    "nested section '{}' is not supported",
                    name
                )));
            }
            let close = format!("{{{{/{}}}}}", name);
            let close_at = rest.find(&close).ok_or_else(|| {
                RenderError::TemplateMismatch(format!("section '{}' is never closed", name))
            })?;
            let body = strip_leading_newline(&rest[..close_at]);
            rest = strip_leading_newline(&rest[close_at + close.len()..]);

            match data.lists.get(name) {
                Some(items) => {
                    for entry in items {
                        out.push_str(&render_scope(body, Some(entry), data)?);
                    }
                }
                None if data.scalars.contains_key(name) => {
                    return Err(RenderError::TemplateMismatch(format!(
                        "'{}' is a scalar, not a list",
                        name
                    )));
                }
                None => {
                    out.push_str(&format!("[missing: {}]\n", name));
                }
            }
        } else if let Some(name) = tag.strip_prefix('/') {
            return Err(RenderError::TemplateMismatch(format!(
                "close of section '{}' without an opening tag",
                name
            )));
        } else {
            out.push_str(&lookup(tag, item, data)?);
        }
    }
    out.push_str(rest);
    Ok(out)
}
