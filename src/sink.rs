//! Work item sinks.
//!
//! `MarkdownTaskSink` appends checklist lines to a tasks file:
//! - `- [ ] (#12) Build login form (frontend, Development, 6h, @dana@example.com): Description`
//!
//! Numbering continues from the highest `(#N)` already in the file.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::estimate::{Role, RoleTask};

static ITEM_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^- \[[ xX]\] \(#(\d+)\)").expect("Failed to compile item number regex")
});

const TASKS_HEADER: &str = "# Tasks\n\n";

/// A task as handed to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub title: String,
    pub description: String,
    pub role: Role,
    pub activity: String,
    pub estimated_hours: u32,
    pub assigned_to: String,
}

impl From<&RoleTask> for WorkItem {
    fn from(task: &RoleTask) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            role: task.role,
            activity: task.activity.clone(),
            estimated_hours: task.estimated_hours,
            assigned_to: task.assigned_to.clone(),
        }
    }
}

impl WorkItem {
    /// Render as a markdown checklist line with the given number.
    pub fn to_line(&self, number: u64) -> String {
        let mut line = format!(
            "- [ ] (#{}) {} ({}, {}, {}h, @{})",
            number,
            self.title.replace('\n', " "),
            self.role,
            self.activity,
            self.estimated_hours,
            self.assigned_to
        );
        let description = self.description.trim();
        if !description.is_empty() {
            line.push_str(": ");
            line.push_str(&description.replace('\n', " "));
        }
        line
    }
}

/// Sink errors.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("rejected '{0}'")]
    Rejected(String),
}

/// Destination for finished work items.
pub trait WorkItemSink: Send + Sync {
    /// Store one item, returning its id.
    fn submit(&self, item: &WorkItem) -> Result<String, SinkError>;
}

/// Highest `(#N)` number leading a checklist line in `content`, or 0.
pub fn highest_item_number(content: &str) -> u64 {
    ITEM_NUMBER
        .captures_iter(content)
        .filter_map(|c| c[1].parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}

/// Appends items to a markdown tasks file.
pub struct MarkdownTaskSink {
    path: PathBuf,
    last_number: Mutex<Option<u64>>,
}

impl MarkdownTaskSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_number: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> SinkError {
        SinkError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl WorkItemSink for MarkdownTaskSink {
    fn submit(&self, item: &WorkItem) -> Result<String, SinkError> {
        let mut last = self.last_number.lock().unwrap_or_else(|e| e.into_inner());

        let existing = match fs::read_to_string(&self.path) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(self.io_err(e)),
        };
        let current = match *last {
            Some(n) => n,
            None => existing.as_deref().map(highest_item_number).unwrap_or(0),
        };
        let number = current + 1;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
            }
        }

        let mut entry = String::new();
        match existing.as_deref() {
            None | Some("") => entry.push_str(TASKS_HEADER),
            Some(content) if !content.ends_with('\n') => entry.push('\n'),
            Some(_) => {}
        }
        entry.push_str(&item.to_line(number));
        entry.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_err(e))?;
        file.write_all(entry.as_bytes()).map_err(|e| self.io_err(e))?;

        *last = Some(number);
        Ok(format!("#{}", number))
    }
}

/// In-memory sink for dry runs and tests.
#[derive(Default)]
pub struct MemorySink {
    items: Mutex<Vec<WorkItem>>,
    fail_on: HashSet<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject any item with this title.
    pub fn failing_on(mut self, title: impl Into<String>) -> Self {
        self.fail_on.insert(title.into());
        self
    }

    /// Items accepted so far, in submission order.
    pub fn items(&self) -> Vec<WorkItem> {
        self.items.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl WorkItemSink for MemorySink {
    fn submit(&self, item: &WorkItem) -> Result<String, SinkError> {
        if self.fail_on.contains(&item.title) {
            return Err(SinkError::Rejected(item.title.clone()));
        }
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.push(item.clone());
        Ok(format!("mem-{}", items.len()))
    }
}
