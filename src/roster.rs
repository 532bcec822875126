//! Personnel roster loading and grouping.
//!
//! The roster is a TOML file of `[[personnel]]` tables:
//!
//! ```toml
//! [[personnel]]
//! email = "dana@example.com"
//! role = "backend"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::estimate::Role;

/// Example roster written by `reqforge init`.
pub const EXAMPLE_ROSTER: &str = r#"# Personnel available for task assignment.
# role: frontend | backend | fullstack | tester | devops (aliases: ui, api, full-stack, qa, ops, sre)

[[personnel]]
email = "frontend.dev@example.com"
role = "frontend"

[[personnel]]
email = "backend.dev@example.com"
role = "backend"

[[personnel]]
email = "qa.engineer@example.com"
role = "qa"

[[personnel]]
email = "ops.engineer@example.com"
role = "devops"
"#;

/// One roster entry with a recognised role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonEntry {
    pub email: String,
    pub role: Role,
}

/// Roster loading errors.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("failed to read roster {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid roster: {0}")]
    Parse(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RosterFile {
    #[serde(default)]
    personnel: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEntry {
    email: String,
    role: String,
}

/// Parse roster TOML, skipping entries with unknown roles or blank emails.
pub fn parse_roster(content: &str) -> Result<Vec<PersonEntry>, RosterError> {
    let file: RosterFile = toml::from_str(content).map_err(|e| RosterError::Parse(e.to_string()))?;
    let mut entries = Vec::new();
    for raw in file.personnel {
        let email = raw.email.trim();
        if email.is_empty() {
            warn!(role = %raw.role, "skipping roster entry without email");
            continue;
        }
        match Role::parse(&raw.role) {
            Some(role) => entries.push(PersonEntry {
                email: email.to_string(),
                role,
            }),
            None => warn!(email = %email, role = %raw.role, "skipping roster entry with unknown role"),
        }
    }
    Ok(entries)
}

/// Load a roster file from disk.
pub fn load_roster(path: &Path) -> Result<Vec<PersonEntry>, RosterError> {
    let content = fs::read_to_string(path).map_err(|source| RosterError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_roster(&content)
}

/// Group emails by role in fixed role order, omitting roles with nobody.
///
/// Within a role, roster order is preserved.
pub fn group_by_role(entries: &[PersonEntry]) -> Vec<(Role, Vec<String>)> {
    Role::ALL
        .iter()
        .filter_map(|&role| {
            let emails: Vec<String> = entries
                .iter()
                .filter(|e| e.role == role)
                .map(|e| e.email.clone())
                .collect();
            (!emails.is_empty()).then_some((role, emails))
        })
        .collect()
}
