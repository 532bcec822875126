//! Terminal color utilities using ANSI escape codes.
//!
//! Provides colored output for roles, extraction sources and status messages.

use crate::estimate::Role;
use crate::extract::ExtractionSource;

/// ANSI color codes
pub mod codes {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";

    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const MAGENTA: &str = "\x1b[35m";
    pub const CYAN: &str = "\x1b[36m";

    pub const BRIGHT_CYAN: &str = "\x1b[96m";
}

use codes::*;

/// Fixed color per role.
pub fn role_color(role: Role) -> &'static str {
    match role {
        Role::Frontend => CYAN,
        Role::Backend => MAGENTA,
        Role::Fullstack => BLUE,
        Role::Tester => YELLOW,
        Role::Devops => GREEN,
    }
}

/// Color a role name.
pub fn role(role: Role) -> String {
    format!("{}{}{}{}", BOLD, role_color(role), role, RESET)
}

/// Color an extraction source tag: generated green, fallback yellow, minimal dim.
pub fn source(source: ExtractionSource) -> String {
    let (color, text) = match source {
        ExtractionSource::Generated => (GREEN, "generated"),
        ExtractionSource::Fallback => (YELLOW, "fallback"),
        ExtractionSource::MinimalContent => (DIM, "minimal"),
    };
    format!("{}{}{}", color, text, RESET)
}

/// Color a path or file name (dim).
pub fn path(text: &str) -> String {
    format!("{}{}{}", DIM, text, RESET)
}

/// Color success messages (green).
pub fn success(text: &str) -> String {
    format!("{}{}{}", GREEN, text, RESET)
}

/// Color error messages (red).
pub fn error(text: &str) -> String {
    format!("{}{}{}", RED, text, RESET)
}

/// Color warning messages (yellow).
pub fn warning(text: &str) -> String {
    format!("{}{}{}", YELLOW, text, RESET)
}

/// Color info messages (cyan).
pub fn info(text: &str) -> String {
    format!("{}{}{}", CYAN, text, RESET)
}

/// Color a label (bold).
pub fn label(text: &str) -> String {
    format!("{}{}{}", BOLD, text, RESET)
}

/// Color a number/count (bright cyan).
pub fn number(n: impl std::fmt::Display) -> String {
    format!("{}{}{}", BRIGHT_CYAN, n, RESET)
}

/// Emoji constants for consistent usage
pub mod emoji {
    pub const ROCKET: &str = "🚀";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARNING: &str = "⚠️";
    pub const TASK: &str = "📋";
    pub const FOLDER: &str = "📁";
    pub const STOP: &str = "🛑";
    pub const TEAM: &str = "👥";
}
