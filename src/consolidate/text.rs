//! Text shaping for consolidated entries.

use once_cell::sync::Lazy;
use regex::Regex;

use super::defaults::{BOILERPLATE_PREFIXES, FEATURE_DESCRIPTIONS, GENERIC_CLOSING, GENERIC_ROLE};
use super::UserStory;

/// Stories that do not parse are truncated to this many characters.
pub const STORY_TRUNCATE_CHARS: usize = 120;

static AS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bas\s+(an?)\s+([^,]+?)\s*,").expect("Failed to compile story role regex")
});

static WANT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bi\s+want\s+((?:to\s+)?.+?)(?:,?\s+so\s+(?:that\s+)?|[.!]?\s*$)")
        .expect("Failed to compile story want regex")
});

static SO_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bso\s+(?:that\s+)?(.+?)[.!]?\s*$").expect("Failed to compile story benefit regex")
});

/// Uppercase the first character.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Strip boilerplate prefixes and title-case each word.
///
/// Only the first letter of each word changes, so acronyms survive.
pub fn title_clean(feature: &str) -> String {
    let mut text = feature.trim();
    let lower = text.to_lowercase();
    for prefix in BOILERPLATE_PREFIXES {
        if lower.starts_with(prefix) && text.is_char_boundary(prefix.len()) {
            text = &text[prefix.len()..];
            break;
        }
    }
    text.trim()
        .trim_end_matches(|c: char| c == '.' || c == ';' || c == ':')
        .split_whitespace()
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Describe a feature from the keyword table, or with a templated sentence.
pub fn describe(feature: &str) -> String {
    let lower = feature.to_lowercase();
    FEATURE_DESCRIPTIONS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, description)| description.to_string())
        .unwrap_or_else(|| {
            format!(
                "Advanced {} functionality that supports the workflows described in the requirements.",
                lower.trim().trim_end_matches('.')
            )
        })
}

/// Cut `s` to at most `max` characters, marking the cut with "...".
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

/// Split a story into `{as, want, so}`.
///
/// Falls back to a generic role and closing when the role and want clauses
/// do not both match.
pub fn parse_story(story: &str) -> UserStory {
    let story = story.trim();
    let role = AS_PATTERN.captures(story);
    let want = WANT_PATTERN.captures(story);

    match (role, want) {
        (Some(role), Some(want)) => {
            let article = role[1].to_lowercase();
            let so = SO_PATTERN
                .captures(&story[want.get(0).map_or(0, |m| m.start())..])
                .map(|c| c[1].trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| GENERIC_CLOSING.to_string());
            UserStory {
                as_a: format!("{} {}", article, role[2].trim()),
                want: want[1].trim().trim_end_matches(',').to_string(),
                so,
            }
        }
        _ => UserStory {
            as_a: GENERIC_ROLE.to_string(),
            want: truncate_chars(story, STORY_TRUNCATE_CHARS),
            so: GENERIC_CLOSING.to_string(),
        },
    }
}
