//! Deterministic keyword extractor used when generation fails.

use super::{ExtractionSource, FallbackReason, PartialExtraction};

const FEATURE_KEYWORDS: &[&str] = &["feature", "functionality", "capability"];
const OBJECTIVE_KEYWORDS: &[&str] = &["objective", "goal", "purpose"];
const STORY_KEYWORDS: &[&str] = &["user", "student", "teacher", "admin"];

/// Maximum entries per category.
pub const FALLBACK_CAP: usize = 5;

/// Lines shorter than this are ignored.
pub const MIN_LINE_CHARS: usize = 10;

/// Remove a leading bullet or ordinal marker (`-`, `*`, `+`, `•`, `1.`, `2)`).
pub fn strip_list_marker(line: &str) -> &str {
    let trimmed = line.trim();
    for marker in ['-', '*', '+', '•'] {
        if let Some(rest) = trimmed.strip_prefix(marker) {
            if rest.starts_with(char::is_whitespace) {
                return rest.trim_start();
            }
        }
    }

    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &trimmed[digits..];
        if let Some(after) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            if after.starts_with(char::is_whitespace) {
                return after.trim_start();
            }
        }
    }
    trimmed
}

fn matches_any(lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| lower.contains(k))
}

/// Scan `text` line by line and bucket lines by keyword.
///
/// A line may land in several buckets. Lines mentioning "chunk" are skipped.
pub fn keyword_extract(
    text: &str,
    position: usize,
    total: usize,
    reason: FallbackReason,
) -> PartialExtraction {
    let mut features = Vec::new();
    let mut objectives = Vec::new();
    let mut user_stories = Vec::new();

    for raw in text.lines() {
        let line = strip_list_marker(raw);
        if line.chars().count() < MIN_LINE_CHARS {
            continue;
        }
        let lower = line.to_lowercase();
        if lower.contains("chunk") {
            continue;
        }

        if matches_any(&lower, FEATURE_KEYWORDS) && features.len() < FALLBACK_CAP {
            features.push(line.to_string());
        }
        if matches_any(&lower, OBJECTIVE_KEYWORDS) && objectives.len() < FALLBACK_CAP {
            objectives.push(line.to_string());
        }
        if matches_any(&lower, STORY_KEYWORDS) && user_stories.len() < FALLBACK_CAP {
            user_stories.push(line.to_string());
        }
    }

    PartialExtraction {
        features,
        objectives,
        user_stories,
        overview: format!("Chunk {}/{}: keyword fallback ({})", position, total, reason.as_str()),
        source: ExtractionSource::Fallback,
        fallback_reason: Some(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_list_marker() {
        assert_eq!(strip_list_marker("  - Item one"), "Item one");
        assert_eq!(strip_list_marker("• Bullet"), "Bullet");
        assert_eq!(strip_list_marker("12. Numbered"), "Numbered");
        assert_eq!(strip_list_marker("3) Paren"), "Paren");
        assert_eq!(strip_list_marker("-dash-word"), "-dash-word");
        assert_eq!(strip_list_marker("2024 roadmap"), "2024 roadmap");
    }

    #[test]
    fn test_keyword_buckets() {
        let text = "- The main feature is online quizzes\n\
                    Our goal is faster feedback\n\
                    Students submit homework from their phones\n\
                    a user\n\
                    Unrelated sentence about lunch menus";
        let p = keyword_extract(text, 2, 3, FallbackReason::Malformed);

        assert_eq!(p.features, vec!["The main feature is online quizzes"]);
        assert_eq!(p.objectives, vec!["Our goal is faster feedback"]);
        assert_eq!(p.user_stories, vec!["Students submit homework from their phones"]);
        assert_eq!(p.source, ExtractionSource::Fallback);
        assert_eq!(p.fallback_reason, Some(FallbackReason::Malformed));
        assert!(p.overview.starts_with("Chunk 2/3"));
    }

    #[test]
    fn test_line_can_land_in_several_categories() {
        let p = keyword_extract(
            "Admin feature whose goal is audit visibility",
            1,
            1,
            FallbackReason::EngineFailure,
        );
        assert_eq!(p.features.len(), 1);
        assert_eq!(p.objectives.len(), 1);
        assert_eq!(p.user_stories.len(), 1);
    }

    #[test]
    fn test_chunk_mentions_and_caps() {
        let mut text = String::from("This chunk mentions a feature\n");
        for i in 0..8 {
            text.push_str(&format!("Feature number {} for reporting\n", i));
        }
        let p = keyword_extract(&text, 1, 1, FallbackReason::Empty);
        assert_eq!(p.features.len(), FALLBACK_CAP);
        assert_eq!(p.features[0], "Feature number 0 for reporting");
        assert!(p.objectives.is_empty());
    }
}
