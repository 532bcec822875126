//! Merge per-chunk extractions into one consolidated requirements record.
//!
//! Consolidation is a pure function of its inputs apart from the date. Every
//! list is deduplicated, filtered, capped and backed by defaults so it is
//! never empty.

use std::collections::HashSet;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DEFAULT_PROJECT_NAME;
use crate::extract::PartialExtraction;

pub mod defaults;
pub mod text;

use defaults::{
    DEFAULT_FEATURES, DEFAULT_OBJECTIVES, DEFAULT_STORIES, OVERVIEW_FRAMING, OVERVIEW_GENERIC,
};

pub const MAX_OBJECTIVES: usize = 8;
pub const MAX_FEATURES: usize = 10;
pub const MAX_STORIES: usize = 8;

/// Long-form date used in the document header.
pub const DATE_FORMAT: &str = "%B %-d, %Y";

/// A titled, described product capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFeature {
    pub title: String,
    pub description: String,
}

/// A user story split into its three clauses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStory {
    /// Role with its article, e.g. "a teacher".
    #[serde(rename = "as")]
    pub as_a: String,
    pub want: String,
    pub so: String,
}

/// The consolidated product requirements record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedPrd {
    pub project_name: String,
    pub generated_from: String,
    pub date: String,
    pub overview: String,
    pub objectives: Vec<String>,
    pub key_features: Vec<KeyFeature>,
    pub user_stories: Vec<UserStory>,
}

/// Diagnostics gathered while consolidating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidationStats {
    pub partials_total: usize,
    pub valid_partials: usize,
    pub discarded_partials: usize,
    pub overviews_used: usize,
    pub default_objectives: bool,
    pub default_features: bool,
    pub default_stories: bool,
}

/// Consolidation settings.
#[derive(Debug, Clone)]
pub struct Consolidator {
    project_name: String,
    normalized_dedup: bool,
}

impl Default for Consolidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Consolidator {
    pub fn new() -> Self {
        Self {
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            normalized_dedup: false,
        }
    }

    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = name.into();
        self
    }

    /// Compare entries ignoring case and whitespace runs when deduplicating.
    pub fn with_normalized_dedup(mut self, enabled: bool) -> Self {
        self.normalized_dedup = enabled;
        self
    }

    /// Consolidate using today's date.
    pub fn consolidate(&self, partials: &[PartialExtraction], corpus_label: &str) -> ConsolidatedPrd {
        self.consolidate_on(partials, corpus_label, Local::now().date_naive())
    }

    /// Consolidate with a fixed date.
    pub fn consolidate_on(
        &self,
        partials: &[PartialExtraction],
        corpus_label: &str,
        date: NaiveDate,
    ) -> ConsolidatedPrd {
        self.consolidate_with_stats(partials, corpus_label, date).0
    }

    /// Consolidate and report what was used.
    pub fn consolidate_with_stats(
        &self,
        partials: &[PartialExtraction],
        corpus_label: &str,
        date: NaiveDate,
    ) -> (ConsolidatedPrd, ConsolidationStats) {
        let valid: Vec<&PartialExtraction> = partials.iter().filter(|p| p.has_content()).collect();
        let mut stats = ConsolidationStats {
            partials_total: partials.len(),
            valid_partials: valid.len(),
            discarded_partials: partials.len() - valid.len(),
            ..Default::default()
        };

        let overviews: Vec<&str> = valid
            .iter()
            .map(|p| p.overview.trim())
            .filter(|o| o.chars().count() > 20 && !mentions(o, &["chunk", "failed"]))
            .collect();
        stats.overviews_used = overviews.len().min(2);
        let overview = if overviews.is_empty() {
            format!("{} {}", OVERVIEW_FRAMING, OVERVIEW_GENERIC)
        } else {
            let mut parts = vec![OVERVIEW_FRAMING];
            parts.extend(overviews.iter().take(2));
            parts.join(" ")
        };

        let objectives: Vec<String> = self
            .collect(valid.iter().flat_map(|p| p.objectives.iter()), 10)
            .into_iter()
            .map(|o| text::capitalize_first(&o))
            .take(MAX_OBJECTIVES)
            .collect();
        stats.default_objectives = objectives.is_empty();
        let objectives = if objectives.is_empty() {
            DEFAULT_OBJECTIVES.iter().map(|s| s.to_string()).collect()
        } else {
            objectives
        };

        let key_features: Vec<KeyFeature> = self
            .collect(valid.iter().flat_map(|p| p.features.iter()), 5)
            .into_iter()
            .take(MAX_FEATURES)
            .map(|f| KeyFeature {
                title: text::title_clean(&f),
                description: text::describe(&f),
            })
            .collect();
        stats.default_features = key_features.is_empty();
        let key_features = if key_features.is_empty() {
            DEFAULT_FEATURES
                .iter()
                .map(|(title, description)| KeyFeature {
                    title: title.to_string(),
                    description: description.to_string(),
                })
                .collect()
        } else {
            key_features
        };

        let user_stories: Vec<UserStory> = self
            .collect(valid.iter().flat_map(|p| p.user_stories.iter()), 10)
            .into_iter()
            .take(MAX_STORIES)
            .map(|s| text::parse_story(&s))
            .collect();
        stats.default_stories = user_stories.is_empty();
        let user_stories = if user_stories.is_empty() {
            DEFAULT_STORIES
                .iter()
                .map(|(as_a, want, so)| UserStory {
                    as_a: as_a.to_string(),
                    want: want.to_string(),
                    so: so.to_string(),
                })
                .collect()
        } else {
            user_stories
        };

        debug!(
            valid = stats.valid_partials,
            discarded = stats.discarded_partials,
            objectives = objectives.len(),
            features = key_features.len(),
            stories = user_stories.len(),
            "consolidated"
        );

        let prd = ConsolidatedPrd {
            project_name: self.project_name.clone(),
            generated_from: corpus_label.to_string(),
            date: date.format(DATE_FORMAT).to_string(),
            overview,
            objectives,
            key_features,
            user_stories,
        };
        (prd, stats)
    }

    /// Flatten, dedupe, then drop entries of `min_chars` or fewer characters
    /// and entries mentioning "chunk".
    fn collect<'a, I>(&self, entries: I, min_chars: usize) -> Vec<String>
    where
        I: Iterator<Item = &'a String>,
    {
        let mut seen = HashSet::new();
        entries
            .map(|e| e.trim())
            .filter(|e| seen.insert(self.dedup_key(e)))
            .filter(|e| e.chars().count() > min_chars && !mentions(e, &["chunk"]))
            .map(str::to_string)
            .collect()
    }

    fn dedup_key(&self, entry: &str) -> String {
        if self.normalized_dedup {
            entry
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase()
        } else {
            entry.to_string()
        }
    }
}

fn mentions(text: &str, words: &[&str]) -> bool {
    let lower = text.to_lowercase();
    words.iter().any(|w| lower.contains(w))
}
