use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::types::{Config, ConfigError, EngineType};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    engine: EngineSection,
    extraction: ExtractionSection,
    consolidation: ConsolidationSection,
    estimation: EstimationSection,
    files: FilesSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct EngineSection {
    #[serde(rename = "type")]
    engine_type: Option<String>,
    stub_mode: Option<bool>,
    timeout: Option<u64>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ExtractionSection {
    max_chunk_size: Option<usize>,
    min_content_chars: Option<usize>,
    inter_call_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConsolidationSection {
    project_name: Option<String>,
    normalized_dedup: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct EstimationSection {
    max_concurrent_submissions: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FilesSection {
    output_dir: Option<String>,
    log_dir: Option<String>,
    tasks_file: Option<String>,
    roster: Option<String>,
    prompts_dir: Option<String>,
    template: Option<String>,
}

pub(super) fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
    Config::parse_toml(&content)
}

pub(super) fn parse_toml(content: &str) -> Result<Config, ConfigError> {
    let file: FileConfig =
        ::toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    let mut config = Config::default();

    if let Some(value) = file.engine.engine_type {
        config.engine_type = EngineType::parse(&value)
            .ok_or_else(|| ConfigError::Parse(format!("invalid engine.type: {}", value)))?;
    }
    if let Some(v) = file.engine.stub_mode {
        config.engine_stub_mode = v;
    }
    if let Some(v) = file.engine.timeout {
        config.engine_timeout_secs = v;
    }
    if let Some(v) = file.engine.temperature {
        if !(0.0..=2.0).contains(&v) {
            return Err(ConfigError::Parse(format!("invalid engine.temperature: {}", v)));
        }
        config.engine_temperature = v;
    }
    if let Some(v) = file.engine.max_tokens {
        config.engine_max_tokens = v;
    }

    if let Some(v) = file.extraction.max_chunk_size {
        if v == 0 {
            return Err(ConfigError::Parse("extraction.max_chunk_size must be positive".into()));
        }
        config.extraction_max_chunk_size = v;
    }
    if let Some(v) = file.extraction.min_content_chars {
        config.extraction_min_content_chars = v;
    }
    if let Some(v) = file.extraction.inter_call_delay_ms {
        config.extraction_inter_call_delay_ms = v;
    }

    if let Some(v) = file.consolidation.project_name {
        config.consolidation_project_name = v;
    }
    if let Some(v) = file.consolidation.normalized_dedup {
        config.consolidation_normalized_dedup = v;
    }

    if let Some(v) = file.estimation.max_concurrent_submissions {
        config.estimation_max_concurrent_submissions = v.max(1);
    }

    if let Some(v) = file.files.output_dir {
        config.files_output_dir = v;
    }
    if let Some(v) = file.files.log_dir {
        config.files_log_dir = v;
    }
    if let Some(v) = file.files.tasks_file {
        config.files_tasks = v;
    }
    if let Some(v) = file.files.roster {
        config.files_roster = v;
    }
    config.files_prompts_dir = file.files.prompts_dir.or(config.files_prompts_dir);
    config.files_template = file.files.template.or(config.files_template);

    Ok(config)
}
