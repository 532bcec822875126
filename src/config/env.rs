use super::types::{Config, EngineType};

/// Apply `REQFORGE_*` variables using `lookup` to read them.
pub(super) fn apply_env<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("REQFORGE_ENGINE_TYPE") {
        if let Some(engine_type) = EngineType::parse(&val) {
            config.engine_type = engine_type;
        }
    }
    if let Some(val) = lookup("REQFORGE_ENGINE_STUB_MODE") {
        config.engine_stub_mode = val == "true" || val == "1";
    }
    if let Some(val) = lookup("REQFORGE_ENGINE_TIMEOUT") {
        if let Ok(n) = val.parse() {
            config.engine_timeout_secs = n;
        }
    }
    if let Some(val) = lookup("REQFORGE_MAX_CHUNK_SIZE") {
        if let Ok(n) = val.parse::<usize>() {
            if n > 0 {
                config.extraction_max_chunk_size = n;
            }
        }
    }
    if let Some(val) = lookup("REQFORGE_INTER_CALL_DELAY_MS") {
        if let Ok(n) = val.parse() {
            config.extraction_inter_call_delay_ms = n;
        }
    }
    if let Some(val) = lookup("REQFORGE_OUTPUT_DIR") {
        config.files_output_dir = val;
    }
    if let Some(val) = lookup("REQFORGE_LOG_DIR") {
        config.files_log_dir = val;
    }
    if let Some(val) = lookup("REQFORGE_TASKS_FILE") {
        config.files_tasks = val;
    }
    if let Some(val) = lookup("REQFORGE_ROSTER") {
        config.files_roster = val;
    }
    if let Some(val) = lookup("REQFORGE_PROMPTS_DIR") {
        config.files_prompts_dir = Some(val);
    }
}
