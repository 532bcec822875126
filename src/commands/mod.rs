pub mod estimate;
pub mod extract;
pub mod init;
pub mod misc;
pub mod run;

pub use estimate::cmd_estimate;
pub use extract::cmd_extract;
pub use init::cmd_init;
pub use misc::cmd_customize_prompts;
pub use run::cmd_run;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use reqforge::config::Config;
use reqforge::corpus::RawDocument;
use reqforge::engine::{self, Engine, RecordingEngine};
use reqforge::log::ExchangeLogger;

/// Create the configured engine, recording every exchange to the log dir.
pub fn build_engine(config: &Config, run: &str) -> Arc<dyn Engine> {
    let inner = engine::create_engine(config.effective_engine(), config.engine_timeout_secs);
    let logger = Arc::new(ExchangeLogger::new(Path::new(&config.files_log_dir)));
    if let Err(e) = logger.log_run_start(run) {
        tracing::warn!(path = %logger.path.display(), error = %e, "cannot write exchange log");
    }
    Arc::new(RecordingEngine::new(inner, logger))
}

/// Read every input file, failing on the first unreadable one.
pub fn load_documents(files: &[String]) -> Result<Vec<RawDocument>, String> {
    files
        .iter()
        .map(|f| RawDocument::from_path(f).map_err(|e| format!("failed to read {}: {}", f, e)))
        .collect()
}

pub fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("failed to create directory {}: {}", parent.display(), e))?;
        }
    }
    Ok(())
}
