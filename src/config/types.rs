use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use super::cli::CliArgs;
use super::{env, toml};
use crate::chunk::DEFAULT_MAX_CHUNK_SIZE;
use crate::pipeline::{EstimationOptions, ExtractionOptions};

/// Engine type for generation calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineType {
    /// Claude CLI engine.
    #[default]
    Claude,
    /// Codex CLI engine.
    Codex,
    /// Deterministic stub engine (no network).
    Stub,
}

impl EngineType {
    /// Parse engine type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "claude" => Some(Self::Claude),
            "codex" => Some(Self::Codex),
            "stub" => Some(Self::Stub),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Codex => "codex",
            Self::Stub => "stub",
        }
    }
}

/// Default per-call engine timeout in seconds.
pub const DEFAULT_ENGINE_TIMEOUT_SECS: u64 = 120;

/// Default pacing delay between extraction calls in milliseconds.
pub const DEFAULT_INTER_CALL_DELAY_MS: u64 = 2000;

/// Default project label for consolidated documents.
pub const DEFAULT_PROJECT_NAME: &str = "Consolidated Product Requirements";

/// Default config file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "reqforge.toml";

/// reqforge configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Engine used for generation calls.
    pub engine_type: EngineType,
    /// Force the stub engine regardless of `engine_type`.
    pub engine_stub_mode: bool,
    /// Per-call timeout in seconds (0 disables the timeout).
    pub engine_timeout_secs: u64,
    /// Sampling temperature passed with every request.
    pub engine_temperature: f32,
    /// Token budget passed with every request.
    pub engine_max_tokens: u32,
    /// Maximum chunk size in characters.
    pub extraction_max_chunk_size: usize,
    /// Cleaned chunks shorter than this skip the generation call.
    pub extraction_min_content_chars: usize,
    /// Pacing delay between extraction calls.
    pub extraction_inter_call_delay_ms: u64,
    /// Project label written into the consolidated document.
    pub consolidation_project_name: String,
    /// Deduplicate ignoring case and whitespace.
    pub consolidation_normalized_dedup: bool,
    /// Maximum work items submitted concurrently.
    pub estimation_max_concurrent_submissions: usize,
    /// Directory for prd.json / prd.md.
    pub files_output_dir: String,
    /// Directory for the generation exchange log.
    pub files_log_dir: String,
    /// Markdown task file used by the work item sink.
    pub files_tasks: String,
    /// Personnel roster file.
    pub files_roster: String,
    /// Optional prompt override directory.
    pub files_prompts_dir: Option<String>,
    /// Optional document template override.
    pub files_template: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine_type: EngineType::Claude,
            engine_stub_mode: false,
            engine_timeout_secs: DEFAULT_ENGINE_TIMEOUT_SECS,
            engine_temperature: 0.3,
            engine_max_tokens: 2000,
            extraction_max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            extraction_min_content_chars: 50,
            extraction_inter_call_delay_ms: DEFAULT_INTER_CALL_DELAY_MS,
            consolidation_project_name: DEFAULT_PROJECT_NAME.to_string(),
            consolidation_normalized_dedup: false,
            estimation_max_concurrent_submissions: 2,
            files_output_dir: "reqforge-out".to_string(),
            files_log_dir: ".reqforge/logs".to_string(),
            files_tasks: ".reqforge/tasks.md".to_string(),
            files_roster: "roster.toml".to_string(),
            files_prompts_dir: None,
            files_template: None,
        }
    }
}

impl Config {
    /// Load configuration from all sources with proper precedence.
    ///
    /// Precedence: CLI args > env vars > config file > defaults.
    pub fn load(cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(ref path) = cli_args.config {
            config = Self::load_from_file(path)?;
        } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
            config = Self::load_from_file(DEFAULT_CONFIG_FILE)?;
        }

        config.apply_env();
        config.apply_cli(cli_args);
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        toml::load_from_file(path)
    }

    /// Parse TOML content into configuration.
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        toml::parse_toml(content)
    }

    /// Apply `REQFORGE_*` environment variables.
    fn apply_env(&mut self) {
        env::apply_env(self, |key| std::env::var(key).ok());
    }

    /// Apply CLI arguments.
    pub(super) fn apply_cli(&mut self, args: &CliArgs) {
        if let Some(ref engine) = args.engine {
            if let Some(engine_type) = EngineType::parse(engine) {
                self.engine_type = engine_type;
            }
        }
        if args.stub {
            self.engine_stub_mode = true;
        }
        if let Some(n) = args.timeout {
            self.engine_timeout_secs = n;
        }
        if let Some(n) = args.max_chunk_size {
            self.extraction_max_chunk_size = n;
        }
        if let Some(n) = args.delay_ms {
            self.extraction_inter_call_delay_ms = n;
        }
        if let Some(ref dir) = args.log_dir {
            self.files_log_dir = dir.clone();
        }
        if let Some(ref dir) = args.output_dir {
            self.files_output_dir = dir.clone();
        }
    }

    /// Get the effective engine type (considering stub mode).
    pub fn effective_engine(&self) -> EngineType {
        if self.engine_stub_mode {
            EngineType::Stub
        } else {
            self.engine_type
        }
    }

    /// Prompt override directory, if configured.
    pub fn prompts_dir(&self) -> Option<PathBuf> {
        self.files_prompts_dir.as_ref().map(PathBuf::from)
    }

    /// Options for the extraction pipeline.
    pub fn extraction_options(&self) -> ExtractionOptions {
        ExtractionOptions {
            max_chunk_size: self.extraction_max_chunk_size,
            min_content_chars: self.extraction_min_content_chars,
            inter_call_delay: Duration::from_millis(self.extraction_inter_call_delay_ms),
            temperature: self.engine_temperature,
            max_tokens: self.engine_max_tokens,
            project_name: self.consolidation_project_name.clone(),
            normalized_dedup: self.consolidation_normalized_dedup,
            prompts_dir: self.prompts_dir(),
        }
    }

    /// Options for the estimation pipeline.
    pub fn estimation_options(&self) -> EstimationOptions {
        EstimationOptions {
            max_concurrent_submissions: self.estimation_max_concurrent_submissions,
            temperature: self.engine_temperature,
            max_tokens: self.engine_max_tokens,
            prompts_dir: self.prompts_dir(),
            context: None,
        }
    }

    /// Generate default reqforge.toml content.
    pub fn default_toml() -> String {
        format!(
            r#"# reqforge configuration

[engine]
type = "claude"    # claude | codex | stub
stub_mode = false
timeout = {timeout}      # seconds per generation call (0 = no timeout)
temperature = 0.3
max_tokens = 2000

[extraction]
max_chunk_size = {chunk}
min_content_chars = 50
inter_call_delay_ms = {delay}

[consolidation]
project_name = "{project}"
normalized_dedup = false

[estimation]
max_concurrent_submissions = 2

[files]
output_dir = "reqforge-out"
log_dir = ".reqforge/logs"
tasks_file = ".reqforge/tasks.md"
roster = "roster.toml"
# prompts_dir = ".reqforge/prompts"
# template = ".reqforge/prd_document.md"
"#,
            timeout = DEFAULT_ENGINE_TIMEOUT_SECS,
            chunk = DEFAULT_MAX_CHUNK_SIZE,
            delay = DEFAULT_INTER_CALL_DELAY_MS,
            project = DEFAULT_PROJECT_NAME,
        )
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading config file.
    #[error("config I/O error: {0}")]
    Io(String),
    /// Parse error in config file.
    #[error("config parse error: {0}")]
    Parse(String),
}
