use std::collections::HashMap;
use std::time::Duration;

use super::env::apply_env;
use super::*;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_engine_type_parse() {
    assert_eq!(EngineType::parse("claude"), Some(EngineType::Claude));
    assert_eq!(EngineType::parse("CLAUDE"), Some(EngineType::Claude));
    assert_eq!(EngineType::parse(" codex "), Some(EngineType::Codex));
    assert_eq!(EngineType::parse("stub"), Some(EngineType::Stub));
    assert_eq!(EngineType::parse("unknown"), None);
}

#[test]
fn test_engine_type_as_str() {
    assert_eq!(EngineType::Claude.as_str(), "claude");
    assert_eq!(EngineType::Codex.as_str(), "codex");
    assert_eq!(EngineType::Stub.as_str(), "stub");
}

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.engine_type, EngineType::Claude);
    assert!(!config.engine_stub_mode);
    assert_eq!(config.engine_timeout_secs, DEFAULT_ENGINE_TIMEOUT_SECS);
    assert_eq!(config.extraction_max_chunk_size, 4000);
    assert_eq!(config.extraction_min_content_chars, 50);
    assert_eq!(config.extraction_inter_call_delay_ms, 2000);
    assert_eq!(config.consolidation_project_name, DEFAULT_PROJECT_NAME);
    assert!(!config.consolidation_normalized_dedup);
    assert_eq!(config.estimation_max_concurrent_submissions, 2);
    assert_eq!(config.files_tasks, ".reqforge/tasks.md");
    assert_eq!(config.files_prompts_dir, None);
}

#[test]
fn test_config_parse_toml() {
    let toml = r#"
[engine]
type = "codex"
stub_mode = true
timeout = 30
temperature = 0.5

[extraction]
max_chunk_size = 1200
inter_call_delay_ms = 0

[consolidation]
project_name = "Campus Portal"
normalized_dedup = true

[estimation]
max_concurrent_submissions = 4

[files]
tasks_file = "TASKS.md"
log_dir = "logs"
prompts_dir = "my-prompts"
"#;
    let config = Config::parse_toml(toml).unwrap();
    assert_eq!(config.engine_type, EngineType::Codex);
    assert!(config.engine_stub_mode);
    assert_eq!(config.engine_timeout_secs, 30);
    assert!((config.engine_temperature - 0.5).abs() < f32::EPSILON);
    assert_eq!(config.extraction_max_chunk_size, 1200);
    assert_eq!(config.extraction_inter_call_delay_ms, 0);
    assert_eq!(config.consolidation_project_name, "Campus Portal");
    assert!(config.consolidation_normalized_dedup);
    assert_eq!(config.estimation_max_concurrent_submissions, 4);
    assert_eq!(config.files_tasks, "TASKS.md");
    assert_eq!(config.files_log_dir, "logs");
    assert_eq!(config.files_prompts_dir.as_deref(), Some("my-prompts"));
    // Untouched sections keep defaults
    assert_eq!(config.files_roster, "roster.toml");
}

#[test]
fn test_config_parse_toml_rejects_bad_values() {
    assert!(matches!(
        Config::parse_toml("[engine]\ntype = \"gpt\"\n"),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        Config::parse_toml("[extraction]\nmax_chunk_size = 0\n"),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        Config::parse_toml("[engine]\nunknown_key = 1\n"),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        Config::parse_toml("not = [valid"),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_load_from_missing_file() {
    let err = Config::load_from_file("/nonexistent/reqforge.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_config_effective_engine() {
    let mut config = Config::default();
    assert_eq!(config.effective_engine(), EngineType::Claude);

    config.engine_stub_mode = true;
    assert_eq!(config.effective_engine(), EngineType::Stub);
}

#[test]
fn test_apply_env() {
    let vars: HashMap<&str, &str> = [
        ("REQFORGE_ENGINE_TYPE", "stub"),
        ("REQFORGE_ENGINE_TIMEOUT", "45"),
        ("REQFORGE_MAX_CHUNK_SIZE", "800"),
        ("REQFORGE_INTER_CALL_DELAY_MS", "10"),
        ("REQFORGE_TASKS_FILE", "env-tasks.md"),
        ("REQFORGE_PROMPTS_DIR", "env-prompts"),
    ]
    .into_iter()
    .collect();

    let mut config = Config::default();
    apply_env(&mut config, |k| vars.get(k).map(|v| v.to_string()));

    assert_eq!(config.engine_type, EngineType::Stub);
    assert_eq!(config.engine_timeout_secs, 45);
    assert_eq!(config.extraction_max_chunk_size, 800);
    assert_eq!(config.extraction_inter_call_delay_ms, 10);
    assert_eq!(config.files_tasks, "env-tasks.md");
    assert_eq!(config.files_prompts_dir.as_deref(), Some("env-prompts"));
}

#[test]
fn test_apply_env_ignores_invalid_values() {
    let mut config = Config::default();
    apply_env(&mut config, |k| match k {
        "REQFORGE_ENGINE_TYPE" => Some("bogus".to_string()),
        "REQFORGE_MAX_CHUNK_SIZE" => Some("0".to_string()),
        "REQFORGE_ENGINE_TIMEOUT" => Some("soon".to_string()),
        _ => None,
    });
    assert_eq!(config, Config::default());
}

#[test]
fn test_parse_args_extract() {
    let cli = parse_args(args(&["reqforge", "extract", "a.md", "b.txt"])).unwrap();
    assert_eq!(
        cli.command,
        Some(Command::Extract {
            files: vec!["a.md".to_string(), "b.txt".to_string()],
        })
    );
}

#[test]
fn test_parse_args_extract_requires_files() {
    assert!(parse_args(args(&["reqforge", "extract"])).is_err());
}

#[test]
fn test_parse_args_global_flags_after_subcommand() {
    let cli = parse_args(args(&[
        "reqforge",
        "estimate",
        "--dry-run",
        "--stub",
        "--delay-ms",
        "0",
        "--roster",
        "team.toml",
    ]))
    .unwrap();
    assert!(cli.stub);
    assert_eq!(cli.delay_ms, Some(0));
    assert_eq!(
        cli.command,
        Some(Command::Estimate {
            prd: None,
            label: None,
            roster: Some("team.toml".to_string()),
            dry_run: true,
        })
    );
}

#[test]
fn test_parse_args_customize_prompts() {
    let cli = parse_args(args(&["reqforge", "customize-prompts"])).unwrap();
    assert_eq!(cli.command, Some(Command::CustomizePrompts));
}

#[test]
fn test_parse_args_unknown_command() {
    assert!(parse_args(args(&["reqforge", "deploy"])).is_err());
}

#[test]
fn test_apply_cli_precedence() {
    let cli = parse_args(args(&[
        "reqforge",
        "--engine",
        "codex",
        "--timeout",
        "9",
        "--max-chunk-size",
        "300",
        "--output-dir",
        "out",
        "init",
    ]))
    .unwrap();

    let mut config = Config::parse_toml("[engine]\ntype = \"claude\"\ntimeout = 60\n").unwrap();
    config.apply_cli(&cli);

    assert_eq!(config.engine_type, EngineType::Codex);
    assert_eq!(config.engine_timeout_secs, 9);
    assert_eq!(config.extraction_max_chunk_size, 300);
    assert_eq!(config.files_output_dir, "out");
}

#[test]
fn test_extraction_options_from_config() {
    let mut config = Config::default();
    config.extraction_inter_call_delay_ms = 250;
    config.files_prompts_dir = Some("p".to_string());

    let opts = config.extraction_options();
    assert_eq!(opts.inter_call_delay, Duration::from_millis(250));
    assert_eq!(opts.max_chunk_size, 4000);
    assert_eq!(opts.prompts_dir, Some(std::path::PathBuf::from("p")));
}

#[test]
fn test_default_toml_round_trips() {
    let toml = Config::default_toml();
    assert!(toml.contains("max_chunk_size = 4000"));
    assert!(toml.contains("inter_call_delay_ms = 2000"));
    let parsed = Config::parse_toml(&toml).unwrap();
    assert_eq!(parsed, Config::default());
}

#[test]
fn test_load_reads_config_from_cwd() {
    crate::testutil::with_temp_cwd(|| {
        std::fs::write(
            DEFAULT_CONFIG_FILE,
            "[engine]\ntimeout = 60\n\n[consolidation]\nproject_name = \"Campus Portal\"\n",
        )
        .unwrap();

        let cli = parse_args(args(&["reqforge", "--timeout", "9", "init"])).unwrap();
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.consolidation_project_name, "Campus Portal");
        assert_eq!(config.engine_timeout_secs, 9);
    });
}

#[test]
fn test_load_without_file_uses_defaults() {
    crate::testutil::with_temp_cwd(|| {
        let cli = parse_args(args(&["reqforge", "init"])).unwrap();
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.files_roster, "roster.toml");
    });
}
