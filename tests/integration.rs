use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::Duration;

use tempfile::TempDir;

use reqforge::consolidate::defaults::{DEFAULT_FEATURES, DEFAULT_OBJECTIVES, DEFAULT_STORIES};
use reqforge::corpus::RawDocument;
use reqforge::engine::StubEngine;
use reqforge::estimate::Role;
use reqforge::extract::ExtractionSource;
use reqforge::pipeline::{
    run_estimation_pipeline, run_extraction_pipeline, EstimationOptions, ExtractionOptions,
    PipelineState,
};
use reqforge::render::{DocumentRenderer, MarkdownRenderer, RenderData};
use reqforge::roster::{parse_roster, PersonEntry};
use reqforge::shutdown::ShutdownSignal;
use reqforge::sink::{highest_item_number, MarkdownTaskSink, MemorySink};
use reqforge::testutil::ScriptedEngine;
use reqforge::PipelineError;

/// Strip ANSI escape codes from a string.
fn strip_ansi(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            // Skip until we hit a letter (which ends the escape sequence)
            while let Some(&next) = chars.peek() {
                chars.next();
                if next.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

fn run_success(cmd: &mut Command) -> Output {
    let output = cmd.output().expect("failed to run command");
    assert!(
        output.status.success(),
        "command failed\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    output
}

fn reqforge(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_reqforge"));
    cmd.current_dir(dir)
        .env_remove("REQFORGE_ENGINE_TYPE")
        .env_remove("REQFORGE_ENGINE_STUB_MODE")
        .env_remove("REQFORGE_OUTPUT_DIR")
        .env_remove("REQFORGE_LOG_DIR")
        .env_remove("REQFORGE_TASKS_FILE")
        .env_remove("REQFORGE_ROSTER");
    cmd
}

fn fast_options() -> ExtractionOptions {
    ExtractionOptions {
        inter_call_delay: Duration::ZERO,
        ..ExtractionOptions::default()
    }
}

fn person(email: &str, role: Role) -> PersonEntry {
    PersonEntry {
        email: email.to_string(),
        role,
    }
}

const VISION: &str = "# Classroom portal\n\
                      The portal gives secondary schools one place for coursework.\n\
                      - Online quiz builder with automatic marking\n\
                      - Gradebook export to spreadsheets\n\
                      Our goal is to halve the time teachers spend on grading.\n\
                      As a student, I want to see upcoming deadlines so that I can plan my week.";

const NOTES: &str = "Meeting notes from the pilot schools.\n\
                     Teachers asked for a parent messaging feature.\n\
                     The objective for term two is full adoption across all year groups.";

fn write_inputs(dir: &Path) -> (PathBuf, PathBuf) {
    let vision = dir.join("vision.md");
    let notes = dir.join("notes.txt");
    fs::write(&vision, VISION).expect("write vision");
    fs::write(&notes, NOTES).expect("write notes");
    (vision, notes)
}

const ROSTER: &str = r#"
[[personnel]]
email = "fe@example.com"
role = "frontend"

[[personnel]]
email = "qa@example.com"
role = "qa"
"#;

#[test]
fn test_extraction_with_stub_engine_renders_document() {
    let docs = vec![
        RawDocument::new("vision.md", VISION),
        RawDocument::new("notes.txt", NOTES),
    ];

    let outcome = run_extraction_pipeline(&StubEngine::new(), &docs, &fast_options(), &ShutdownSignal::new())
        .expect("extraction should succeed");

    assert_eq!(outcome.corpus_label, "vision.md, notes.txt");
    assert_eq!(outcome.stats.chunks_total, 1);
    assert_eq!(outcome.stats.generated, 1);
    assert_eq!(outcome.partials[0].source, ExtractionSource::Generated);
    assert_eq!(outcome.transitions.last().map(|t| t.to), Some(PipelineState::Done));

    let prd = &outcome.prd;
    assert_eq!(prd.generated_from, "vision.md, notes.txt");
    assert!(!prd.objectives.is_empty());
    assert!(!prd.key_features.is_empty());
    assert!(prd.user_stories.iter().any(|s| s.as_a == "a student"));

    let markdown = MarkdownRenderer::new()
        .render_string(&RenderData::from_prd(prd))
        .expect("render");
    assert!(markdown.starts_with("# Consolidated Product Requirements"));
    assert!(markdown.contains("_Generated from vision.md, notes.txt on "));
    assert!(markdown.contains("- As a student, I want to see upcoming deadlines so that I can plan my week."));
    assert!(!markdown.contains("{{"));
    assert!(!markdown.contains("[missing:"));
}

#[test]
fn test_extraction_with_scripted_response() {
    let engine = ScriptedEngine::new().respond(
        "Here is what I found:\n```json\n{\n\
         \"features\": [\"online quiz builder\", \"Online quiz builder\"],\n\
         \"objectives\": [\"cut grading time for teachers\"],\n\
         \"userStories\": [\"As a teacher, I want to build quizzes so that I save time\"],\n\
         \"overview\": \"An online learning platform for secondary schools.\"\n}\n```",
    );
    let docs = vec![RawDocument::new("vision.md", VISION)];

    let outcome = run_extraction_pipeline(&engine, &docs, &fast_options(), &ShutdownSignal::new())
        .expect("extraction should succeed");
    let prd = outcome.prd;

    assert_eq!(engine.call_count(), 1);
    assert_eq!(prd.objectives, vec!["Cut grading time for teachers".to_string()]);
    assert_eq!(prd.key_features.len(), 2, "dedup is exact by default");
    assert_eq!(prd.key_features[0].title, "Online Quiz Builder");
    assert_eq!(prd.user_stories.len(), 1);
    assert_eq!(prd.user_stories[0].as_a, "a teacher");
    assert_eq!(prd.user_stories[0].want, "to build quizzes");
    assert_eq!(prd.user_stories[0].so, "I save time");
    assert!(prd.overview.ends_with("An online learning platform for secondary schools."));
}

#[test]
fn test_normalized_dedup_merges_case_variants() {
    let engine = ScriptedEngine::new().respond(
        r#"{"features": ["online quiz builder", "Online  Quiz builder"], "objectives": [], "userStories": [], "overview": ""}"#,
    );
    let options = ExtractionOptions {
        normalized_dedup: true,
        ..fast_options()
    };

    let outcome = run_extraction_pipeline(
        &engine,
        &[RawDocument::new("vision.md", VISION)],
        &options,
        &ShutdownSignal::new(),
    )
    .expect("extraction should succeed");

    assert_eq!(outcome.prd.key_features.len(), 1);
}

#[test]
fn test_all_chunks_failing_yields_default_document() {
    let text = "The cafeteria menu changes every Monday morning at nine.\n\
                Deliveries arrive through the loading dock behind the gym.\n\
                Parking spaces near the entrance are reserved for visitors.\n\
                The library closes early on Fridays during the winter term.";
    let docs = vec![RawDocument::new("facilities.txt", text)];
    let options = ExtractionOptions {
        max_chunk_size: 120,
        min_content_chars: 20,
        ..fast_options()
    };
    let engine = ScriptedEngine::new();

    let outcome = run_extraction_pipeline(&engine, &docs, &options, &ShutdownSignal::new())
        .expect("engine failures are recovered per chunk");

    assert!(outcome.stats.chunks_total > 1);
    assert_eq!(outcome.stats.generated, 0);
    assert_eq!(outcome.stats.valid_partials, 0);
    assert!(outcome.stats.engine_failures > 0);
    assert!(outcome.consolidation.default_objectives);

    let prd = outcome.prd;
    let objectives: Vec<String> = DEFAULT_OBJECTIVES.iter().map(|s| s.to_string()).collect();
    assert_eq!(prd.objectives, objectives);
    assert_eq!(prd.key_features.len(), DEFAULT_FEATURES.len());
    assert_eq!(prd.user_stories.len(), DEFAULT_STORIES.len());
    assert_eq!(prd.generated_from, "facilities.txt");
}

#[test]
fn test_unreachable_engine_fails_before_chunking() {
    let engine = ScriptedEngine::new().unavailable("service offline");
    let err = run_extraction_pipeline(
        &engine,
        &[RawDocument::new("vision.md", VISION)],
        &fast_options(),
        &ShutdownSignal::new(),
    )
    .unwrap_err();

    assert!(matches!(err, PipelineError::GenerationUnavailable(ref r) if r == "service offline"));
    assert_eq!(engine.call_count(), 0);
}

#[test]
fn test_estimation_clamps_single_tester_estimate() {
    let engine = ScriptedEngine::new().respond(
        r#"{"tasks": [{"title": "Regression suite", "description": "Cover the quiz flows.", "complexity": "complex", "estimatedHours": 1}]}"#,
    );
    let sink = MemorySink::new();
    let personnel = vec![person("qa@example.com", Role::Tester)];

    let report = run_estimation_pipeline(
        &engine,
        &sink,
        "vision.md",
        &personnel,
        &EstimationOptions::default(),
        &ShutdownSignal::new(),
    )
    .expect("estimation");

    assert_eq!(report.counts.created, 1);
    assert_eq!(report.created[0].estimated_hours, 6);
    let items = sink.items();
    assert_eq!(items[0].activity, "Testing");
    assert_eq!(items[0].assigned_to, "qa@example.com");
}

#[test]
fn test_estimation_truncates_and_round_robins() {
    let drafts: Vec<String> = (1..=7)
        .map(|i| {
            format!(
                r#"{{"title": "Endpoint {}", "description": "Build endpoint {}.", "complexity": "medium", "estimatedHours": 10}}"#,
                i, i
            )
        })
        .collect();
    let engine = ScriptedEngine::new().respond(format!(r#"{{"tasks": [{}]}}"#, drafts.join(",")));
    let sink = MemorySink::new();
    let personnel = vec![
        person("ana@example.com", Role::Backend),
        person("ben@example.com", Role::Backend),
    ];

    let report = run_estimation_pipeline(
        &engine,
        &sink,
        "vision.md",
        &personnel,
        &EstimationOptions::default(),
        &ShutdownSignal::new(),
    )
    .expect("estimation");

    assert_eq!(report.counts.generated, 5);
    let assignees: Vec<&str> = report.created.iter().map(|c| c.assigned_to.as_str()).collect();
    assert_eq!(
        assignees,
        vec![
            "ana@example.com",
            "ben@example.com",
            "ana@example.com",
            "ben@example.com",
            "ana@example.com"
        ]
    );
    assert!(report.created.iter().all(|c| c.estimated_hours == 10));
}

#[test]
fn test_estimation_writes_markdown_task_file() {
    let temp = TempDir::new().expect("temp dir");
    let tasks_path = temp.path().join("plan").join("tasks.md");
    fs::create_dir_all(tasks_path.parent().unwrap()).unwrap();
    fs::write(&tasks_path, "# Tasks\n\n- [x] (#7) Earlier item").unwrap();

    let sink = MarkdownTaskSink::new(&tasks_path);
    let personnel = parse_roster(ROSTER).expect("roster");

    let report = run_estimation_pipeline(
        &StubEngine::new(),
        &sink,
        "vision.md",
        &personnel,
        &EstimationOptions::default(),
        &ShutdownSignal::new(),
    )
    .expect("estimation");

    assert_eq!(report.counts.roles, 2);
    assert_eq!(report.counts.created, 10);
    assert_eq!(report.counts.failed, 0);

    let content = fs::read_to_string(&tasks_path).unwrap();
    assert!(content.starts_with("# Tasks\n\n- [x] (#7) Earlier item\n"));
    assert_eq!(highest_item_number(&content), 17);
    assert!(content.contains(") Plan frontend work breakdown (frontend, Development, 4h, @fe@example.com)"));
    assert!(content.contains("@qa@example.com"));

    // Frontend tasks are submitted before tester tasks.
    let first_tester = report.created.iter().position(|c| c.role == Role::Tester).unwrap();
    assert_eq!(first_tester, 5);
    let mut ids: Vec<&str> = report.created.iter().map(|c| c.sink_id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 10);
}

#[test]
fn test_estimation_reports_rejected_submissions() {
    let sink = MemorySink::new().failing_on("Document frontend handover notes");
    let personnel = vec![person("fe@example.com", Role::Frontend)];

    let report = run_estimation_pipeline(
        &StubEngine::new(),
        &sink,
        "vision.md",
        &personnel,
        &EstimationOptions::default(),
        &ShutdownSignal::new(),
    )
    .expect("a rejected item does not fail the run");

    assert_eq!(report.counts.created, 4);
    assert_eq!(report.counts.failed, 1);
    assert_eq!(report.failed[0].title, "Document frontend handover notes");
    assert_eq!(sink.items().len(), 4);
}

#[test]
fn test_cli_init_writes_config_and_roster() {
    let temp = TempDir::new().expect("temp dir");
    let output = run_success(reqforge(temp.path()).arg("init"));
    let stdout = strip_ansi(&String::from_utf8_lossy(&output.stdout));

    assert!(stdout.contains("reqforge initialized."));
    assert!(temp.path().join("reqforge.toml").exists());
    assert!(temp.path().join("roster.toml").exists());
    assert!(temp.path().join(".reqforge/logs").is_dir());

    let roster = fs::read_to_string(temp.path().join("roster.toml")).unwrap();
    assert_eq!(parse_roster(&roster).unwrap().len(), 4);

    let again = run_success(reqforge(temp.path()).arg("init"));
    let stdout = strip_ansi(&String::from_utf8_lossy(&again.stdout));
    assert!(stdout.contains("Already exists: reqforge.toml"));
}

#[test]
fn test_cli_run_with_stub_writes_outputs() {
    let temp = TempDir::new().expect("temp dir");
    let (vision, notes) = write_inputs(temp.path());
    fs::write(temp.path().join("roster.toml"), ROSTER).unwrap();

    let output = run_success(
        reqforge(temp.path())
            .args(["--stub", "--delay-ms", "0", "run"])
            .arg(&vision)
            .arg(&notes),
    );
    let stdout = strip_ansi(&String::from_utf8_lossy(&output.stdout));
    assert!(stdout.contains("chunk 1/1: generated"), "stdout:\n{}", stdout);
    assert!(stdout.contains("Created 10 task(s), 0 failed"), "stdout:\n{}", stdout);

    let json = fs::read_to_string(temp.path().join("reqforge-out/prd.json")).expect("prd.json");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(value["generatedFrom"], "vision.md, notes.txt");
    assert!(value["keyFeatures"].as_array().map_or(false, |a| !a.is_empty()));

    let markdown = fs::read_to_string(temp.path().join("reqforge-out/prd.md")).expect("prd.md");
    assert!(markdown.contains("## Key Features"));

    let tasks = fs::read_to_string(temp.path().join(".reqforge/tasks.md")).expect("tasks.md");
    assert!(tasks.starts_with("# Tasks\n\n"));
    assert_eq!(highest_item_number(&tasks), 10);

    let log = fs::read_to_string(temp.path().join(".reqforge/logs/generation.log")).expect("log");
    assert!(log.contains("chunk 1/1"));
}

#[test]
fn test_cli_estimate_dry_run_writes_nothing() {
    let temp = TempDir::new().expect("temp dir");
    fs::write(temp.path().join("roster.toml"), ROSTER).unwrap();

    let output = run_success(reqforge(temp.path()).args([
        "--stub",
        "estimate",
        "--label",
        "pilot notes",
        "--dry-run",
    ]));
    let stdout = strip_ansi(&String::from_utf8_lossy(&output.stdout));

    assert!(stdout.contains("dry run, nothing written"));
    assert!(stdout.contains("mem-1"));
    assert!(!temp.path().join(".reqforge/tasks.md").exists());
}

#[test]
fn test_cli_estimate_without_document_fails() {
    let temp = TempDir::new().expect("temp dir");
    let output = reqforge(temp.path())
        .args(["--stub", "estimate"])
        .output()
        .expect("run reqforge");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("run 'reqforge extract' first"), "stderr:\n{}", stderr);
}

#[test]
fn test_cli_extract_requires_files() {
    let temp = TempDir::new().expect("temp dir");
    let output = reqforge(temp.path())
        .arg("extract")
        .output()
        .expect("run reqforge");

    assert_eq!(output.status.code(), Some(2));
}
