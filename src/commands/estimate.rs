use std::fs;
use std::path::{Path, PathBuf};

use reqforge::color::{self, emoji};
use reqforge::config::Config;
use reqforge::consolidate::ConsolidatedPrd;
use reqforge::engine::Engine;
use reqforge::estimate::prd_context;
use reqforge::pipeline::{self, EstimationReport};
use reqforge::roster;
use reqforge::shutdown::ShutdownSignal;
use reqforge::sink::{MarkdownTaskSink, MemorySink, WorkItemSink};

use super::build_engine;
use super::extract::PRD_JSON;

/// What the tasks are generated from.
pub struct EstimationSource {
    pub corpus_label: String,
    pub context: Option<String>,
}

impl EstimationSource {
    pub fn from_prd(prd: &ConsolidatedPrd) -> Self {
        Self {
            corpus_label: prd.generated_from.clone(),
            context: Some(prd_context(prd)),
        }
    }
}

fn load_prd(path: &Path) -> Result<ConsolidatedPrd, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("invalid document {}: {}", path.display(), e))
}

/// Generate role tasks from a document (or bare label) and submit them.
pub fn cmd_estimate(
    config: &Config,
    prd: Option<&str>,
    label: Option<&str>,
    roster_path: Option<&str>,
    dry_run: bool,
) -> Result<(), String> {
    let default_prd = PathBuf::from(&config.files_output_dir).join(PRD_JSON);
    let source = match (prd, label) {
        (Some(path), _) => EstimationSource::from_prd(&load_prd(Path::new(path))?),
        (None, Some(label)) => EstimationSource {
            corpus_label: label.to_string(),
            context: None,
        },
        (None, None) if default_prd.exists() => EstimationSource::from_prd(&load_prd(&default_prd)?),
        (None, None) => {
            return Err(format!(
                "no document at {}; run 'reqforge extract' first or pass --prd/--label",
                default_prd.display()
            ))
        }
    };

    let engine = build_engine(config, "estimate");
    estimate_and_submit(config, engine.as_ref(), source, roster_path, dry_run).map(|_| ())
}

/// Run the estimation pipeline against the configured sink.
pub fn estimate_and_submit(
    config: &Config,
    engine: &dyn Engine,
    source: EstimationSource,
    roster_path: Option<&str>,
    dry_run: bool,
) -> Result<EstimationReport, String> {
    let roster_path = roster_path.unwrap_or(&config.files_roster);
    let personnel = roster::load_roster(Path::new(roster_path)).map_err(|e| e.to_string())?;

    let mut options = config.estimation_options();
    options.context = source.context;

    println!(
        "{} {} tasks for {} people from {}...",
        emoji::TEAM,
        color::label("Estimating"),
        color::number(personnel.len()),
        color::info(&source.corpus_label)
    );

    let signal = ShutdownSignal::global();
    let memory = MemorySink::new();
    let markdown = MarkdownTaskSink::new(&config.files_tasks);
    let sink: &dyn WorkItemSink = if dry_run { &memory } else { &markdown };

    let report = pipeline::run_estimation_pipeline(
        engine,
        sink,
        &source.corpus_label,
        &personnel,
        &options,
        &signal,
    )
    .map_err(|e| e.to_string())?;

    print_report(&report);
    if report.aborted {
        return Err(format!(
            "estimation aborted after {} of {} role(s); {} task(s) already submitted",
            report.counts.roles_completed, report.counts.roles, report.counts.created
        ));
    }
    if dry_run {
        println!("  {} dry run, nothing written", emoji::TASK);
    } else {
        println!(
            "  {} {}",
            emoji::FOLDER,
            color::path(&markdown.path().display().to_string())
        );
    }
    Ok(report)
}

fn print_report(report: &EstimationReport) {
    for item in &report.created {
        println!(
            "  {} [{}] {} ({}h, {})",
            item.sink_id,
            color::role(item.role),
            item.title,
            item.estimated_hours,
            item.assigned_to
        );
    }
    for failed in &report.failed {
        println!(
            "  {} [{}] {}: {}",
            emoji::CROSS,
            color::role(failed.role),
            failed.title,
            color::error(&failed.error)
        );
    }
    let hours: u32 = report.created.iter().map(|c| c.estimated_hours).sum();
    println!(
        "{} {} {} task(s), {} failed, {} hours total",
        emoji::CHECK,
        color::success("Created"),
        color::number(report.counts.created),
        report.counts.failed,
        color::number(hours)
    );
}
