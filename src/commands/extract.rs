use std::fs;
use std::path::{Path, PathBuf};

use reqforge::color::{self, emoji};
use reqforge::config::Config;
use reqforge::engine::Engine;
use reqforge::pipeline::{self, ExtractionOutcome};
use reqforge::render::{DocumentRenderer, MarkdownRenderer, RenderData};
use reqforge::shutdown::ShutdownSignal;

use super::{build_engine, ensure_parent_dir, load_documents};

/// File name of the JSON document written by extraction.
pub const PRD_JSON: &str = "prd.json";

/// Extract a consolidated document from the given files.
pub fn cmd_extract(config: &Config, files: &[String]) -> Result<(), String> {
    let engine = build_engine(config, "extract");
    extract_to_output(config, engine.as_ref(), files).map(|_| ())
}

/// Run extraction and write `prd.json` plus the rendered document.
pub fn extract_to_output(
    config: &Config,
    engine: &dyn Engine,
    files: &[String],
) -> Result<ExtractionOutcome, String> {
    // Fail on a bad template before spending any engine calls.
    let template = config.files_template.as_deref().map(Path::new);
    let renderer = MarkdownRenderer::from_optional_path(template).map_err(|e| e.to_string())?;

    let documents = load_documents(files)?;
    println!(
        "{} {} {} document(s) with {} engine...",
        emoji::ROCKET,
        color::label("Extracting"),
        color::number(documents.len()),
        color::info(config.effective_engine().as_str())
    );

    let outcome = pipeline::run_extraction_pipeline(
        engine,
        &documents,
        &config.extraction_options(),
        &ShutdownSignal::global(),
    )
    .map_err(|e| e.to_string())?;

    for (i, partial) in outcome.partials.iter().enumerate() {
        println!(
            "  chunk {}/{}: {} ({} features, {} objectives, {} stories)",
            i + 1,
            outcome.partials.len(),
            color::source(partial.source),
            partial.features.len(),
            partial.objectives.len(),
            partial.user_stories.len()
        );
    }

    let out_dir = PathBuf::from(&config.files_output_dir);
    let json_path = out_dir.join(PRD_JSON);
    ensure_parent_dir(&json_path)?;
    let json = serde_json::to_string_pretty(&outcome.prd)
        .map_err(|e| format!("failed to serialize document: {}", e))?;
    fs::write(&json_path, json)
        .map_err(|e| format!("failed to write {}: {}", json_path.display(), e))?;

    let doc_path = out_dir.join(format!("prd.{}", renderer.extension()));
    let bytes = renderer
        .render(&RenderData::from_prd(&outcome.prd))
        .map_err(|e| e.to_string())?;
    fs::write(&doc_path, bytes)
        .map_err(|e| format!("failed to write {}: {}", doc_path.display(), e))?;

    let stats = &outcome.stats;
    println!(
        "{} {} {} chunk(s): {} generated, {} fallback, {} minimal in {:.1}s",
        emoji::CHECK,
        color::success("Extracted"),
        color::number(stats.chunks_total),
        stats.generated,
        stats.fallback,
        stats.minimal,
        stats.elapsed.as_secs_f64()
    );
    println!(
        "  {} objectives, {} key features, {} user stories",
        outcome.prd.objectives.len(),
        outcome.prd.key_features.len(),
        outcome.prd.user_stories.len()
    );
    println!("  {} {}", emoji::FOLDER, color::path(&json_path.display().to_string()));
    println!("  {} {}", emoji::FOLDER, color::path(&doc_path.display().to_string()));

    Ok(outcome)
}
