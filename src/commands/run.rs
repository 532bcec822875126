use reqforge::config::Config;

use super::build_engine;
use super::estimate::{estimate_and_submit, EstimationSource};
use super::extract::extract_to_output;

/// Extract a document, then estimate tasks from it with the same engine.
pub fn cmd_run(
    config: &Config,
    files: &[String],
    roster_path: Option<&str>,
    dry_run: bool,
) -> Result<(), String> {
    let engine = build_engine(config, "run");
    let outcome = extract_to_output(config, engine.as_ref(), files)?;
    println!();
    estimate_and_submit(
        config,
        engine.as_ref(),
        EstimationSource::from_prd(&outcome.prd),
        roster_path,
        dry_run,
    )
    .map(|_| ())
}
