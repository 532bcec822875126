use std::path::PathBuf;

use reqforge::config::Config;
use reqforge::prompt;

/// Prompt directory used when `files.prompts_dir` is not set.
const DEFAULT_PROMPTS_DIR: &str = ".reqforge/prompts";

/// Copy embedded prompts out for customization.
pub fn cmd_customize_prompts(config: &Config) -> Result<(), String> {
    let target_dir = config
        .prompts_dir()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PROMPTS_DIR));

    println!("Copying embedded prompts to {}...", target_dir.display());
    let created = prompt::copy_prompts_to(&target_dir).map_err(|e| e.to_string())?;

    if created.is_empty() {
        println!("All prompt files already exist. Remove one to reset it to the default.");
    } else {
        println!("\nCreated {} prompt file(s):", created.len());
        for path in &created {
            println!("  {}", path.display());
        }
    }

    if config.files_prompts_dir.is_none() {
        println!("\nSet files.prompts_dir = \"{}\" in reqforge.toml (or REQFORGE_PROMPTS_DIR) to use them.", DEFAULT_PROMPTS_DIR);
    }
    println!("Available variables:");
    println!("  extract_user.md:    {{{{context_label}}}}, {{{{position}}}}, {{{{total}}}}, {{{{content}}}}");
    println!("  estimate_system.md: {{{{role}}}}, {{{{task_count}}}}");
    println!("  estimate_user.md:   {{{{corpus_label}}}}, {{{{role}}}}, {{{{context}}}}, {{{{guidance}}}}, {{{{task_count}}}}");

    Ok(())
}
