use std::fs;
use std::path::Path;

use reqforge::config::{Config, DEFAULT_CONFIG_FILE};
use reqforge::roster::EXAMPLE_ROSTER;

use super::ensure_parent_dir;

/// Write a default config, an example roster and the log directory.
pub fn cmd_init(config: &Config) -> Result<(), String> {
    println!("Initializing reqforge...");

    write_if_missing(Path::new(DEFAULT_CONFIG_FILE), &Config::default_toml())?;
    write_if_missing(Path::new(&config.files_roster), EXAMPLE_ROSTER)?;

    if config.files_log_dir.is_empty() {
        return Err("log dir path is empty".to_string());
    }
    fs::create_dir_all(&config.files_log_dir)
        .map_err(|e| format!("failed to create log dir {}: {}", config.files_log_dir, e))?;
    println!("  Created log directory: {}", config.files_log_dir);

    println!("\nreqforge initialized.");
    println!("  Edit {} to list your team.", config.files_roster);
    println!("  Use 'reqforge run <files..>' to extract and estimate in one pass.");
    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<(), String> {
    if path.exists() {
        println!("  Already exists: {}", path.display());
        return Ok(());
    }
    ensure_parent_dir(path)?;
    fs::write(path, content).map_err(|e| format!("failed to create {}: {}", path.display(), e))?;
    println!("  Created {}", path.display());
    Ok(())
}
