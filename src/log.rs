//! Logging: tracing subscriber setup and the generation exchange log.
//!
//! The exchange log is a plain-text file with automatic rotation when it
//! exceeds a configurable line limit. Every request sent to the generation
//! service and every raw response is appended there for later inspection.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use tracing_subscriber::EnvFilter;

/// Default maximum number of lines before rotation.
pub const DEFAULT_MAX_LINES: usize = 1000;

/// File name of the exchange log inside the log directory.
pub const EXCHANGE_LOG_FILE: &str = "generation.log";

/// Initialise the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbose` selects `debug` over `info`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "reqforge=debug" } else { "reqforge=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

/// Appends generation exchanges to a rotating log file.
pub struct ExchangeLogger {
    /// Path to the log file.
    pub path: PathBuf,
    /// Maximum lines before rotation.
    pub max_lines: usize,
    write_lock: Mutex<()>,
}

impl ExchangeLogger {
    /// Create a logger writing to `<log_dir>/generation.log`.
    pub fn new(log_dir: &Path) -> Self {
        Self {
            path: log_dir.join(EXCHANGE_LOG_FILE),
            max_lines: DEFAULT_MAX_LINES,
            write_lock: Mutex::new(()),
        }
    }

    /// Create a logger with a custom max lines setting.
    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines;
        self
    }

    /// Write a log entry.
    ///
    /// Format: `YYYY-MM-DD HH:MM:SS | <label> | <message>`. Multi-line
    /// messages are written one prefixed line per message line.
    pub fn log(&self, label: &str, message: &str) -> io::Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.ensure_dir()?;

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let mut entry = String::new();
        for line in message.lines() {
            entry.push_str(&format!("{} | {} | {}\n", timestamp, label, line));
        }
        if entry.is_empty() {
            entry = format!("{} | {} | \n", timestamp, label);
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(entry.as_bytes())?;
        file.flush()?;

        self.rotate_if_needed()
    }

    /// Write a separator marking the start of a pipeline run.
    pub fn log_run_start(&self, run: &str) -> io::Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.ensure_dir()?;

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let separator = format!(
            "\n======================================================================\n\
             === {} - started at {} ===\n\
             ======================================================================\n\n",
            run, timestamp
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(separator.as_bytes())?;
        file.flush()
    }

    /// Read the last N lines from the log file.
    pub fn read_recent(&self, n: usize) -> io::Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.path)?;
        let all: Vec<String> = BufReader::new(file).lines().collect::<io::Result<_>>()?;
        let start = all.len().saturating_sub(n);
        Ok(all[start..].to_vec())
    }

    fn ensure_dir(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn rotate_if_needed(&self) -> io::Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        if count_lines(&self.path)? <= self.max_lines {
            return Ok(());
        }
        rotate_log(&self.path)
    }
}

/// Count lines in a file.
pub fn count_lines(path: &Path) -> io::Result<usize> {
    let file = File::open(path)?;
    Ok(BufReader::new(file).lines().count())
}

/// Rotate a log file.
///
/// Moves the current file to a timestamped `.bak` and starts an empty one.
pub fn rotate_log(path: &Path) -> io::Result<()> {
    if !path.exists() {
        return Ok(());
    }

    let timestamp = Local::now().format("%Y%m%d-%H%M%S%3f");
    let backup_name = format!(
        "{}.{}.bak",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("log"),
        timestamp
    );
    fs::rename(path, path.with_file_name(backup_name))?;
    File::create(path)?;
    Ok(())
}
