//! Configuration loading for reqforge.
//!
//! Supports reqforge.toml, CLI flags, and environment variables.
//! Precedence (highest to lowest): CLI flags > env vars > config file > defaults.

mod cli;
mod env;
mod toml;
mod types;

pub use cli::{parse_args, CliArgs, Command};
pub use types::{
    Config, ConfigError, EngineType, DEFAULT_CONFIG_FILE, DEFAULT_ENGINE_TIMEOUT_SECS,
    DEFAULT_PROJECT_NAME,
};

#[cfg(test)]
mod tests;
