use clap::{Parser, Subcommand};

/// reqforge - requirements extraction and effort estimation
#[derive(Parser, Debug, Default)]
#[command(name = "reqforge")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to config file (default: ./reqforge.toml).
    #[arg(short = 'c', long, global = true)]
    pub config: Option<String>,

    /// Engine type: claude, codex or stub.
    #[arg(long, global = true)]
    pub engine: Option<String>,

    /// Use the deterministic stub engine.
    #[arg(long, global = true)]
    pub stub: bool,

    /// Per-call engine timeout in seconds.
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Maximum chunk size in characters.
    #[arg(long, global = true)]
    pub max_chunk_size: Option<usize>,

    /// Pacing delay between extraction calls in milliseconds.
    #[arg(long, global = true)]
    pub delay_ms: Option<u64>,

    /// Directory for the generation exchange log.
    #[arg(long, global = true)]
    pub log_dir: Option<String>,

    /// Directory for extraction output.
    #[arg(long, global = true)]
    pub output_dir: Option<String>,

    /// Verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// reqforge subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Extract a consolidated requirements document from source files.
    Extract {
        /// Documents to merge and analyze.
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// Generate role tasks from a consolidated document and submit them.
    Estimate {
        /// Consolidated document JSON (default: <output_dir>/prd.json).
        #[arg(long)]
        prd: Option<String>,
        /// Corpus label used in prompts when no document is given.
        #[arg(long)]
        label: Option<String>,
        /// Roster file (overrides files.roster).
        #[arg(long)]
        roster: Option<String>,
        /// Print tasks instead of writing them to the task file.
        #[arg(long)]
        dry_run: bool,
    },
    /// Extract then estimate in one pass.
    Run {
        /// Documents to merge and analyze.
        #[arg(required = true)]
        files: Vec<String>,
        /// Roster file (overrides files.roster).
        #[arg(long)]
        roster: Option<String>,
        /// Print tasks instead of writing them to the task file.
        #[arg(long)]
        dry_run: bool,
    },
    /// Write a default reqforge.toml and roster.toml.
    Init,
    /// Copy embedded prompts to the prompts directory for customization.
    CustomizePrompts,
}

/// Parse CLI arguments from an iterator.
pub fn parse_args<I>(args: I) -> Result<CliArgs, clap::Error>
where
    I: IntoIterator<Item = String>,
{
    CliArgs::try_parse_from(args)
}
