use std::env;
use std::process;

use reqforge::color::{self, emoji};
use reqforge::config::{self, Command, Config};
use reqforge::engine::EXIT_INTERRUPTED;
use reqforge::log;
use reqforge::shutdown;

mod commands;

fn main() {
    let cli = match config::parse_args(env::args()) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    log::init_tracing(cli.verbose);

    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let Some(command) = cli.command.clone() else {
        eprintln!("error: no command given (try 'reqforge --help')");
        process::exit(2);
    };

    // Register Ctrl+C handler for commands that call the engine
    if matches!(
        command,
        Command::Extract { .. } | Command::Estimate { .. } | Command::Run { .. }
    ) {
        if let Err(e) = shutdown::register_handler() {
            eprintln!("{} {}", emoji::WARNING, color::warning(&e));
        }
    }

    let result = match &command {
        Command::Extract { files } => commands::cmd_extract(&config, files),
        Command::Estimate {
            prd,
            label,
            roster,
            dry_run,
        } => commands::cmd_estimate(
            &config,
            prd.as_deref(),
            label.as_deref(),
            roster.as_deref(),
            *dry_run,
        ),
        Command::Run {
            files,
            roster,
            dry_run,
        } => commands::cmd_run(&config, files, roster.as_deref(), *dry_run),
        Command::Init => commands::cmd_init(&config),
        Command::CustomizePrompts => commands::cmd_customize_prompts(&config),
    };

    if let Err(e) = result {
        if shutdown::requested() {
            eprintln!("{} {}", emoji::STOP, color::warning(&e));
            process::exit(EXIT_INTERRUPTED);
        }
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
