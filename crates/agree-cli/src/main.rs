use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use agree_cli::commands::{coverage, merge, report, resolve_input, segments};
use agree_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config =
        Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let mut stdout = io::stdout().lock();

    match &cli.command {
        Some(Commands::Coverage { input, json }) => {
            let input = resolve_input(input.as_deref(), &config);
            coverage::run(&mut stdout, &input, *json)?;
        }
        Some(Commands::Segments {
            input,
            json,
            details,
            annotators,
        }) => {
            let input = resolve_input(input.as_deref(), &config);
            let roster = config
                .roster(annotators.as_deref())
                .context("invalid annotator roster")?;
            segments::run(&mut stdout, &input, &roster, *json, *details)?;
        }
        Some(Commands::Report {
            input,
            json,
            annotators,
        }) => {
            let input = resolve_input(input.as_deref(), &config);
            let roster = config
                .roster(annotators.as_deref())
                .context("invalid annotator roster")?;
            report::run(&mut stdout, &input, &roster, *json)?;
        }
        Some(Commands::Merge { inputs, output }) => {
            merge::run(
                &mut stdout,
                inputs,
                output.as_deref(),
                &config.merge_options(),
            )?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            writeln!(stdout)?;
        }
    }

    Ok(())
}
