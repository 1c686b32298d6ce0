use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use er_cli::commands::{get, rank, top};
use er_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs on stderr, results on stdout
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Some(Commands::Rank(args)) => {
            let config =
                Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
            tracing::debug!(?config, "loaded configuration");
            let summary = rank::run(&mut out, args, &config)?;
            if summary.skipped > 0 || summary.partial > 0 {
                tracing::warn!(
                    skipped = summary.skipped,
                    partial = summary.partial,
                    "some events were skipped"
                );
            }
        }
        Some(Commands::Top {
            snapshot,
            top: n,
            json,
        }) => {
            top::run(&mut out, snapshot, *n, *json)?;
        }
        Some(Commands::Get {
            snapshot,
            ids,
            json,
        }) => {
            get::run(&mut out, snapshot, ids, *json)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
