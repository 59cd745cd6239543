//! CLI entry point - the composition root.
//!
//! Installs logging, loads settings, and dispatches to handlers. Failures
//! exit with the code of the underlying [`CliError`], or 1.

use std::io::Write;

use clap::{CommandFactory, Parser};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use readaloud_cli::{Cli, CliConfig, CliError, Commands, handlers};

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Resolves on the first Ctrl-C; never resolves if the handler can't be
/// installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load(cli.config.as_deref())?;

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let mut stdout = std::io::stdout();
    match command {
        Commands::Read(args) => {
            let text = handlers::read_input(args.file.as_deref())?;
            handlers::read::execute(
                &config,
                &args.overrides.to_update(),
                &text,
                ctrl_c(),
                &mut stdout,
            )
            .await?;
        }
        Commands::Segment {
            file,
            json,
            overrides,
        } => {
            let text = handlers::read_input(file.as_deref())?;
            handlers::segment::execute(&config, &overrides.to_update(), &text, json, &mut stdout)?;
        }
        Commands::Voices { overrides } => {
            handlers::voices::execute(&config, &overrides.to_update(), &mut stdout).await?;
        }
        Commands::Config { command } => {
            handlers::config::execute(&config, &command, &mut stdout)?;
        }
    }

    stdout.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
        eprintln!("Error: {err:#}");
        std::process::exit(code);
    }
}
