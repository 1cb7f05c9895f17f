mod cli;
mod commands;
mod error;
mod output;
mod storage;

use std::process::ExitCode;

use clap::Parser;
use rankimport_core::RankImportConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::commands::Context;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let config = RankImportConfig::load(cli.config.as_deref())?;
    init_tracing(cli.quiet, cli.verbose, cli.log_json || config.log.json)?;

    let context = Context::new(&cli, config);
    let output = commands::run(&cli, &context).await?;
    output::render(&output, cli.pretty)?;
    Ok(())
}

fn init_tracing(quiet: bool, verbose: bool, json: bool) -> Result<(), CliError> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_env("RANKIMPORT_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|error| CliError::Tracing(error.to_string()))
}
