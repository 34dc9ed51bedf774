//! Catalog CLI Binary
//!
//! Command-line interface for administering lesson catalogs.

use anyhow::Context;
use clap::Parser;
use lesson_catalog::logging::init_logging;
use lesson_catalog::tooling::cli::{Cli, CliContext};
use lesson_catalog::tooling::format::error_hint;
use lesson_catalog::CatalogError;
use std::process;

fn run(cli: &Cli) -> anyhow::Result<String> {
    let context = CliContext::new(cli.workspace.clone(), cli.config.clone())
        .with_context(|| format!("initializing workspace {}", cli.workspace.display()))?
        .with_catalog(cli.catalog.clone())
        .with_actor(cli.actor.clone());

    let logging = cli.logging_config(&context.config().logging);
    init_logging(Some(&logging)).context("initializing logging")?;

    Ok(context.execute(&cli.command)?)
}

fn main() {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if let Some(hint) = e.downcast_ref::<CatalogError>().and_then(error_hint) {
                eprintln!("Hint: {}", hint);
            }
            process::exit(1);
        }
    }
}
