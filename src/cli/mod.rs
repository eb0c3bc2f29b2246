use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::args::{Cli, Command};
use crate::cli::commands::{build_coordinator, create, delete, exit_for_error, list, restore};

pub mod args;
pub mod commands;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let coordinator = match build_coordinator(cli.config.as_deref(), cli.backups_dir.as_deref()) {
        Ok(coordinator) => coordinator,
        Err(err) => exit_for_error(&err),
    };

    let outcome = match &cli.command {
        Command::Create(args) => create::run_create(&coordinator, args),
        Command::List => Ok(list::run_list(&coordinator)),
        Command::Restore(args) => restore::run_restore(&coordinator, &args.id),
        Command::Delete(args) => delete::run_delete(&coordinator, &args.id),
    };
    match outcome {
        Ok(report) => println!("{}", serde_json::to_string_pretty(&report)?),
        Err(err) => exit_for_error(&err),
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
