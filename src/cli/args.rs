use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "graphvault",
    version,
    about = "Numbered backups of graph datasets with pluggable modules"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(long, global = true)]
    pub backups_dir: Option<PathBuf>,
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Back up all datasets, or one with --dataset
    Create(CreateArgs),
    /// List backup sets
    List,
    /// Restore every dataset found in a backup set
    Restore(IdArgs),
    /// Delete a backup set
    Delete(IdArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct CreateArgs {
    #[arg(long)]
    pub dataset: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct IdArgs {
    pub id: String,
}
