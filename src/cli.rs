use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use reclaim::cleaner::Category;

#[derive(Parser)]
#[command(
    name = "reclaim",
    about = "Bounded, concurrent cleanup of temporary and cache files",
    version
)]
pub struct Cli {
    /// Debug-level logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Delete temporary and cache files
    Clean(CleanArgs),

    /// Show every category and whether it is enabled by default
    List,

    /// Show the active configuration
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args)]
pub struct CleanArgs {
    /// Clean every category
    #[arg(long, conflicts_with_all = ["category", "profile"])]
    pub all: bool,

    /// Category key to clean (repeatable, see `reclaim list`)
    #[arg(short, long, value_name = "KEY")]
    pub category: Vec<Category>,

    /// Clean the categories of a named profile from the config file
    #[arg(short, long, conflicts_with = "category", value_name = "NAME")]
    pub profile: Option<String>,

    /// Measure only, delete nothing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print the result as JSON on stdout
    #[arg(long)]
    pub json: bool,
}
